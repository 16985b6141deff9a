//! PostgreSQL persistence
//!
//! Plain `sqlx::query` with bound parameters throughout; migrations are
//! embedded and run once at connect time.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};

use lastmile::{Completion, CompletionStore};

use super::Store;
use crate::types::{Courier, NewCourier, NewOrder, Order};

/// PostgreSQL-backed store. Cheap to clone; all clones share one pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create the connection pool and bring the schema up to date.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        tracing::info!("PostgreSQL connection pool established");
        Ok(PgStore { pool })
    }

    /// Check database health.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn courier_from_row(row: &PgRow) -> Result<Courier> {
        Ok(Courier {
            courier_id: row.get("id"),
            courier_type: row.get::<String, _>("courier_type").parse()?,
            regions: row.get("regions"),
            working_hours: row.get("working_hours"),
        })
    }

    fn order_from_row(row: &PgRow) -> Order {
        Order {
            order_id: row.get("order_id"),
            weight: row.get("weight"),
            regions: row.get("regions"),
            delivery_hours: row.get("delivery_hours"),
            cost: row.get("order_cost"),
            completed_time: row.get("completed_time"),
            completed_courier_id: row.get("completed_courier_id"),
        }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_couriers(&self, couriers: &[NewCourier]) -> Result<Vec<Courier>> {
        let mut created = Vec::with_capacity(couriers.len());
        for courier in couriers {
            let row = sqlx::query(
                r#"INSERT INTO couriers (courier_type, regions, working_hours)
                   VALUES ($1, $2, $3)
                   RETURNING id, courier_type, regions, working_hours"#,
            )
            .bind(courier.courier_type.as_str())
            .bind(&courier.regions)
            .bind(&courier.working_hours)
            .fetch_one(&self.pool)
            .await?;
            created.push(Self::courier_from_row(&row)?);
        }
        Ok(created)
    }

    async fn courier(&self, courier_id: i64) -> Result<Option<Courier>> {
        let row = sqlx::query(
            r#"SELECT id, courier_type, regions, working_hours
               FROM couriers WHERE id = $1"#,
        )
        .bind(courier_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| Self::courier_from_row(&row)).transpose()
    }

    async fn couriers(&self, limit: i64, offset: i64) -> Result<Vec<Courier>> {
        let rows = sqlx::query(
            r#"SELECT id, courier_type, regions, working_hours
               FROM couriers ORDER BY id LIMIT $1 OFFSET $2"#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::courier_from_row).collect()
    }

    async fn create_orders(&self, orders: &[NewOrder]) -> Result<Vec<Order>> {
        let mut created = Vec::with_capacity(orders.len());
        for order in orders {
            let row = sqlx::query(
                r#"INSERT INTO orders (weight, regions, delivery_hours, order_cost)
                   VALUES ($1, $2, $3, $4)
                   RETURNING order_id, weight, regions, delivery_hours, order_cost,
                             completed_time, completed_courier_id"#,
            )
            .bind(order.weight)
            .bind(order.regions)
            .bind(&order.delivery_hours)
            .bind(order.cost)
            .fetch_one(&self.pool)
            .await?;
            created.push(Self::order_from_row(&row));
        }
        Ok(created)
    }

    async fn order(&self, order_id: i64) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"SELECT order_id, weight, regions, delivery_hours, order_cost,
                      completed_time, completed_courier_id
               FROM orders WHERE order_id = $1"#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Self::order_from_row(&row)))
    }

    async fn orders(&self, limit: i64, offset: i64) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"SELECT order_id, weight, regions, delivery_hours, order_cost,
                      completed_time, completed_courier_id
               FROM orders ORDER BY order_id LIMIT $1 OFFSET $2"#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::order_from_row).collect())
    }
}

#[async_trait]
impl CompletionStore for PgStore {
    type Error = anyhow::Error;

    async fn count_existing(&self, order_ids: &[i64]) -> Result<u64> {
        let row = sqlx::query("SELECT count(*) AS existing FROM orders WHERE order_id = ANY($1)")
            .bind(order_ids)
            .fetch_one(&self.pool)
            .await?;

        let existing: i64 = row.get("existing");
        Ok(existing as u64)
    }

    async fn completion_state(&self, order_id: i64) -> Result<Option<Completion>> {
        let row = sqlx::query(
            "SELECT completed_time, completed_courier_id FROM orders WHERE order_id = $1",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let completed_at: Option<DateTime<Utc>> = row.get("completed_time");
        let courier_id: Option<i64> = row.get("completed_courier_id");
        Ok(match (completed_at, courier_id) {
            (Some(completed_at), Some(courier_id)) => Some(Completion {
                courier_id,
                completed_at,
            }),
            _ => None,
        })
    }

    async fn set_completion(
        &self,
        order_id: i64,
        courier_id: i64,
        completed_at: DateTime<Utc>,
    ) -> Result<()> {
        // Conditional on the order still being incomplete: a racing writer
        // that lost turns this statement into a no-op instead of an
        // overwrite.
        sqlx::query(
            r#"UPDATE orders SET completed_time = $1, completed_courier_id = $2
               WHERE order_id = $3 AND completed_time IS NULL"#,
        )
        .bind(completed_at)
        .bind(courier_id)
        .bind(order_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
