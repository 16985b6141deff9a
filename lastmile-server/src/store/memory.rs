//! In-memory store
//!
//! Implements the full [`Store`] contract over mutex-guarded maps. The test
//! suite runs against this so it needs no database; semantics match the
//! PostgreSQL store, including the conditional completion write.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use lastmile::{Completion, CompletionStore};

use super::Store;
use crate::types::{Courier, NewCourier, NewOrder, Order};

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    couriers: BTreeMap<i64, Courier>,
    orders: BTreeMap<i64, Order>,
    last_courier_id: i64,
    last_order_id: i64,
}

impl MemoryStore {
    fn locked(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn page<T: Clone>(map: &BTreeMap<i64, T>, limit: i64, offset: i64) -> Vec<T> {
    map.values()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .cloned()
        .collect()
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_couriers(&self, couriers: &[NewCourier]) -> Result<Vec<Courier>> {
        let mut inner = self.locked();
        let mut created = Vec::with_capacity(couriers.len());
        for courier in couriers {
            inner.last_courier_id += 1;
            let courier = Courier {
                courier_id: inner.last_courier_id,
                courier_type: courier.courier_type,
                regions: courier.regions.clone(),
                working_hours: courier.working_hours.clone(),
            };
            inner.couriers.insert(courier.courier_id, courier.clone());
            created.push(courier);
        }
        Ok(created)
    }

    async fn courier(&self, courier_id: i64) -> Result<Option<Courier>> {
        Ok(self.locked().couriers.get(&courier_id).cloned())
    }

    async fn couriers(&self, limit: i64, offset: i64) -> Result<Vec<Courier>> {
        Ok(page(&self.locked().couriers, limit, offset))
    }

    async fn create_orders(&self, orders: &[NewOrder]) -> Result<Vec<Order>> {
        let mut inner = self.locked();
        let mut created = Vec::with_capacity(orders.len());
        for order in orders {
            inner.last_order_id += 1;
            let order = Order {
                order_id: inner.last_order_id,
                weight: order.weight,
                regions: order.regions,
                delivery_hours: order.delivery_hours.clone(),
                cost: order.cost,
                completed_time: None,
                completed_courier_id: None,
            };
            inner.orders.insert(order.order_id, order.clone());
            created.push(order);
        }
        Ok(created)
    }

    async fn order(&self, order_id: i64) -> Result<Option<Order>> {
        Ok(self.locked().orders.get(&order_id).cloned())
    }

    async fn orders(&self, limit: i64, offset: i64) -> Result<Vec<Order>> {
        Ok(page(&self.locked().orders, limit, offset))
    }
}

#[async_trait]
impl CompletionStore for MemoryStore {
    type Error = anyhow::Error;

    async fn count_existing(&self, order_ids: &[i64]) -> Result<u64> {
        let inner = self.locked();
        Ok(order_ids
            .iter()
            .filter(|id| inner.orders.contains_key(id))
            .count() as u64)
    }

    async fn completion_state(&self, order_id: i64) -> Result<Option<Completion>> {
        let inner = self.locked();
        let Some(order) = inner.orders.get(&order_id) else {
            return Ok(None);
        };
        Ok(
            match (order.completed_time, order.completed_courier_id) {
                (Some(completed_at), Some(courier_id)) => Some(Completion {
                    courier_id,
                    completed_at,
                }),
                _ => None,
            },
        )
    }

    async fn set_completion(
        &self,
        order_id: i64,
        courier_id: i64,
        completed_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut inner = self.locked();
        let order = inner
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| anyhow!("order {order_id} does not exist"))?;
        // Same conditional semantics as the SQL UPDATE ... WHERE
        // completed_time IS NULL.
        if order.completed_time.is_none() {
            order.completed_time = Some(completed_at);
            order.completed_courier_id = Some(courier_id);
        }
        Ok(())
    }
}
