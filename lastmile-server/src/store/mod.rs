//! Persistence layer for couriers and orders
//!
//! The HTTP handlers only see the [`Store`] trait; what sits behind it is
//! wiring. [`postgres::PgStore`] is the production implementation,
//! [`memory::MemoryStore`] backs the test suite.
//!
//! `Store` extends [`lastmile::CompletionStore`], the narrow contract the
//! completion guard runs against, so any store usable for CRUD is
//! automatically usable for idempotent bulk completion.

pub mod memory;
pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;

use lastmile::CompletionStore;

use crate::types::{Courier, NewCourier, NewOrder, Order};

/// Storage contract for the courier and order API.
///
/// Listings are ordered by id and paginated with `limit`/`offset`. Point
/// reads return `Ok(None)` for unknown ids; only I/O failures are errors.
#[async_trait]
pub trait Store: CompletionStore<Error = anyhow::Error> + Send + Sync {
    async fn create_couriers(&self, couriers: &[NewCourier]) -> Result<Vec<Courier>>;
    async fn courier(&self, courier_id: i64) -> Result<Option<Courier>>;
    async fn couriers(&self, limit: i64, offset: i64) -> Result<Vec<Courier>>;

    async fn create_orders(&self, orders: &[NewOrder]) -> Result<Vec<Order>>;
    async fn order(&self, order_id: i64) -> Result<Option<Order>>;
    async fn orders(&self, limit: i64, offset: i64) -> Result<Vec<Order>>;
}
