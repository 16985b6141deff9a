//! HTTP transport for the courier and order API
//!
//! Routes mirror the public contract of the service:
//!
//! - `GET /ping`
//! - `GET /couriers`, `GET /couriers/{courier_id}`, `POST /couriers`
//! - `GET /couriers/meta-info/{courier_id}` (reserved, 501)
//! - `GET /orders`, `GET /orders/{order_id}`, `POST /orders`
//! - `POST /orders/complete`
//!
//! Every handler checks its operation's rate limiter before touching the
//! store; a denied request is answered with 429 and produces no side
//! effects.

mod couriers;
mod dto;
mod error;
mod orders;


use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::routing::{get, post};

use crate::admission::{AdmissionControl, Operation};
use crate::store::Store;

pub use error::ApiError;

/// Shared application state: the store behind the CRUD surface and the
/// per-operation limiter registry. Built once at startup.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub admission: AdmissionControl,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, admission: AdmissionControl) -> Self {
        AppState { store, admission }
    }

    /// Gate an operation on its limiter. Handlers call this before any
    /// other work.
    fn admit(&self, operation: Operation) -> Result<(), ApiError> {
        if self.admission.admit(operation) {
            Ok(())
        } else {
            Err(ApiError::TooManyRequests(operation))
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/ping", get(ping))
        .route("/couriers", get(couriers::list).post(couriers::create))
        .route("/couriers/{courier_id}", get(couriers::get_by_id))
        .route("/couriers/meta-info/{courier_id}", get(couriers::meta_info))
        .route("/orders", get(orders::list).post(orders::create))
        .route("/orders/{order_id}", get(orders::get_by_id))
        .route("/orders/complete", post(orders::complete))
        .with_state(state)
}

async fn ping(State(state): State<Arc<AppState>>) -> Result<&'static str, ApiError> {
    state.admit(Operation::Ping)?;
    Ok("pong")
}
