//! Order handlers
//!
//! `complete` is the only handler with logic beyond CRUD mapping: it runs
//! the completion guard from the core crate, then echoes back the full
//! order records for the processed ids.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};

use lastmile::{CompletionGuard, CompletionRequest};

use super::AppState;
use super::dto::{CompleteOrdersRequest, CreateOrderRequest, OrderDto, Pagination};
use super::error::ApiError;
use crate::admission::Operation;
use crate::types::NewOrder;

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<OrderDto>>, ApiError> {
    state.admit(Operation::ListOrders)?;

    let orders = state.store.orders(page.limit, page.offset).await?;
    Ok(Json(orders.into_iter().map(OrderDto::from).collect()))
}

pub async fn get_by_id(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<i64>,
) -> Result<Json<OrderDto>, ApiError> {
    state.admit(Operation::GetOrder)?;

    let order = state
        .store
        .order(order_id)
        .await?
        .ok_or(ApiError::NotFound("order", order_id))?;
    Ok(Json(order.into()))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<Json<Vec<OrderDto>>, ApiError> {
    state.admit(Operation::CreateOrders)?;

    let data: Vec<NewOrder> = request.orders.into_iter().map(NewOrder::from).collect();
    let created = state.store.create_orders(&data).await?;
    Ok(Json(created.into_iter().map(OrderDto::from).collect()))
}

pub async fn complete(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CompleteOrdersRequest>,
) -> Result<Json<Vec<OrderDto>>, ApiError> {
    state.admit(Operation::CompleteOrders)?;

    let requests: Vec<CompletionRequest> = request
        .complete_info
        .iter()
        .map(|info| CompletionRequest {
            order_id: info.order_id,
            courier_id: info.courier_id,
            completed_at: info.complete_time,
        })
        .collect();

    let guard = CompletionGuard::new(state.store.as_ref());
    let completed_ids = guard.complete_batch(&requests).await?;

    let mut response = Vec::with_capacity(completed_ids.len());
    for order_id in completed_ids {
        let order = state
            .store
            .order(order_id)
            .await?
            .ok_or(ApiError::NotFound("order", order_id))?;
        response.push(order.into());
    }
    Ok(Json(response))
}
