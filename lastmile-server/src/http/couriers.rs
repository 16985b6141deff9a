//! Courier handlers

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};

use super::AppState;
use super::dto::{
    CourierDto, CreateCourierRequest, CreateCouriersResponse, Pagination,
};
use super::error::ApiError;
use crate::admission::Operation;
use crate::types::NewCourier;

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<CourierDto>>, ApiError> {
    state.admit(Operation::ListCouriers)?;

    let couriers = state.store.couriers(page.limit, page.offset).await?;
    Ok(Json(couriers.into_iter().map(CourierDto::from).collect()))
}

pub async fn get_by_id(
    State(state): State<Arc<AppState>>,
    Path(courier_id): Path<i64>,
) -> Result<Json<CourierDto>, ApiError> {
    state.admit(Operation::GetCourier)?;

    let courier = state
        .store
        .courier(courier_id)
        .await?
        .ok_or(ApiError::NotFound("courier", courier_id))?;
    Ok(Json(courier.into()))
}

/// Rating and earnings were never part of the stored model; the route is
/// reserved in the API surface and answers 501.
pub async fn meta_info(
    State(state): State<Arc<AppState>>,
    Path(_courier_id): Path<i64>,
) -> ApiError {
    if let Err(denied) = state.admit(Operation::CourierMeta) {
        return denied;
    }
    ApiError::NotImplemented
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateCourierRequest>,
) -> Result<Json<CreateCouriersResponse>, ApiError> {
    state.admit(Operation::CreateCouriers)?;

    let data: Vec<NewCourier> = request.couriers.into_iter().map(NewCourier::from).collect();
    let created = state.store.create_couriers(&data).await?;
    Ok(Json(CreateCouriersResponse {
        couriers: created.into_iter().map(CourierDto::from).collect(),
    }))
}
