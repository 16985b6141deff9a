//! API error taxonomy and its HTTP mapping
//!
//! Response bodies are an empty JSON object for every error class; clients
//! key off the status code. Details go to the log, not the wire.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use lastmile::CompleteError;

use crate::admission::Operation;

/// Errors surfaced by the API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("{0} with id {1} not found")]
    NotFound(&'static str, i64),

    #[error("operation {0:?} overloaded")]
    TooManyRequests(Operation),

    #[error("not implemented")]
    NotImplemented,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<CompleteError<anyhow::Error>> for ApiError {
    fn from(err: CompleteError<anyhow::Error>) -> Self {
        match err {
            CompleteError::Store(err) => ApiError::Internal(err),
            // Whole-batch validation failures: nothing happened.
            rejected => ApiError::BadRequest(rejected.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(..) => StatusCode::NOT_FOUND,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        match &self {
            ApiError::TooManyRequests(_) => tracing::debug!("{}", self),
            ApiError::Internal(err) => tracing::error!("internal error: {:#}", err),
            _ => tracing::warn!("{}", self),
        }

        (status, Json(json!({}))).into_response()
    }
}
