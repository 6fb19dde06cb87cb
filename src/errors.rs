use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::models::maintenance::MaintenanceStatus;

/// Failure inside one of the in-memory stores. The only inhabitant today is a
/// poisoned lock left behind by a panicked writer; callers treat it as any
/// other backend failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store lock poisoned")]
    Poisoned,
}

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        StoreError::Poisoned
    }
}

impl<T> From<std::sync::PoisonError<T>> for ApiError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        ApiError::Store(StoreError::from(e))
    }
}

/// Errors surfaced over the HTTP API. Maps one-to-one onto a status code and
/// a `{"error": "..."}` body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid {entity} id: {value}")]
    InvalidId { entity: &'static str, value: String },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("invalid status transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: MaintenanceStatus,
        to: MaintenanceStatus,
    },

    #[error("storage failure: {0}")]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn invalid_id(entity: &'static str, value: &str) -> Self {
        ApiError::InvalidId {
            entity,
            value: value.to_string(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidId { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_expected_status_codes() {
        assert_eq!(
            ApiError::invalid_id("panel", "not-a-uuid").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::NotFound("panel").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::InvalidTransition {
                from: MaintenanceStatus::Completed,
                to: MaintenanceStatus::Pending,
            }
            .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::Store(StoreError::Poisoned).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
