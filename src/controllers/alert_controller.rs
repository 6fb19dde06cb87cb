use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::models::alert::{Alert, NewAlert};
use crate::shared_state::AppState;

#[derive(Debug, Deserialize)]
pub struct AlertQuery {
    pub panel_id: Option<String>,
    pub resolved: Option<bool>,
}

/// GET /api/alerts
/// List alerts
///
/// Alerts newest first, filterable by panel and by resolved flag.
#[utoipa::path(
    get,
    path = "/api/alerts",
    params(
        ("panel_id" = Option<String>, Query, description = "Restrict to one panel (UUID)"),
        ("resolved" = Option<bool>, Query, description = "Filter on the resolved flag")
    ),
    responses(
        (status = 200, description = "Alerts, newest first", body = Vec<Alert>),
        (status = 400, description = "Malformed panel id"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_alerts(
    Query(query): Query<AlertQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let panel_id = match query.panel_id {
        Some(raw) => {
            Some(Uuid::parse_str(&raw).map_err(|_| ApiError::invalid_id("panel", &raw))?)
        }
        None => None,
    };
    Ok(Json(state.list_alerts(panel_id, query.resolved)?))
}

/// POST /api/alerts
/// Create an alert manually
///
/// Stores an alert outside the threshold evaluator, for operator-raised
/// conditions the sensors cannot see.
#[utoipa::path(
    post,
    path = "/api/alerts",
    request_body = NewAlert,
    responses(
        (status = 201, description = "Alert created", body = Alert),
        (status = 400, description = "Malformed panel id"),
        (status = 404, description = "Panel not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_alert(
    State(state): State<AppState>,
    Json(body): Json<NewAlert>,
) -> Result<impl IntoResponse, ApiError> {
    let panel_id =
        Uuid::parse_str(&body.panel_id).map_err(|_| ApiError::invalid_id("panel", &body.panel_id))?;
    state.panel(panel_id)?;
    let alert = state.create_alert(panel_id, body.kind, body.message, Utc::now())?;
    Ok((StatusCode::CREATED, Json(alert)))
}

/// PUT /api/alerts/{id}/resolve
/// Resolve an alert
///
/// Sets the resolved flag and timestamp. Resolving an already-resolved alert
/// keeps the original resolution time.
#[utoipa::path(
    put,
    path = "/api/alerts/{id}/resolve",
    params(
        ("id" = String, Path, description = "Alert UUID")
    ),
    responses(
        (status = 200, description = "Updated alert", body = Alert),
        (status = 400, description = "Malformed alert id"),
        (status = 404, description = "Alert not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn resolve_alert(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let alert_id = Uuid::parse_str(&id).map_err(|_| ApiError::invalid_id("alert", &id))?;
    Ok(Json(state.resolve_alert(alert_id, Utc::now())?))
}

/// PUT /api/alerts/{id}/read
/// Mark an alert read
#[utoipa::path(
    put,
    path = "/api/alerts/{id}/read",
    params(
        ("id" = String, Path, description = "Alert UUID")
    ),
    responses(
        (status = 200, description = "Updated alert", body = Alert),
        (status = 400, description = "Malformed alert id"),
        (status = 404, description = "Alert not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn mark_read(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let alert_id = Uuid::parse_str(&id).map_err(|_| ApiError::invalid_id("alert", &id))?;
    Ok(Json(state.mark_alert_read(alert_id)?))
}
