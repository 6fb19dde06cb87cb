use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::models::panel::{NewPanel, Panel};
use crate::shared_state::AppState;

/// GET /api/panels
/// List registered panels
///
/// Returns every panel in the registry: the fleet seeded from configuration
/// at startup plus any registered over the API since.
#[utoipa::path(
    get,
    path = "/api/panels",
    responses(
        (status = 200, description = "All registered panels", body = Vec<Panel>),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_panels(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.list_panels()?))
}

/// GET /api/panels/{id}
/// Get one panel
///
/// Looks up a single panel by id. The id must be a well-formed UUID.
#[utoipa::path(
    get,
    path = "/api/panels/{id}",
    params(
        ("id" = String, Path, description = "Panel UUID")
    ),
    responses(
        (status = 200, description = "The panel", body = Panel),
        (status = 400, description = "Malformed panel id"),
        (status = 404, description = "Panel not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_panel(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let panel_id = Uuid::parse_str(&id).map_err(|_| ApiError::invalid_id("panel", &id))?;
    Ok(Json(state.panel(panel_id)?))
}

/// POST /api/panels
/// Register a new panel
///
/// Registers a panel and assigns it a fresh UUID. Missing coordinates fall
/// back to the default site; the next ingestion tick picks the panel up
/// automatically.
#[utoipa::path(
    post,
    path = "/api/panels",
    request_body = NewPanel,
    responses(
        (status = 201, description = "Panel registered", body = Panel),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_panel(
    State(state): State<AppState>,
    Json(body): Json<NewPanel>,
) -> Result<impl IntoResponse, ApiError> {
    let panel = state.register_panel(body, Utc::now())?;
    Ok((StatusCode::CREATED, Json(panel)))
}
