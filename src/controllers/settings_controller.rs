use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::ApiError;
use crate::shared_state::AppState;

/// Runtime simulation switches. Offline mode skips the weather adapter and
/// generates from the synthetic curve alone.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SimulationSettings {
    pub offline_mode: bool,
}

/// Liveness payload: the process answers, plus rough store shape.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub panels: usize,
    pub readings: usize,
    pub offline_mode: bool,
}

/// GET /api/health
/// Service health
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is up", body = HealthStatus),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn health(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(HealthStatus {
        status: "ok".to_string(),
        panels: state.list_panels()?.len(),
        readings: state.store.total_count()?,
        offline_mode: state.is_offline(),
    }))
}

/// GET /api/settings/simulation
/// Read the simulation settings
#[utoipa::path(
    get,
    path = "/api/settings/simulation",
    responses(
        (status = 200, description = "Current settings", body = SimulationSettings),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_simulation(State(state): State<AppState>) -> impl IntoResponse {
    Json(SimulationSettings {
        offline_mode: state.is_offline(),
    })
}

/// PUT /api/settings/simulation
/// Update the simulation settings
///
/// Takes effect on the next generation tick; no restart involved.
#[utoipa::path(
    put,
    path = "/api/settings/simulation",
    request_body = SimulationSettings,
    responses(
        (status = 200, description = "Settings applied", body = SimulationSettings),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn put_simulation(
    State(state): State<AppState>,
    Json(body): Json<SimulationSettings>,
) -> impl IntoResponse {
    state.set_offline(body.offline_mode);
    tracing::info!(offline_mode = body.offline_mode, "simulation settings updated");
    Json(SimulationSettings {
        offline_mode: state.is_offline(),
    })
}
