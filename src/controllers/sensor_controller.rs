use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::config::Config;
use crate::errors::ApiError;
use crate::models::reading::{IngestionReport, NewReading, SensorReading};
use crate::services::{alert_service, ingestion_service, signal_generator};
use crate::shared_state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReadingQuery {
    pub panel_id: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

/// GET /api/sensors
/// List recent readings
///
/// Returns stored readings newest first, optionally restricted to one panel.
#[utoipa::path(
    get,
    path = "/api/sensors",
    params(
        ("panel_id" = Option<String>, Query, description = "Restrict to one panel (UUID)"),
        ("limit" = Option<usize>, Query, description = "Maximum rows returned (default 100)")
    ),
    responses(
        (status = 200, description = "Recent readings, newest first", body = Vec<SensorReading>),
        (status = 400, description = "Malformed panel id"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_readings(
    Query(query): Query<ReadingQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let readings = match query.panel_id {
        Some(raw) => {
            let panel_id =
                Uuid::parse_str(&raw).map_err(|_| ApiError::invalid_id("panel", &raw))?;
            state.store.recent(panel_id, query.limit)?
        }
        None => state.store.recent_all(query.limit)?,
    };
    Ok(Json(readings))
}

/// GET /api/sensors/latest/{panel_id}
/// Latest reading for a panel
///
/// Returns the single most recent reading. 404 when the panel has none yet.
#[utoipa::path(
    get,
    path = "/api/sensors/latest/{panel_id}",
    params(
        ("panel_id" = String, Path, description = "Panel UUID")
    ),
    responses(
        (status = 200, description = "Most recent reading", body = SensorReading),
        (status = 400, description = "Malformed panel id"),
        (status = 404, description = "No reading stored for this panel"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn latest_reading(
    Path(panel_id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let panel_id =
        Uuid::parse_str(&panel_id).map_err(|_| ApiError::invalid_id("panel", &panel_id))?;
    let reading = state
        .store
        .latest(panel_id)?
        .ok_or(ApiError::NotFound("reading"))?;
    Ok(Json(reading))
}

/// POST /api/sensors
/// Store one caller-supplied reading
///
/// Accepts raw sensor fields, derives power from voltage × current, stamps
/// the server time when no timestamp is given, and runs the threshold
/// evaluator on the stored reading. This is the one path where out-of-range
/// values (dust above the generator cap, say) can enter the store.
#[utoipa::path(
    post,
    path = "/api/sensors",
    request_body = NewReading,
    responses(
        (status = 201, description = "Reading stored", body = SensorReading),
        (status = 400, description = "Malformed panel id"),
        (status = 404, description = "Panel not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_reading(
    State(state): State<AppState>,
    State(config): State<Config>,
    Json(body): Json<NewReading>,
) -> Result<impl IntoResponse, ApiError> {
    let panel_id =
        Uuid::parse_str(&body.panel_id).map_err(|_| ApiError::invalid_id("panel", &body.panel_id))?;
    let panel = state.panel(panel_id)?;

    let now = Utc::now();
    let reading = SensorReading {
        id: Uuid::new_v4(),
        panel_id,
        timestamp: body.timestamp.unwrap_or(now),
        temperature: body.temperature,
        voltage: body.voltage,
        current: body.current,
        power: signal_generator::round2(body.voltage * body.current),
        efficiency: body.efficiency,
        irradiance: body.irradiance,
        dust: body.dust,
        tilt: body.tilt.unwrap_or(panel.tilt),
        shading: body.shading,
    };
    state.store.insert(reading.clone())?;

    let drafts = alert_service::evaluate(&reading, &config.thresholds);
    state.record_alerts(panel_id, drafts, reading.timestamp)?;

    Ok((StatusCode::CREATED, Json(reading)))
}

/// POST /api/sensors/generate
/// Trigger one generation tick now
///
/// Runs the same per-panel generation pass the scheduler runs, immediately,
/// and reports how many readings and alerts came out of it.
#[utoipa::path(
    post,
    path = "/api/sensors/generate",
    responses(
        (status = 200, description = "Tick outcome", body = IngestionReport),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn generate_now(
    State(state): State<AppState>,
    State(config): State<Config>,
) -> Result<impl IntoResponse, ApiError> {
    let report = ingestion_service::ingest_once(&state, &config).await?;
    Ok(Json(report))
}
