use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::models::trends::{
    ComprehensiveReport, DustPatternReport, EfficiencyDecayReport, Interval,
    MaintenanceImpactReport, TemperatureCorrelationReport, TimeSeriesBucket,
};
use crate::services::trend_service;
use crate::shared_state::AppState;

fn parse_panel(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::invalid_id("panel", raw))
}

#[derive(Debug, Deserialize)]
pub struct TimeSeriesQuery {
    #[serde(default = "default_interval")]
    pub interval: Interval,
    #[serde(default = "default_series_limit")]
    pub limit: usize,
}

fn default_interval() -> Interval {
    Interval::Hour
}

fn default_series_limit() -> usize {
    48
}

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    #[serde(default = "default_days")]
    pub days: u32,
}

fn default_days() -> u32 {
    30
}

#[derive(Debug, Deserialize)]
pub struct ImpactQuery {
    pub maintenance_date: DateTime<Utc>,
    #[serde(default = "default_impact_days")]
    pub days_before: u32,
    #[serde(default = "default_impact_days")]
    pub days_after: u32,
}

fn default_impact_days() -> u32 {
    7
}

/// GET /api/trends/timeseries/{panel_id}
/// Bucketed time series
///
/// avg/min/max per calendar hour or day for every tracked field, oldest
/// bucket first.
#[utoipa::path(
    get,
    path = "/api/trends/timeseries/{panel_id}",
    params(
        ("panel_id" = String, Path, description = "Panel UUID"),
        ("interval" = Option<String>, Query, description = "hour or day (default hour)"),
        ("limit" = Option<usize>, Query, description = "Maximum buckets (default 48)")
    ),
    responses(
        (status = 200, description = "Buckets, oldest first", body = Vec<TimeSeriesBucket>),
        (status = 400, description = "Malformed panel id"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn time_series(
    Path(panel_id): Path<String>,
    Query(query): Query<TimeSeriesQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let panel_id = parse_panel(&panel_id)?;
    Ok(Json(state.store.aggregate(panel_id, query.interval, query.limit)?))
}

/// GET /api/trends/efficiency-decay/{panel_id}
/// Efficiency decay analysis
///
/// Compares the first and last fifth of the window's readings. Fewer than
/// two readings yields the insufficient-data verdict, not an error.
#[utoipa::path(
    get,
    path = "/api/trends/efficiency-decay/{panel_id}",
    params(
        ("panel_id" = String, Path, description = "Panel UUID"),
        ("days" = Option<u32>, Query, description = "Lookback window in days (default 30)")
    ),
    responses(
        (status = 200, description = "Decay report", body = EfficiencyDecayReport),
        (status = 400, description = "Malformed panel id"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn efficiency_decay(
    Path(panel_id): Path<String>,
    Query(query): Query<WindowQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let panel_id = parse_panel(&panel_id)?;
    let report =
        trend_service::efficiency_decay(&state.store, panel_id, query.days, Utc::now()).await?;
    Ok(Json(report))
}

/// GET /api/trends/dust-pattern/{panel_id}
/// Dust accumulation pattern
///
/// Daily dust averages, accumulation rate per day, and day-over-day drops
/// large enough to read as cleaning events.
#[utoipa::path(
    get,
    path = "/api/trends/dust-pattern/{panel_id}",
    params(
        ("panel_id" = String, Path, description = "Panel UUID"),
        ("days" = Option<u32>, Query, description = "Lookback window in days (default 30)")
    ),
    responses(
        (status = 200, description = "Dust report", body = DustPatternReport),
        (status = 400, description = "Malformed panel id"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn dust_pattern(
    Path(panel_id): Path<String>,
    Query(query): Query<WindowQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let panel_id = parse_panel(&panel_id)?;
    let report =
        trend_service::dust_pattern(&state.store, panel_id, query.days, Utc::now()).await?;
    Ok(Json(report))
}

/// GET /api/trends/temperature-correlation/{panel_id}
/// Temperature / efficiency correlation
///
/// Pearson coefficient between cell temperature and efficiency over the
/// window; needs at least ten readings.
#[utoipa::path(
    get,
    path = "/api/trends/temperature-correlation/{panel_id}",
    params(
        ("panel_id" = String, Path, description = "Panel UUID"),
        ("days" = Option<u32>, Query, description = "Lookback window in days (default 30)")
    ),
    responses(
        (status = 200, description = "Correlation report", body = TemperatureCorrelationReport),
        (status = 400, description = "Malformed panel id"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn temperature_correlation(
    Path(panel_id): Path<String>,
    Query(query): Query<WindowQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let panel_id = parse_panel(&panel_id)?;
    let report =
        trend_service::temperature_correlation(&state.store, panel_id, query.days, Utc::now())
            .await?;
    Ok(Json(report))
}

/// GET /api/trends/maintenance-impact/{panel_id}
/// Before/after maintenance comparison
///
/// Averages the windows on each side of `maintenance_date` and reports
/// percentage improvements, clamped to plausibility ranges.
#[utoipa::path(
    get,
    path = "/api/trends/maintenance-impact/{panel_id}",
    params(
        ("panel_id" = String, Path, description = "Panel UUID"),
        ("maintenance_date" = String, Query, description = "RFC 3339 timestamp of the maintenance"),
        ("days_before" = Option<u32>, Query, description = "Window before (default 7 days)"),
        ("days_after" = Option<u32>, Query, description = "Window after (default 7 days)")
    ),
    responses(
        (status = 200, description = "Impact report", body = MaintenanceImpactReport),
        (status = 400, description = "Malformed panel id or missing maintenance_date"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn maintenance_impact(
    Path(panel_id): Path<String>,
    Query(query): Query<ImpactQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let panel_id = parse_panel(&panel_id)?;
    let report = trend_service::maintenance_impact(
        &state.store,
        panel_id,
        query.maintenance_date,
        query.days_before,
        query.days_after,
    )
    .await?;
    Ok(Json(report))
}

/// GET /api/trends/comprehensive/{panel_id}
/// All analyses in one payload
///
/// Daily time series plus decay, dust and correlation reports, computed
/// concurrently over the same window.
#[utoipa::path(
    get,
    path = "/api/trends/comprehensive/{panel_id}",
    params(
        ("panel_id" = String, Path, description = "Panel UUID"),
        ("days" = Option<u32>, Query, description = "Lookback window in days (default 30)")
    ),
    responses(
        (status = 200, description = "Combined report", body = ComprehensiveReport),
        (status = 400, description = "Malformed panel id"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn comprehensive(
    Path(panel_id): Path<String>,
    Query(query): Query<WindowQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let panel_id = parse_panel(&panel_id)?;
    let report =
        trend_service::comprehensive(&state.store, panel_id, query.days, Utc::now()).await?;
    Ok(Json(report))
}
