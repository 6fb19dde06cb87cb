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
use crate::models::maintenance::{
    MaintenanceRecord, NewMaintenanceRequest, NewSchedule, RecurringSchedule, ScheduleUpdate,
    StatusUpdate, SweepReport,
};
use crate::shared_state::AppState;

#[derive(Debug, Deserialize)]
pub struct PanelFilter {
    pub panel_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpcomingQuery {
    #[serde(default = "default_upcoming_days")]
    pub days: u32,
}

fn default_upcoming_days() -> u32 {
    30
}

fn parse_optional_panel(raw: Option<String>) -> Result<Option<Uuid>, ApiError> {
    match raw {
        Some(raw) => Ok(Some(
            Uuid::parse_str(&raw).map_err(|_| ApiError::invalid_id("panel", &raw))?,
        )),
        None => Ok(None),
    }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// GET /api/maintenance
/// List maintenance records
///
/// Records newest first: manual requests and sweep-generated work alike.
#[utoipa::path(
    get,
    path = "/api/maintenance",
    params(
        ("panel_id" = Option<String>, Query, description = "Restrict to one panel (UUID)")
    ),
    responses(
        (status = 200, description = "Records, newest first", body = Vec<MaintenanceRecord>),
        (status = 400, description = "Malformed panel id"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_records(
    Query(query): Query<PanelFilter>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let panel_id = parse_optional_panel(query.panel_id)?;
    Ok(Json(state.maintenance.list_records(panel_id)?))
}

/// POST /api/maintenance
/// Request maintenance work
///
/// Creates a pending record. The scheduled date defaults to now.
#[utoipa::path(
    post,
    path = "/api/maintenance",
    request_body = NewMaintenanceRequest,
    responses(
        (status = 201, description = "Record created", body = MaintenanceRecord),
        (status = 400, description = "Malformed panel id"),
        (status = 404, description = "Panel not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn request_maintenance(
    State(state): State<AppState>,
    Json(body): Json<NewMaintenanceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let panel_id =
        Uuid::parse_str(&body.panel_id).map_err(|_| ApiError::invalid_id("panel", &body.panel_id))?;
    state.panel(panel_id)?;
    let record = state.maintenance.request(
        panel_id,
        body.maintenance_type,
        body.scheduled_date,
        body.notes,
        Utc::now(),
    )?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /api/maintenance/{id}/status
/// Advance a record's status
///
/// Records only move forward: pending → in_progress → completed. Every
/// accepted change appends a timeline entry; anything else is a 422.
#[utoipa::path(
    put,
    path = "/api/maintenance/{id}/status",
    params(
        ("id" = String, Path, description = "Record UUID")
    ),
    request_body = StatusUpdate,
    responses(
        (status = 200, description = "Updated record", body = MaintenanceRecord),
        (status = 400, description = "Malformed record id"),
        (status = 404, description = "Record not found"),
        (status = 422, description = "Invalid status transition"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn update_status(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<StatusUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let record_id =
        Uuid::parse_str(&id).map_err(|_| ApiError::invalid_id("maintenance record", &id))?;
    Ok(Json(state.maintenance.update_status(record_id, body, Utc::now())?))
}

// ─── Recurring schedules ─────────────────────────────────────────────────────

/// GET /api/maintenance/recurring
/// List recurring schedules
///
/// Schedules soonest-due first, active or not.
#[utoipa::path(
    get,
    path = "/api/maintenance/recurring",
    params(
        ("panel_id" = Option<String>, Query, description = "Restrict to one panel (UUID)")
    ),
    responses(
        (status = 200, description = "Schedules, soonest due first", body = Vec<RecurringSchedule>),
        (status = 400, description = "Malformed panel id"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_schedules(
    Query(query): Query<PanelFilter>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let panel_id = parse_optional_panel(query.panel_id)?;
    Ok(Json(state.maintenance.list_schedules(panel_id)?))
}

/// POST /api/maintenance/recurring
/// Create a recurring schedule
///
/// The first occurrence falls due exactly at the start date.
#[utoipa::path(
    post,
    path = "/api/maintenance/recurring",
    request_body = NewSchedule,
    responses(
        (status = 201, description = "Schedule created", body = RecurringSchedule),
        (status = 400, description = "Malformed panel id"),
        (status = 404, description = "Panel not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_schedule(
    State(state): State<AppState>,
    Json(body): Json<NewSchedule>,
) -> Result<impl IntoResponse, ApiError> {
    let panel_id =
        Uuid::parse_str(&body.panel_id).map_err(|_| ApiError::invalid_id("panel", &body.panel_id))?;
    state.panel(panel_id)?;
    let schedule = state.maintenance.create_schedule(
        panel_id,
        body.maintenance_type,
        body.frequency,
        body.start_date,
        body.notes,
        Utc::now(),
    )?;
    Ok((StatusCode::CREATED, Json(schedule)))
}

/// PUT /api/maintenance/recurring/{id}
/// Edit a recurring schedule
///
/// Partial update. Changing the frequency or start date resets the next due
/// date to the start date.
#[utoipa::path(
    put,
    path = "/api/maintenance/recurring/{id}",
    params(
        ("id" = String, Path, description = "Schedule UUID")
    ),
    request_body = ScheduleUpdate,
    responses(
        (status = 200, description = "Updated schedule", body = RecurringSchedule),
        (status = 400, description = "Malformed schedule id"),
        (status = 404, description = "Schedule not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn update_schedule(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<ScheduleUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let schedule_id =
        Uuid::parse_str(&id).map_err(|_| ApiError::invalid_id("recurring schedule", &id))?;
    Ok(Json(state.maintenance.update_schedule(schedule_id, body, Utc::now())?))
}

/// DELETE /api/maintenance/recurring/{id}
/// Delete a recurring schedule
#[utoipa::path(
    delete,
    path = "/api/maintenance/recurring/{id}",
    params(
        ("id" = String, Path, description = "Schedule UUID")
    ),
    responses(
        (status = 204, description = "Schedule deleted"),
        (status = 400, description = "Malformed schedule id"),
        (status = 404, description = "Schedule not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn delete_schedule(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let schedule_id =
        Uuid::parse_str(&id).map_err(|_| ApiError::invalid_id("recurring schedule", &id))?;
    state.maintenance.delete_schedule(schedule_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/maintenance/recurring/{id}/toggle
/// Activate or deactivate a schedule
///
/// Flips is_active and nothing else; the due date stays where it was.
#[utoipa::path(
    put,
    path = "/api/maintenance/recurring/{id}/toggle",
    params(
        ("id" = String, Path, description = "Schedule UUID")
    ),
    responses(
        (status = 200, description = "Updated schedule", body = RecurringSchedule),
        (status = 400, description = "Malformed schedule id"),
        (status = 404, description = "Schedule not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn toggle_schedule(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let schedule_id =
        Uuid::parse_str(&id).map_err(|_| ApiError::invalid_id("recurring schedule", &id))?;
    Ok(Json(state.maintenance.toggle_schedule(schedule_id, Utc::now())?))
}

/// POST /api/maintenance/recurring/generate
/// Run the due sweep now
///
/// Same pass the background scheduler runs daily: one pending record per due
/// schedule, due dates advanced one step.
#[utoipa::path(
    post,
    path = "/api/maintenance/recurring/generate",
    responses(
        (status = 200, description = "Sweep outcome", body = SweepReport),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn generate_due(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.maintenance.sweep(Utc::now())?))
}

/// GET /api/maintenance/recurring/upcoming
/// Schedules due soon
///
/// Active schedules falling due within the window, soonest first.
#[utoipa::path(
    get,
    path = "/api/maintenance/recurring/upcoming",
    params(
        ("days" = Option<u32>, Query, description = "Horizon in days (default 30)")
    ),
    responses(
        (status = 200, description = "Due schedules, soonest first", body = Vec<RecurringSchedule>),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn upcoming_schedules(
    Query(query): Query<UpcomingQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.maintenance.upcoming(query.days, Utc::now())?))
}
