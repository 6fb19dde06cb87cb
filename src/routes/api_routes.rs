use axum::{
    routing::{get, post, put},
    Router,
};

use crate::controllers::alert_controller::{create_alert, list_alerts, mark_read, resolve_alert};
use crate::controllers::maintenance_controller::{
    // Records
    list_records, request_maintenance, update_status,
    // Recurring schedules
    create_schedule, delete_schedule, generate_due, list_schedules, toggle_schedule,
    update_schedule, upcoming_schedules,
};
use crate::controllers::panel_controller::{create_panel, get_panel, list_panels};
use crate::controllers::sensor_controller::{
    create_reading, generate_now, latest_reading, list_readings,
};
use crate::controllers::settings_controller::{get_simulation, health, put_simulation};
use crate::controllers::trend_controller::{
    comprehensive, dust_pattern, efficiency_decay, maintenance_impact, temperature_correlation,
    time_series,
};
use crate::shared_state::SharedState;

/// Build the `/api/*` sub-router.
/// Handlers extract `State<AppState>` and/or `State<Config>` via
/// `FromRef<SharedState>` — a single `.with_state(shared)` covers both.
pub fn api_routes(shared: SharedState) -> Router {
    Router::new()
        .route("/health",                                    get(health))
        // Panels
        .route("/panels",                                    get(list_panels).post(create_panel))
        .route("/panels/{id}",                               get(get_panel))
        // Sensor readings
        .route("/sensors",                                   get(list_readings).post(create_reading))
        .route("/sensors/latest/{panel_id}",                 get(latest_reading))
        .route("/sensors/generate",                          post(generate_now))
        // Trend analyses
        .route("/trends/timeseries/{panel_id}",              get(time_series))
        .route("/trends/efficiency-decay/{panel_id}",        get(efficiency_decay))
        .route("/trends/dust-pattern/{panel_id}",            get(dust_pattern))
        .route("/trends/temperature-correlation/{panel_id}", get(temperature_correlation))
        .route("/trends/maintenance-impact/{panel_id}",      get(maintenance_impact))
        .route("/trends/comprehensive/{panel_id}",           get(comprehensive))
        // Alerts
        .route("/alerts",                                    get(list_alerts).post(create_alert))
        .route("/alerts/{id}/resolve",                       put(resolve_alert))
        .route("/alerts/{id}/read",                          put(mark_read))
        // Maintenance records
        .route("/maintenance",                               get(list_records).post(request_maintenance))
        .route("/maintenance/{id}/status",                   put(update_status))
        // Recurring schedules — fixed segments before the {id} routes
        .route("/maintenance/recurring",                     get(list_schedules).post(create_schedule))
        .route("/maintenance/recurring/generate",            post(generate_due))
        .route("/maintenance/recurring/upcoming",            get(upcoming_schedules))
        .route("/maintenance/recurring/{id}",                put(update_schedule).delete(delete_schedule))
        .route("/maintenance/recurring/{id}/toggle",         put(toggle_schedule))
        // Simulation settings
        .route("/settings/simulation",                       get(get_simulation).put(put_simulation))
        .with_state(shared)
}
