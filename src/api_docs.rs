use utoipa::OpenApi;

use crate::controllers::{
    alert_controller, maintenance_controller, panel_controller, sensor_controller,
    settings_controller, trend_controller,
};
use crate::models::{alert, maintenance, panel, reading, trends};

#[derive(OpenApi)]
#[openapi(
    paths(
        settings_controller::health,
        settings_controller::get_simulation,
        settings_controller::put_simulation,
        panel_controller::list_panels,
        panel_controller::get_panel,
        panel_controller::create_panel,
        sensor_controller::list_readings,
        sensor_controller::latest_reading,
        sensor_controller::create_reading,
        sensor_controller::generate_now,
        trend_controller::time_series,
        trend_controller::efficiency_decay,
        trend_controller::dust_pattern,
        trend_controller::temperature_correlation,
        trend_controller::maintenance_impact,
        trend_controller::comprehensive,
        alert_controller::list_alerts,
        alert_controller::create_alert,
        alert_controller::resolve_alert,
        alert_controller::mark_read,
        maintenance_controller::list_records,
        maintenance_controller::request_maintenance,
        maintenance_controller::update_status,
        maintenance_controller::list_schedules,
        maintenance_controller::create_schedule,
        maintenance_controller::update_schedule,
        maintenance_controller::delete_schedule,
        maintenance_controller::toggle_schedule,
        maintenance_controller::generate_due,
        maintenance_controller::upcoming_schedules
    ),
    components(
        schemas(
            panel::Panel,
            panel::NewPanel,
            reading::SensorReading,
            reading::NewReading,
            reading::IngestionReport,
            trends::Interval,
            trends::FieldStats,
            trends::TimeSeriesBucket,
            trends::EfficiencyTrend,
            trends::EfficiencyDecayReport,
            trends::DustTrend,
            trends::MaintenanceEvent,
            trends::DustPatternReport,
            trends::CorrelationVerdict,
            trends::CorrelationSign,
            trends::SeriesStats,
            trends::TemperatureCorrelationReport,
            trends::ImpactStatus,
            trends::WindowAverages,
            trends::ImprovementPct,
            trends::MaintenanceImpactReport,
            trends::ComprehensiveReport,
            alert::AlertKind,
            alert::Alert,
            alert::NewAlert,
            maintenance::MaintenanceType,
            maintenance::Frequency,
            maintenance::MaintenanceStatus,
            maintenance::StatusChange,
            maintenance::MaintenanceRecord,
            maintenance::RecurringSchedule,
            maintenance::NewSchedule,
            maintenance::ScheduleUpdate,
            maintenance::NewMaintenanceRequest,
            maintenance::StatusUpdate,
            maintenance::SweepReport,
            settings_controller::SimulationSettings,
            settings_controller::HealthStatus
        )
    ),
    tags(
        (name = "solar-fleet-monitor", description = "Solar Fleet Monitoring API")
    )
)]
pub struct ApiDoc;
