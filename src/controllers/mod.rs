pub mod alert_controller;
pub mod maintenance_controller;
pub mod panel_controller;
pub mod sensor_controller;
pub mod settings_controller;
pub mod trend_controller;
