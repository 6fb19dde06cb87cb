pub mod alert_service;
pub mod ingestion_service;
pub mod maintenance_service;
pub mod signal_generator;
pub mod trend_service;
pub mod weather_service;
