use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// ─── Sensor readings ─────────────────────────────────────────────────────────

/// One timestamped sensor sample for a panel. Append-only: a stored reading is
/// never mutated. Per panel, readings are ordered by timestamp and the most
/// recent one seeds the next generated sample.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SensorReading {
    pub id: Uuid,
    pub panel_id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Cell temperature (°C)
    pub temperature: f64,
    /// DC voltage (V)
    pub voltage: f64,
    /// DC current (A)
    pub current: f64,
    /// Output power (W), voltage × current
    pub power: f64,
    /// Conversion efficiency (%)
    pub efficiency: f64,
    /// Plane-of-array irradiance (W/m²)
    pub irradiance: f64,
    /// Dust accumulation index [0,100]
    pub dust: f64,
    /// Mounting tilt carried from the panel (deg)
    pub tilt: f64,
    /// Shading (%) [0,100]
    pub shading: f64,
}

/// Caller-supplied sample for manual ingestion. Power is derived server-side
/// and the timestamp defaults to arrival time.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewReading {
    /// Target panel id (UUID string, validated before any store access)
    pub panel_id: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub temperature: f64,
    pub voltage: f64,
    pub current: f64,
    pub efficiency: f64,
    pub irradiance: f64,
    pub dust: f64,
    /// Defaults to the panel's mounting tilt when omitted
    pub tilt: Option<f64>,
    pub shading: f64,
}

// ─── Ingestion reporting ─────────────────────────────────────────────────────

/// Outcome of one ingestion pass across the fleet. Panels that failed are
/// counted, never allowed to abort the rest of the batch.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IngestionReport {
    /// Readings generated and stored
    pub generated: usize,
    /// Panels skipped because their generation step failed
    pub failed: usize,
    /// Alerts raised while evaluating the new readings
    pub alerts_raised: usize,
    pub tick_time: DateTime<Utc>,
}
