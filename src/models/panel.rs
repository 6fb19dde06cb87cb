use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// ─── Panel registry ──────────────────────────────────────────────────────────

/// Fallback site coordinate for panels registered without one.
pub const DEFAULT_LATITUDE: f64 = 19.07;
pub const DEFAULT_LONGITUDE: f64 = 72.87;

/// A monitored solar installation. Readings, alerts and maintenance records
/// reference a panel by id; the panel never owns them.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Panel {
    pub id: Uuid,
    /// Display name, e.g. "Rooftop East 3"
    pub name: String,
    /// Owning user identifier — auth lives elsewhere, this is opaque here
    pub owner: String,
    /// Site latitude (deg)
    pub latitude: f64,
    /// Site longitude (deg)
    pub longitude: f64,
    /// Mounting tilt (deg from horizontal)
    pub tilt: f64,
    /// Nameplate capacity (W)
    pub capacity_w: f64,
    pub created_at: DateTime<Utc>,
}

/// Registration payload. Missing coordinates fall back to the default site.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewPanel {
    pub name: String,
    pub owner: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default = "default_tilt")]
    pub tilt: f64,
    #[serde(default = "default_capacity")]
    pub capacity_w: f64,
}

fn default_tilt() -> f64 {
    30.0
}

fn default_capacity() -> f64 {
    450.0
}

impl Panel {
    pub fn register(new: NewPanel, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: new.name,
            owner: new.owner,
            latitude: new.latitude.unwrap_or(DEFAULT_LATITUDE),
            longitude: new.longitude.unwrap_or(DEFAULT_LONGITUDE),
            tilt: new.tilt,
            capacity_w: new.capacity_w,
            created_at: now,
        }
    }
}
