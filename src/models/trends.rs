use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// ─── Time-series buckets ─────────────────────────────────────────────────────

/// Bucketing granularity for time-series aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    Hour,
    Day,
}

/// avg/min/max of one numeric field within a bucket.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct FieldStats {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

/// Aggregated statistics for one calendar hour or day. `timestamp` is the
/// earliest reading in the bucket.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TimeSeriesBucket {
    pub timestamp: DateTime<Utc>,
    pub count: usize,
    pub temperature: FieldStats,
    pub power: FieldStats,
    pub efficiency: FieldStats,
    pub dust: FieldStats,
    pub shading: FieldStats,
    pub irradiance: FieldStats,
}

// ─── Efficiency decay ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EfficiencyTrend {
    Declining,
    Improving,
    Stable,
    InsufficientData,
}

/// First-20% vs last-20% efficiency comparison over a lookback window.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EfficiencyDecayReport {
    pub panel_id: Uuid,
    pub trend: EfficiencyTrend,
    /// Percentage drop from initial to current ((init − cur)/init × 100)
    pub decay_rate: f64,
    pub initial_efficiency: f64,
    pub current_efficiency: f64,
    pub data_points: usize,
    pub period_days: u32,
}

// ─── Dust pattern ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DustTrend {
    Increasing,
    Decreasing,
    Stable,
    InsufficientData,
}

/// A day-over-day dust drop large enough to look like a cleaning.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MaintenanceEvent {
    pub date: DateTime<Utc>,
    pub dust_before: f64,
    pub dust_after: f64,
    pub reduction: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DustPatternReport {
    pub panel_id: Uuid,
    pub pattern: DustTrend,
    /// Index points gained per day over the window ((last − first)/days)
    pub accumulation_rate: f64,
    pub current_level: f64,
    pub average_level: f64,
    pub maintenance_events: Vec<MaintenanceEvent>,
    pub data_points: usize,
    pub period_days: u32,
}

// ─── Temperature correlation ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationVerdict {
    Strong,
    Moderate,
    Weak,
    InsufficientData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationSign {
    Positive,
    Negative,
}

/// min/max/avg of one input series.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct SeriesStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TemperatureCorrelationReport {
    pub panel_id: Uuid,
    pub correlation: CorrelationVerdict,
    /// Absent when there is not enough data
    pub direction: Option<CorrelationSign>,
    /// Pearson r, rounded to 3 decimals
    pub coefficient: f64,
    pub temperature: Option<SeriesStats>,
    pub efficiency: Option<SeriesStats>,
    pub data_points: usize,
    pub period_days: u32,
}

// ─── Maintenance impact ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ImpactStatus {
    Ok,
    InsufficientData,
}

/// Mean telemetry over one comparison window.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct WindowAverages {
    pub power: f64,
    pub efficiency: f64,
    pub dust: f64,
    pub temperature: f64,
    pub readings: usize,
}

/// Percentage improvements after maintenance. Dust is sign-flipped so that a
/// drop reads as a positive improvement.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct ImprovementPct {
    pub power: f64,
    pub efficiency: f64,
    pub dust: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MaintenanceImpactReport {
    pub panel_id: Uuid,
    pub status: ImpactStatus,
    pub maintenance_date: DateTime<Utc>,
    pub days_before: u32,
    pub days_after: u32,
    pub before: Option<WindowAverages>,
    pub after: Option<WindowAverages>,
    pub improvement: Option<ImprovementPct>,
}

// ─── Comprehensive report ────────────────────────────────────────────────────

/// The four read-side analyses merged into one payload.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ComprehensiveReport {
    pub panel_id: Uuid,
    pub period_days: u32,
    pub generated_at: DateTime<Utc>,
    pub time_series: Vec<TimeSeriesBucket>,
    pub efficiency_decay: EfficiencyDecayReport,
    pub dust_pattern: DustPatternReport,
    pub temperature_correlation: TemperatureCorrelationReport,
}
