use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// ─── Maintenance vocabulary ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MaintenanceType {
    Cleaning,
    Inspection,
    Repair,
}

/// How often a recurring schedule falls due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Biannually,
    Annually,
}

impl Frequency {
    /// Next occurrence after `from`. Month-based frequencies use calendar
    /// months (end-of-month dates clamp, Jan 31 → Feb 28/29).
    pub fn advance(self, from: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Frequency::Weekly => from + Duration::days(7),
            Frequency::Biweekly => from + Duration::days(14),
            Frequency::Monthly => from + Months::new(1),
            Frequency::Quarterly => from + Months::new(3),
            Frequency::Biannually => from + Months::new(6),
            Frequency::Annually => from + Months::new(12),
        }
    }
}

// ─── Maintenance records ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    Pending,
    InProgress,
    Completed,
}

impl MaintenanceStatus {
    /// Records only move forward: pending → in_progress → completed.
    pub fn can_transition_to(self, next: MaintenanceStatus) -> bool {
        matches!(
            (self, next),
            (MaintenanceStatus::Pending, MaintenanceStatus::InProgress)
                | (MaintenanceStatus::InProgress, MaintenanceStatus::Completed)
        )
    }
}

/// One entry in a record's status timeline.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusChange {
    pub status: MaintenanceStatus,
    pub at: DateTime<Utc>,
    pub note: Option<String>,
}

/// A unit of maintenance work, either auto-generated from a due schedule or
/// requested manually. Every status change appends to `timeline`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MaintenanceRecord {
    pub id: Uuid,
    pub panel_id: Uuid,
    pub maintenance_type: MaintenanceType,
    pub status: MaintenanceStatus,
    pub scheduled_date: DateTime<Utc>,
    pub notes: Option<String>,
    /// True when created by the recurring-schedule sweep
    pub auto_generated: bool,
    pub timeline: Vec<StatusChange>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MaintenanceRecord {
    pub fn new(
        panel_id: Uuid,
        maintenance_type: MaintenanceType,
        scheduled_date: DateTime<Utc>,
        notes: Option<String>,
        auto_generated: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            panel_id,
            maintenance_type,
            status: MaintenanceStatus::Pending,
            scheduled_date,
            notes,
            auto_generated,
            timeline: vec![StatusChange {
                status: MaintenanceStatus::Pending,
                at: now,
                note: None,
            }],
            created_at: now,
            updated_at: now,
        }
    }
}

// ─── Recurring schedules ─────────────────────────────────────────────────────

/// A standing maintenance definition. `next_due_date` is always the earliest
/// occurrence not yet turned into a record; the sweep advances it, explicit
/// edits to frequency or start date reset it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecurringSchedule {
    pub id: Uuid,
    pub panel_id: Uuid,
    pub maintenance_type: MaintenanceType,
    pub frequency: Frequency,
    pub start_date: DateTime<Utc>,
    pub next_due_date: DateTime<Utc>,
    pub last_generated_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ─── API payloads ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewSchedule {
    /// Target panel id (UUID string)
    pub panel_id: String,
    pub maintenance_type: MaintenanceType,
    pub frequency: Frequency,
    pub start_date: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Partial schedule edit. Changing frequency or start date resets
/// `next_due_date` to the new start date, discarding prior progress.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ScheduleUpdate {
    pub maintenance_type: Option<MaintenanceType>,
    pub frequency: Option<Frequency>,
    pub start_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewMaintenanceRequest {
    /// Target panel id (UUID string)
    pub panel_id: String,
    pub maintenance_type: MaintenanceType,
    /// Defaults to now when omitted
    pub scheduled_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct StatusUpdate {
    pub status: MaintenanceStatus,
    pub note: Option<String>,
}

/// Sweep outcome: how many schedules fell due and the records they produced.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SweepReport {
    pub generated: usize,
    pub records: Vec<MaintenanceRecord>,
}
