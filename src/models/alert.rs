use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// ─── Threshold alerts ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Info,
    Warning,
    Critical,
}

/// A raised alert. Created by the threshold evaluator (or manually over the
/// API); afterwards only the resolve / mark-read flags may change.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Alert {
    pub id: Uuid,
    pub panel_id: Uuid,
    pub kind: AlertKind,
    /// Human-readable description embedding the measured value
    pub message: String,
    pub resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Evaluator verdict before persistence. The panel comes from the reading;
/// id and created_at are stamped at insert time.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertDraft {
    pub kind: AlertKind,
    pub message: String,
}

/// Manual alert creation payload.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewAlert {
    /// Target panel id (UUID string)
    pub panel_id: String,
    pub kind: AlertKind,
    pub message: String,
}

impl Alert {
    pub fn from_draft(panel_id: Uuid, draft: AlertDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            panel_id,
            kind: draft.kind,
            message: draft.message,
            resolved: false,
            resolved_at: None,
            read: false,
            created_at: now,
        }
    }
}
