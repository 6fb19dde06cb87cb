use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use axum::extract::FromRef;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::Config;
use crate::errors::ApiError;
use crate::models::alert::{Alert, AlertDraft, AlertKind};
use crate::models::panel::{NewPanel, Panel};
use crate::services::maintenance_service::MaintenanceService;
use crate::services::weather_service::WeatherService;
use crate::store::ReadingStore;

/// Process-wide mutable state. Collections sit behind std RwLocks with short
/// critical sections; no await happens while a lock is held.
#[derive(Clone)]
pub struct AppState {
    pub panels: Arc<RwLock<Vec<Panel>>>,
    pub store: ReadingStore,
    pub alerts: Arc<RwLock<Vec<Alert>>>,
    pub maintenance: MaintenanceService,
    pub weather: WeatherService,
    /// Offline mode flag — toggled at runtime via API
    pub offline_mode: Arc<AtomicBool>,
    /// Generation tick sequence shared by the scheduled loop and the manual
    /// trigger; part of every reading's PRNG seed
    ticks: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self {
            panels: Arc::new(RwLock::new(Vec::new())),
            store: ReadingStore::new(),
            alerts: Arc::new(RwLock::new(Vec::new())),
            maintenance: MaintenanceService::new(),
            weather: WeatherService::with_memory_cache(&config.weather)?,
            offline_mode: Arc::new(AtomicBool::new(config.offline_mode)),
            ticks: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn is_offline(&self) -> bool {
        self.offline_mode.load(Ordering::Relaxed)
    }

    pub fn set_offline(&self, value: bool) {
        self.offline_mode.store(value, Ordering::Relaxed);
    }

    pub fn next_step(&self) -> u64 {
        self.ticks.fetch_add(1, Ordering::Relaxed)
    }

    // ─── Panels ───────────────────────────────────────────────

    /// Put the configured fleet into the registry. Runs once at startup,
    /// before the ingestion loop spawns.
    pub fn seed_panels(&self, config: &Config, now: DateTime<Utc>) -> Result<usize, ApiError> {
        let mut panels = self.panels.write()?;
        for seed in &config.panels {
            panels.push(Panel::register(
                NewPanel {
                    name: seed.name.clone(),
                    owner: seed.owner.clone(),
                    latitude: seed.latitude,
                    longitude: seed.longitude,
                    tilt: seed.tilt,
                    capacity_w: seed.capacity_w,
                },
                now,
            ));
        }
        Ok(panels.len())
    }

    pub fn register_panel(&self, new: NewPanel, now: DateTime<Utc>) -> Result<Panel, ApiError> {
        let panel = Panel::register(new, now);
        self.panels.write()?.push(panel.clone());
        Ok(panel)
    }

    pub fn list_panels(&self) -> Result<Vec<Panel>, ApiError> {
        Ok(self.panels.read()?.clone())
    }

    pub fn panel(&self, id: Uuid) -> Result<Panel, ApiError> {
        self.panels
            .read()?
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(ApiError::NotFound("panel"))
    }

    // ─── Alerts ───────────────────────────────────────────────

    /// Persist evaluator drafts for one reading's panel. Returns how many
    /// alerts were stored.
    pub fn record_alerts(
        &self,
        panel_id: Uuid,
        drafts: Vec<AlertDraft>,
        now: DateTime<Utc>,
    ) -> Result<usize, ApiError> {
        if drafts.is_empty() {
            return Ok(0);
        }
        let mut alerts = self.alerts.write()?;
        let n = drafts.len();
        for draft in drafts {
            alerts.push(Alert::from_draft(panel_id, draft, now));
        }
        Ok(n)
    }

    pub fn create_alert(
        &self,
        panel_id: Uuid,
        kind: AlertKind,
        message: String,
        now: DateTime<Utc>,
    ) -> Result<Alert, ApiError> {
        let alert = Alert::from_draft(panel_id, AlertDraft { kind, message }, now);
        self.alerts.write()?.push(alert.clone());
        Ok(alert)
    }

    /// Alerts newest first, optionally filtered by panel and resolved flag.
    pub fn list_alerts(
        &self,
        panel_id: Option<Uuid>,
        resolved: Option<bool>,
    ) -> Result<Vec<Alert>, ApiError> {
        let alerts = self.alerts.read()?;
        let mut out: Vec<Alert> = alerts
            .iter()
            .filter(|a| panel_id.is_none_or(|id| a.panel_id == id))
            .filter(|a| resolved.is_none_or(|flag| a.resolved == flag))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    /// Mark resolved. Idempotent: resolving twice keeps the first resolution
    /// timestamp.
    pub fn resolve_alert(&self, id: Uuid, now: DateTime<Utc>) -> Result<Alert, ApiError> {
        let mut alerts = self.alerts.write()?;
        let alert = alerts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(ApiError::NotFound("alert"))?;
        if !alert.resolved {
            alert.resolved = true;
            alert.resolved_at = Some(now);
        }
        Ok(alert.clone())
    }

    pub fn mark_alert_read(&self, id: Uuid) -> Result<Alert, ApiError> {
        let mut alerts = self.alerts.write()?;
        let alert = alerts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(ApiError::NotFound("alert"))?;
        alert.read = true;
        Ok(alert.clone())
    }
}

/// Per-request state bundle; axum clones it per handler and `FromRef` lets
/// handlers extract `State<AppState>` or `State<Config>` directly.
#[derive(Clone)]
pub struct SharedState {
    pub app: AppState,
    pub config: Config,
}

impl FromRef<SharedState> for AppState {
    fn from_ref(shared: &SharedState) -> Self {
        shared.app.clone()
    }
}

impl FromRef<SharedState> for Config {
    fn from_ref(shared: &SharedState) -> Self {
        shared.config.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::alert::AlertKind;
    use chrono::TimeZone;

    fn state() -> AppState {
        let config: Config = serde_json::from_str(
            r#"{ "server": { "port": 0 }, "panels": [] }"#,
        )
        .unwrap();
        AppState::new(&config).unwrap()
    }

    fn at_noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn resolve_is_idempotent() {
        let state = state();
        let alert = state
            .create_alert(Uuid::new_v4(), AlertKind::Warning, "hot".into(), at_noon())
            .unwrap();

        let first = state
            .resolve_alert(alert.id, at_noon() + chrono::Duration::hours(1))
            .unwrap();
        let second = state
            .resolve_alert(alert.id, at_noon() + chrono::Duration::hours(2))
            .unwrap();

        assert!(first.resolved && second.resolved);
        assert_eq!(first.resolved_at, second.resolved_at, "first timestamp kept");
    }

    #[test]
    fn alert_listing_filters_by_panel_and_resolution() {
        let state = state();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let t = at_noon();
        state
            .create_alert(a, AlertKind::Warning, "one".into(), t)
            .unwrap();
        let resolved = state
            .create_alert(a, AlertKind::Info, "two".into(), t + chrono::Duration::minutes(1))
            .unwrap();
        state
            .create_alert(b, AlertKind::Critical, "three".into(), t + chrono::Duration::minutes(2))
            .unwrap();
        state.resolve_alert(resolved.id, t + chrono::Duration::hours(1)).unwrap();

        let for_a = state.list_alerts(Some(a), None).unwrap();
        assert_eq!(for_a.len(), 2);
        assert_eq!(for_a[0].message, "two", "newest first");

        let open_a = state.list_alerts(Some(a), Some(false)).unwrap();
        assert_eq!(open_a.len(), 1);
        assert_eq!(open_a[0].message, "one");

        assert_eq!(state.list_alerts(None, None).unwrap().len(), 3);
    }

    #[test]
    fn unknown_panel_lookup_is_not_found() {
        let state = state();
        assert!(matches!(
            state.panel(Uuid::new_v4()),
            Err(ApiError::NotFound("panel"))
        ));
    }
}
