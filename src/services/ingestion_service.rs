/// ============================================================
///  Ingestion Scheduler
///
///  Three entry points around the signal generator:
///   - run_scheduled   fixed-interval tick loop (first tick immediate)
///   - ingest_once     one pass over the fleet: weather → generate →
///                     batch insert → alert evaluation; also the manual
///                     trigger behind POST /api/sensors/generate
///   - backfill        startup history synthesis for empty panels
///
///  One panel failing never aborts the batch for the others.
/// ============================================================
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use futures_util::future::join_all;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::errors::{ApiError, StoreError};
use crate::models::reading::{IngestionReport, SensorReading};
use crate::services::alert_service;
use crate::services::signal_generator::{self, GenerationStrategy};
use crate::shared_state::AppState;

/// Scheduled generation loop. `tokio::time::interval` fires its first tick
/// immediately, which covers the once-shortly-after-start requirement.
pub async fn run_scheduled(state: AppState, config: Config) {
    let period = StdDuration::from_secs(config.ingestion.interval_minutes.max(1) * 60);
    let mut ticker = tokio::time::interval(period);
    loop {
        ticker.tick().await;
        if let Err(e) = ingest_once(&state, &config).await {
            error!(error = %e, "scheduled ingestion tick failed");
        }
    }
}

/// Recurring-maintenance sweep loop, coarse by default (daily).
pub async fn run_sweeps(state: AppState, config: Config) {
    let period = StdDuration::from_secs(config.ingestion.sweep_interval_hours.max(1) * 3600);
    let mut ticker = tokio::time::interval(period);
    loop {
        ticker.tick().await;
        if let Err(e) = state.maintenance.sweep(Utc::now()) {
            error!(error = %e, "recurring maintenance sweep failed");
        }
    }
}

/// One generation pass over every registered panel.
///
/// Panels are processed in registry order and reading `i` is stamped
/// `tick_time + i` seconds, so batch timestamps never tie. All readings land
/// in a single batch insert, then each one runs through the alert evaluator.
pub async fn ingest_once(state: &AppState, config: &Config) -> Result<IngestionReport, ApiError> {
    let tick_time = Utc::now();
    let step = state.next_step();
    let offline = state.is_offline();
    let panels = state.list_panels()?;

    let jobs = panels.iter().enumerate().map(|(i, panel)| async move {
        let weather = if offline {
            None
        } else {
            state.weather.fetch(panel.latitude, panel.longitude).await
        };
        let previous = state.store.latest(panel.id)?;
        let at = tick_time + Duration::seconds(i as i64);
        Ok::<SensorReading, StoreError>(signal_generator::generate(
            panel,
            previous.as_ref(),
            weather,
            at,
            step,
            GenerationStrategy::BoundedWalk,
            &config.generator.live,
        ))
    });

    let mut readings = Vec::with_capacity(panels.len());
    let mut failed = 0usize;
    for (panel, outcome) in panels.iter().zip(join_all(jobs).await) {
        match outcome {
            Ok(reading) => readings.push(reading),
            Err(e) => {
                failed += 1;
                warn!(panel = %panel.id, error = %e, "panel generation failed, continuing");
            }
        }
    }

    let generated = state.store.insert_many(readings.clone())?;

    let mut alerts_raised = 0usize;
    for reading in &readings {
        let drafts = alert_service::evaluate(reading, &config.thresholds);
        alerts_raised += state.record_alerts(reading.panel_id, drafts, reading.timestamp)?;
    }

    info!(generated, failed, alerts_raised, "ingestion tick complete");
    Ok(IngestionReport {
        generated,
        failed,
        alerts_raised,
        tick_time,
    })
}

/// Synthesize history for panels that have none: `backfill_days` of samples
/// at the configured stride, one-shot targets, previous reading carried
/// across steps so dust accumulates and cleaning resets show up in the
/// record. Weather never participates; history predates the cache.
pub async fn backfill(state: &AppState, config: &Config) -> Result<usize, ApiError> {
    let days = config.ingestion.backfill_days;
    if days == 0 {
        return Ok(0);
    }
    let stride = i64::from(config.ingestion.backfill_stride_minutes.max(1));
    let steps = i64::from(days) * 24 * 60 / stride;
    let now = Utc::now();
    let panels = state.list_panels()?;
    let profile = &config.generator.backfill;

    let mut total = 0usize;
    for panel in &panels {
        if state.store.count(panel.id)? > 0 {
            continue;
        }

        let mut previous: Option<SensorReading> = None;
        let mut rows = Vec::with_capacity(steps as usize);
        for step in 0..steps {
            let at = now - Duration::minutes((steps - step) * stride);
            let reading = signal_generator::generate(
                panel,
                previous.as_ref(),
                None,
                at,
                step as u64,
                GenerationStrategy::OneShot,
                profile,
            );
            previous = Some(reading.clone());
            rows.push(reading);
        }
        total += state.store.insert_many(rows)?;
    }

    if total > 0 {
        info!(readings = total, "backfill seeded history");
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_config(panels: usize) -> Config {
        let panel_entries: Vec<String> = (0..panels)
            .map(|i| format!(r#"{{ "name": "Panel {i}", "latitude": 45.0, "longitude": 7.6 }}"#))
            .collect();
        serde_json::from_str(&format!(
            r#"{{
                "server": {{ "port": 0 }},
                "offline_mode": true,
                "ingestion": {{ "backfill_days": 2, "backfill_stride_minutes": 60 }},
                "panels": [{}]
            }}"#,
            panel_entries.join(",")
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn offline_tick_generates_one_reading_per_panel() {
        let config = offline_config(3);
        let state = AppState::new(&config).unwrap();
        state.seed_panels(&config, Utc::now()).unwrap();

        let report = ingest_once(&state, &config).await.unwrap();
        assert_eq!(report.generated, 3);
        assert_eq!(report.failed, 0);
        assert_eq!(state.store.total_count().unwrap(), 3);

        for panel in state.list_panels().unwrap() {
            assert!(state.store.latest(panel.id).unwrap().is_some());
        }
    }

    #[tokio::test]
    async fn batch_timestamps_are_strictly_ordered() {
        let config = offline_config(3);
        let state = AppState::new(&config).unwrap();
        state.seed_panels(&config, Utc::now()).unwrap();
        ingest_once(&state, &config).await.unwrap();

        let mut stamps: Vec<_> = state
            .list_panels()
            .unwrap()
            .iter()
            .map(|p| state.store.latest(p.id).unwrap().unwrap().timestamp)
            .collect();
        let unique = stamps.len();
        stamps.sort();
        stamps.dedup();
        assert_eq!(stamps.len(), unique, "per-index offsets keep stamps distinct");
        assert_eq!(
            (stamps[2] - stamps[0]).num_seconds(),
            2,
            "one second per panel index"
        );
    }

    #[tokio::test]
    async fn consecutive_ticks_continue_the_walk() {
        let config = offline_config(1);
        let state = AppState::new(&config).unwrap();
        state.seed_panels(&config, Utc::now()).unwrap();

        ingest_once(&state, &config).await.unwrap();
        let panel = state.list_panels().unwrap()[0].id;
        let first = state.store.latest(panel).unwrap().unwrap();

        ingest_once(&state, &config).await.unwrap();
        let second = state.store.latest(panel).unwrap().unwrap();

        assert!(second.timestamp > first.timestamp);
        let max_jump = config.generator.live.temperature_max_delta
            + config.generator.live.temperature_step_noise
            + 0.01;
        assert!(
            (second.temperature - first.temperature).abs() <= max_jump,
            "temperature step stayed bounded: {} -> {}",
            first.temperature,
            second.temperature
        );
    }

    #[tokio::test]
    async fn threshold_crossings_raise_alerts_during_ingestion() {
        let mut config = offline_config(2);
        // a threshold below any generated value fires on every reading
        config.thresholds.temperature_warning = -100.0;
        let state = AppState::new(&config).unwrap();
        state.seed_panels(&config, Utc::now()).unwrap();

        let report = ingest_once(&state, &config).await.unwrap();
        assert_eq!(report.alerts_raised, 2);
        assert_eq!(state.list_alerts(None, None).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn backfilled_history_feeds_the_trend_analyses() {
        use crate::models::trends::{EfficiencyTrend, Interval};
        use crate::services::trend_service;

        let config = offline_config(1);
        let state = AppState::new(&config).unwrap();
        state.seed_panels(&config, Utc::now()).unwrap();
        backfill(&state, &config).await.unwrap();
        let panel = state.list_panels().unwrap()[0].id;

        let decay = trend_service::efficiency_decay(&state.store, panel, 7, Utc::now())
            .await
            .unwrap();
        assert_eq!(decay.data_points, 48);
        assert_ne!(decay.trend, EfficiencyTrend::InsufficientData);

        let dust = trend_service::dust_pattern(&state.store, panel, 7, Utc::now())
            .await
            .unwrap();
        assert!(dust.data_points >= 2, "48 hourly samples span at least two days");

        let series = state.store.aggregate(panel, Interval::Day, 7).unwrap();
        assert!(!series.is_empty());
        assert!(
            series.windows(2).all(|w| w[0].timestamp <= w[1].timestamp),
            "buckets come back oldest first"
        );
    }

    #[tokio::test]
    async fn backfill_fills_only_empty_panels() {
        let config = offline_config(2);
        let state = AppState::new(&config).unwrap();
        state.seed_panels(&config, Utc::now()).unwrap();
        let panels = state.list_panels().unwrap();

        // pre-seed one panel so the sweep must skip it
        ingest_once(&state, &config).await.unwrap();
        let pre_seeded: Vec<_> = panels
            .iter()
            .filter(|p| state.store.count(p.id).unwrap() > 0)
            .collect();
        assert_eq!(pre_seeded.len(), 2);

        // both panels already have data: nothing to do
        assert_eq!(backfill(&state, &config).await.unwrap(), 0);

        // a fresh fleet gets 2 days × 24 samples each
        let fresh = AppState::new(&config).unwrap();
        fresh.seed_panels(&config, Utc::now()).unwrap();
        let seeded = backfill(&fresh, &config).await.unwrap();
        assert_eq!(seeded, 2 * 48);

        let panel = fresh.list_panels().unwrap()[0].id;
        let rows = fresh.store.recent(panel, 100).unwrap();
        assert_eq!(rows.len(), 48);
        assert!(rows[0].timestamp > rows[47].timestamp, "recent() is newest first");
        assert!(rows[0].timestamp <= Utc::now());
    }
}
