/// ============================================================
///  Trend Analyzer
///
///  Four independent read-side analyses over a lookback window,
///  plus a comprehensive report that merges them:
///   - efficiency decay    first-20% vs last-20% average efficiency
///   - dust pattern        daily averages, accumulation rate, cleaning
///                         signatures (day-over-day drops > 20)
///   - temperature corr.   Pearson r between temperature and efficiency
///   - maintenance impact  before/after window averages around an event
///
///  Each returns an insufficient-data report instead of failing when
///  the window holds too few readings.
/// ============================================================
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::errors::StoreError;
use crate::models::reading::SensorReading;
use crate::models::trends::{
    ComprehensiveReport, CorrelationSign, CorrelationVerdict, DustPatternReport, DustTrend,
    EfficiencyDecayReport, EfficiencyTrend, ImpactStatus, ImprovementPct, Interval,
    MaintenanceEvent, MaintenanceImpactReport, SeriesStats, TemperatureCorrelationReport,
    WindowAverages,
};
use crate::store::ReadingStore;

// ─── Classification thresholds ────────────────────────────────
const DECAY_DECLINING_PCT: f64 = 5.0;
const DECAY_IMPROVING_PCT: f64 = -2.0;
const DUST_INCREASING_PER_DAY: f64 = 1.0;
const DUST_DECREASING_PER_DAY: f64 = -0.5;
const CLEANING_DROP_THRESHOLD: f64 = 20.0;
const CORRELATION_STRONG: f64 = 0.7;
const CORRELATION_MODERATE: f64 = 0.4;
const MIN_CORRELATION_POINTS: usize = 10;

// Maintenance rarely moves the averages beyond these bands; anything wilder
// is window noise, so the reported improvements are clamped.
const POWER_IMPROVEMENT_RANGE: (f64, f64) = (-20.0, 35.0);
const EFFICIENCY_IMPROVEMENT_RANGE: (f64, f64) = (-15.0, 25.0);
const DUST_IMPROVEMENT_RANGE: (f64, f64) = (-10.0, 90.0);

/// Average efficiency of the first 20% of readings against the last 20%,
/// expressed as a percentage drop. Chunk size is clamped to at least one
/// reading so tiny windows still produce a comparison.
pub async fn efficiency_decay(
    store: &ReadingStore,
    panel_id: Uuid,
    days: u32,
    now: DateTime<Utc>,
) -> Result<EfficiencyDecayReport, StoreError> {
    let rows = store.since(panel_id, window_floor(now, days))?;

    if rows.len() < 2 {
        return Ok(EfficiencyDecayReport {
            panel_id,
            trend: EfficiencyTrend::InsufficientData,
            decay_rate: 0.0,
            initial_efficiency: 0.0,
            current_efficiency: 0.0,
            data_points: rows.len(),
            period_days: days,
        });
    }

    let chunk = ((rows.len() as f64 * 0.2).floor() as usize).max(1);
    let initial = mean_of(&rows[..chunk], |r| r.efficiency);
    let current = mean_of(&rows[rows.len() - chunk..], |r| r.efficiency);

    let decay_rate = if initial == 0.0 {
        0.0
    } else {
        (initial - current) / initial * 100.0
    };

    let trend = if decay_rate > DECAY_DECLINING_PCT {
        EfficiencyTrend::Declining
    } else if decay_rate < DECAY_IMPROVING_PCT {
        EfficiencyTrend::Improving
    } else {
        EfficiencyTrend::Stable
    };

    Ok(EfficiencyDecayReport {
        panel_id,
        trend,
        decay_rate: round_to(decay_rate, 2),
        initial_efficiency: round_to(initial, 2),
        current_efficiency: round_to(current, 2),
        data_points: rows.len(),
        period_days: days,
    })
}

/// Daily average dust levels: accumulation rate over the window, plus a scan
/// for day-over-day drops large enough to read as a cleaning.
pub async fn dust_pattern(
    store: &ReadingStore,
    panel_id: Uuid,
    days: u32,
    now: DateTime<Utc>,
) -> Result<DustPatternReport, StoreError> {
    let rows = store.since(panel_id, window_floor(now, days))?;
    let daily = daily_dust_averages(&rows);

    if daily.len() < 2 {
        return Ok(DustPatternReport {
            panel_id,
            pattern: DustTrend::InsufficientData,
            accumulation_rate: 0.0,
            current_level: 0.0,
            average_level: 0.0,
            maintenance_events: Vec::new(),
            data_points: daily.len(),
            period_days: days,
        });
    }

    let initial = daily[0].1;
    let current = daily[daily.len() - 1].1;
    let average = daily.iter().map(|(_, dust)| dust).sum::<f64>() / daily.len() as f64;
    let accumulation_rate = (current - initial) / f64::from(days.max(1));

    let pattern = if accumulation_rate > DUST_INCREASING_PER_DAY {
        DustTrend::Increasing
    } else if accumulation_rate < DUST_DECREASING_PER_DAY {
        DustTrend::Decreasing
    } else {
        DustTrend::Stable
    };

    let mut maintenance_events = Vec::new();
    for pair in daily.windows(2) {
        let (_, before) = pair[0];
        let (date, after) = pair[1];
        if before - after > CLEANING_DROP_THRESHOLD {
            maintenance_events.push(MaintenanceEvent {
                date,
                dust_before: round_to(before, 2),
                dust_after: round_to(after, 2),
                reduction: round_to(before - after, 2),
            });
        }
    }

    Ok(DustPatternReport {
        panel_id,
        pattern,
        accumulation_rate: round_to(accumulation_rate, 2),
        current_level: round_to(current, 2),
        average_level: round_to(average, 2),
        maintenance_events,
        data_points: daily.len(),
        period_days: days,
    })
}

/// Pearson correlation between the temperature and efficiency series.
/// A constant series has no variance to correlate against and reports
/// coefficient 0 / weak.
pub async fn temperature_correlation(
    store: &ReadingStore,
    panel_id: Uuid,
    days: u32,
    now: DateTime<Utc>,
) -> Result<TemperatureCorrelationReport, StoreError> {
    let rows = store.since(panel_id, window_floor(now, days))?;

    if rows.len() < MIN_CORRELATION_POINTS {
        return Ok(TemperatureCorrelationReport {
            panel_id,
            correlation: CorrelationVerdict::InsufficientData,
            direction: None,
            coefficient: 0.0,
            temperature: None,
            efficiency: None,
            data_points: rows.len(),
            period_days: days,
        });
    }

    let temps: Vec<f64> = rows.iter().map(|r| r.temperature).collect();
    let effs: Vec<f64> = rows.iter().map(|r| r.efficiency).collect();
    let avg_t = temps.iter().sum::<f64>() / temps.len() as f64;
    let avg_e = effs.iter().sum::<f64>() / effs.len() as f64;

    let mut numerator = 0.0;
    let mut denom_t = 0.0;
    let mut denom_e = 0.0;
    for (t, e) in temps.iter().zip(&effs) {
        let dt = t - avg_t;
        let de = e - avg_e;
        numerator += dt * de;
        denom_t += dt * dt;
        denom_e += de * de;
    }

    let denominator = (denom_t * denom_e).sqrt();
    let coefficient = if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    };

    let correlation = if coefficient.abs() > CORRELATION_STRONG {
        CorrelationVerdict::Strong
    } else if coefficient.abs() > CORRELATION_MODERATE {
        CorrelationVerdict::Moderate
    } else {
        CorrelationVerdict::Weak
    };
    let direction = if coefficient < 0.0 {
        CorrelationSign::Negative
    } else {
        CorrelationSign::Positive
    };

    Ok(TemperatureCorrelationReport {
        panel_id,
        correlation,
        direction: Some(direction),
        coefficient: round_to(coefficient, 3),
        temperature: Some(series_stats(&temps)),
        efficiency: Some(series_stats(&effs)),
        data_points: rows.len(),
        period_days: days,
    })
}

/// Window averages around an explicit maintenance timestamp. The before
/// window excludes the timestamp itself, the after window includes it.
pub async fn maintenance_impact(
    store: &ReadingStore,
    panel_id: Uuid,
    maintenance_date: DateTime<Utc>,
    days_before: u32,
    days_after: u32,
) -> Result<MaintenanceImpactReport, StoreError> {
    let rows = store.between(
        panel_id,
        window_floor(maintenance_date, days_before),
        window_ceil(maintenance_date, days_after),
    )?;
    let (before, after): (Vec<SensorReading>, Vec<SensorReading>) = rows
        .into_iter()
        .partition(|r| r.timestamp < maintenance_date);

    if before.is_empty() || after.is_empty() {
        return Ok(MaintenanceImpactReport {
            panel_id,
            status: ImpactStatus::InsufficientData,
            maintenance_date,
            days_before,
            days_after,
            before: None,
            after: None,
            improvement: None,
        });
    }

    let before_avg = window_averages(&before);
    let after_avg = window_averages(&after);
    let improvement = ImprovementPct {
        power: improvement_pct(
            before_avg.power,
            after_avg.power,
            false,
            POWER_IMPROVEMENT_RANGE,
        ),
        efficiency: improvement_pct(
            before_avg.efficiency,
            after_avg.efficiency,
            false,
            EFFICIENCY_IMPROVEMENT_RANGE,
        ),
        dust: improvement_pct(
            before_avg.dust,
            after_avg.dust,
            true,
            DUST_IMPROVEMENT_RANGE,
        ),
    };

    Ok(MaintenanceImpactReport {
        panel_id,
        status: ImpactStatus::Ok,
        maintenance_date,
        days_before,
        days_after,
        before: Some(before_avg),
        after: Some(after_avg),
        improvement: Some(improvement),
    })
}

/// Day-bucketed series, decay, dust and correlation in one payload.
pub async fn comprehensive(
    store: &ReadingStore,
    panel_id: Uuid,
    days: u32,
    now: DateTime<Utc>,
) -> Result<ComprehensiveReport, StoreError> {
    let (series, decay, dust, correlation) = tokio::join!(
        async { store.aggregate(panel_id, Interval::Day, days as usize) },
        efficiency_decay(store, panel_id, days, now),
        dust_pattern(store, panel_id, days, now),
        temperature_correlation(store, panel_id, days, now),
    );

    Ok(ComprehensiveReport {
        panel_id,
        period_days: days,
        generated_at: now,
        time_series: series?,
        efficiency_decay: decay?,
        dust_pattern: dust?,
        temperature_correlation: correlation?,
    })
}

// ─── Helpers ──────────────────────────────────────────────────

/// Lookback anchor `days` before `anchor`, saturating at the calendar
/// minimum so an oversized window reads as "all history".
fn window_floor(anchor: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    anchor
        .checked_sub_signed(Duration::days(i64::from(days)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Forward counterpart of [`window_floor`], saturating at the maximum.
fn window_ceil(anchor: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    anchor
        .checked_add_signed(Duration::days(i64::from(days)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// (earliest timestamp, average dust) per calendar day, chronological.
fn daily_dust_averages(rows: &[SensorReading]) -> Vec<(DateTime<Utc>, f64)> {
    struct DayAccum {
        first_seen: DateTime<Utc>,
        sum: f64,
        n: usize,
    }

    let mut by_day: BTreeMap<NaiveDate, DayAccum> = BTreeMap::new();
    for r in rows {
        by_day
            .entry(r.timestamp.date_naive())
            .and_modify(|d| {
                d.sum += r.dust;
                d.n += 1;
            })
            .or_insert(DayAccum {
                first_seen: r.timestamp,
                sum: r.dust,
                n: 1,
            });
    }

    by_day
        .into_values()
        .map(|d| (d.first_seen, d.sum / d.n as f64))
        .collect()
}

fn window_averages(rows: &[SensorReading]) -> WindowAverages {
    WindowAverages {
        power: round_to(mean_of(rows, |r| r.power), 2),
        efficiency: round_to(mean_of(rows, |r| r.efficiency), 2),
        dust: round_to(mean_of(rows, |r| r.dust), 2),
        temperature: round_to(mean_of(rows, |r| r.temperature), 2),
        readings: rows.len(),
    }
}

/// Percentage change of `after` against `before`, clamped to `range`.
/// `reduction` flips the sign so a drop reads as positive improvement.
fn improvement_pct(before: f64, after: f64, reduction: bool, range: (f64, f64)) -> f64 {
    if before == 0.0 {
        return 0.0;
    }
    let raw = if reduction {
        (before - after) / before * 100.0
    } else {
        (after - before) / before * 100.0
    };
    round_to(raw, 2).clamp(range.0, range.1)
}

fn mean_of(rows: &[SensorReading], field: impl Fn(&SensorReading) -> f64) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    rows.iter().map(field).sum::<f64>() / rows.len() as f64
}

fn series_stats(values: &[f64]) -> SeriesStats {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    for &v in values {
        min = min.min(v);
        max = max.max(v);
        sum += v;
    }
    SeriesStats {
        min: round_to(min, 2),
        max: round_to(max, 2),
        avg: round_to(sum / values.len() as f64, 2),
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
