use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use uuid::Uuid;

use crate::errors::StoreError;
use crate::models::reading::SensorReading;
use crate::models::trends::{FieldStats, Interval, TimeSeriesBucket};

/// Raw rows fetched per requested bucket, so recent partially-filled buckets
/// are never starved by the row cutoff.
const BUCKET_OVERSAMPLE: usize = 10;

/// Append-only, panel-keyed, time-ordered reading store. Rows are kept sorted
/// by timestamp per panel regardless of arrival order; stored readings are
/// never mutated.
#[derive(Debug, Clone, Default)]
pub struct ReadingStore {
    readings: Arc<RwLock<HashMap<Uuid, Vec<SensorReading>>>>,
}

impl ReadingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, reading: SensorReading) -> Result<(), StoreError> {
        let mut map = self.readings.write()?;
        Self::insert_sorted(map.entry(reading.panel_id).or_default(), reading);
        Ok(())
    }

    /// Bulk write for one ingestion batch. One lock acquisition for the whole
    /// batch; callers see it as a single write.
    pub fn insert_many(&self, readings: Vec<SensorReading>) -> Result<usize, StoreError> {
        let mut map = self.readings.write()?;
        let n = readings.len();
        for reading in readings {
            Self::insert_sorted(map.entry(reading.panel_id).or_default(), reading);
        }
        Ok(n)
    }

    fn insert_sorted(rows: &mut Vec<SensorReading>, reading: SensorReading) {
        let at = rows.partition_point(|r| r.timestamp <= reading.timestamp);
        rows.insert(at, reading);
    }

    /// Most recent reading for a panel, the seed for the next generated one.
    pub fn latest(&self, panel_id: Uuid) -> Result<Option<SensorReading>, StoreError> {
        let map = self.readings.read()?;
        Ok(map.get(&panel_id).and_then(|rows| rows.last().cloned()))
    }

    /// Up to `limit` readings for one panel, newest first.
    pub fn recent(&self, panel_id: Uuid, limit: usize) -> Result<Vec<SensorReading>, StoreError> {
        let map = self.readings.read()?;
        Ok(map
            .get(&panel_id)
            .map(|rows| rows.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    /// Up to `limit` readings across the whole fleet, newest first.
    pub fn recent_all(&self, limit: usize) -> Result<Vec<SensorReading>, StoreError> {
        let map = self.readings.read()?;
        let mut rows: Vec<SensorReading> = map.values().flatten().cloned().collect();
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        rows.truncate(limit);
        Ok(rows)
    }

    /// All readings for a panel at or after `from`, chronological.
    pub fn since(
        &self,
        panel_id: Uuid,
        from: DateTime<Utc>,
    ) -> Result<Vec<SensorReading>, StoreError> {
        let map = self.readings.read()?;
        Ok(map
            .get(&panel_id)
            .map(|rows| {
                let start = rows.partition_point(|r| r.timestamp < from);
                rows[start..].to_vec()
            })
            .unwrap_or_default())
    }

    /// Readings with `from <= timestamp <= to`, chronological.
    pub fn between(
        &self,
        panel_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<SensorReading>, StoreError> {
        let map = self.readings.read()?;
        Ok(map
            .get(&panel_id)
            .map(|rows| {
                let start = rows.partition_point(|r| r.timestamp < from);
                let end = rows.partition_point(|r| r.timestamp <= to);
                rows[start..end].to_vec()
            })
            .unwrap_or_default())
    }

    pub fn count(&self, panel_id: Uuid) -> Result<usize, StoreError> {
        let map = self.readings.read()?;
        Ok(map.get(&panel_id).map(Vec::len).unwrap_or(0))
    }

    pub fn total_count(&self) -> Result<usize, StoreError> {
        let map = self.readings.read()?;
        Ok(map.values().map(Vec::len).sum())
    }

    /// Group readings into calendar-hour or calendar-day buckets with
    /// avg/min/max per field. Scans the newest `limit × 10` raw rows, keeps
    /// the `limit` most recent buckets and returns them oldest → newest; each
    /// bucket is stamped with the earliest reading it contains.
    pub fn aggregate(
        &self,
        panel_id: Uuid,
        interval: Interval,
        limit: usize,
    ) -> Result<Vec<TimeSeriesBucket>, StoreError> {
        let map = self.readings.read()?;
        let rows = match map.get(&panel_id) {
            Some(rows) => rows,
            None => return Ok(Vec::new()),
        };

        let take = limit.saturating_mul(BUCKET_OVERSAMPLE);
        let mut groups: BTreeMap<DateTime<Utc>, BucketAccum> = BTreeMap::new();
        for r in rows.iter().rev().take(take) {
            groups
                .entry(truncate(r.timestamp, interval))
                .and_modify(|acc| acc.add(r))
                .or_insert_with(|| BucketAccum::new(r));
        }

        let skip = groups.len().saturating_sub(limit);
        Ok(groups
            .into_values()
            .skip(skip)
            .map(BucketAccum::finish)
            .collect())
    }
}

/// Floor a timestamp to its calendar hour or day.
fn truncate(ts: DateTime<Utc>, interval: Interval) -> DateTime<Utc> {
    let hour = match interval {
        Interval::Hour => ts.hour(),
        Interval::Day => 0,
    };
    Utc.with_ymd_and_hms(ts.year(), ts.month(), ts.day(), hour, 0, 0)
        .single()
        .unwrap_or(ts)
}

struct FieldAccum {
    sum: f64,
    min: f64,
    max: f64,
}

impl FieldAccum {
    fn new(v: f64) -> Self {
        Self { sum: v, min: v, max: v }
    }

    fn add(&mut self, v: f64) {
        self.sum += v;
        self.min = self.min.min(v);
        self.max = self.max.max(v);
    }

    fn finish(&self, count: usize) -> FieldStats {
        FieldStats {
            avg: safe_round2(self.sum / count as f64),
            min: safe_round2(self.min),
            max: safe_round2(self.max),
        }
    }
}

struct BucketAccum {
    earliest: DateTime<Utc>,
    count: usize,
    temperature: FieldAccum,
    power: FieldAccum,
    efficiency: FieldAccum,
    dust: FieldAccum,
    shading: FieldAccum,
    irradiance: FieldAccum,
}

impl BucketAccum {
    fn new(r: &SensorReading) -> Self {
        Self {
            earliest: r.timestamp,
            count: 1,
            temperature: FieldAccum::new(r.temperature),
            power: FieldAccum::new(r.power),
            efficiency: FieldAccum::new(r.efficiency),
            dust: FieldAccum::new(r.dust),
            shading: FieldAccum::new(r.shading),
            irradiance: FieldAccum::new(r.irradiance),
        }
    }

    fn add(&mut self, r: &SensorReading) {
        self.earliest = self.earliest.min(r.timestamp);
        self.count += 1;
        self.temperature.add(r.temperature);
        self.power.add(r.power);
        self.efficiency.add(r.efficiency);
        self.dust.add(r.dust);
        self.shading.add(r.shading);
        self.irradiance.add(r.irradiance);
    }

    fn finish(self) -> TimeSeriesBucket {
        TimeSeriesBucket {
            timestamp: self.earliest,
            count: self.count,
            temperature: self.temperature.finish(self.count),
            power: self.power.finish(self.count),
            efficiency: self.efficiency.finish(self.count),
            dust: self.dust.finish(self.count),
            shading: self.shading.finish(self.count),
            irradiance: self.irradiance.finish(self.count),
        }
    }
}

fn safe_round2(v: f64) -> f64 {
    if !v.is_finite() {
        return 0.0;
    }
    (v * 100.0).round() / 100.0
}
