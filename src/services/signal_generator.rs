/// ============================================================
///  Synthetic Sensor Signal Generator
///
///  Pipeline, one reading per panel per call:
///   1. Seed          – deterministic per-panel PRNG (panel id × step),
///                      so concurrent panels never share random state
///   2. Targets       – weather-adapter values when available, otherwise
///                      a triangular day curve peaking at local noon
///   3. Bounded walk  – irradiance/temperature chase the target with a
///                      clamped per-step delta plus noise (or are taken
///                      from scratch under the one-shot strategy)
///   4. Dust          – monotonic accumulation, rare cleaning resets
///   5. Shading       – small bounded walk in [0, cap]
///   6. Electrical    – voltage/current anchored by irradiance, zero in
///                      the dark; power = voltage × current
///   7. Efficiency    – base minus thermal/dust/shading losses
///   8. Rounding      – every field to 2 decimals before storage
/// ============================================================
use chrono::{DateTime, Timelike, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use crate::config::GeneratorProfile;
use crate::models::panel::Panel;
use crate::models::reading::SensorReading;
use crate::models::weather::WeatherSample;

// ─── Day curve shape ──────────────────────────────────────────
const CURVE_PEAK_W_M2: f64 = 1000.0;
const CURVE_FALLOFF_PER_HOUR: f64 = 80.0;
const CURVE_NOISE_W_M2: f64 = 100.0;
const DAYLIGHT_START_H: f64 = 6.0;
const DAYLIGHT_END_H: f64 = 18.0;

/// How irradiance and temperature relate to history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStrategy {
    /// Chase the target from the previous reading with clamped steps.
    /// Used by the scheduled tick path.
    BoundedWalk,
    /// Recompute irradiance/temperature from scratch each call (day curve
    /// plus weather overlay). Used for backfill. Dust, shading and the
    /// electrical chain still evolve from the previous reading.
    OneShot,
}

/// Produce one reading for `panel` at `at`.
///
/// * `previous` – the panel's most recent stored reading, if any
/// * `weather`  – a pre-validated adapter sample; `None` falls back to the
///                synthetic day curve
/// * `step`     – per-run invocation counter; same (panel, step) pair always
///                yields the same reading
pub fn generate(
    panel: &Panel,
    previous: Option<&SensorReading>,
    weather: Option<WeatherSample>,
    at: DateTime<Utc>,
    step: u64,
    strategy: GenerationStrategy,
    profile: &GeneratorProfile,
) -> SensorReading {
    let mut rng = StdRng::seed_from_u64(stream_seed(panel.id, step));

    // ── 2. Irradiance / temperature targets ────────────────────
    let target_irradiance = match weather {
        Some(w) => w.irradiance,
        None => synthetic_irradiance(at, &mut rng, profile),
    };
    let target_temperature = match weather {
        Some(w) => w.temperature,
        None => synthetic_temperature(at, &mut rng, profile),
    };

    // ── 3. Resolve the pair per strategy ───────────────────────
    let (irradiance, temperature) = match (strategy, previous) {
        (GenerationStrategy::BoundedWalk, Some(prev)) => {
            let max_delta = (prev.irradiance.abs() * profile.irradiance_max_frac_delta)
                .max(profile.irradiance_delta_floor);
            let irr = bounded_step(
                prev.irradiance,
                target_irradiance,
                max_delta,
                profile.irradiance_step_noise,
                &mut rng,
            )
            .clamp(0.0, profile.irradiance_cap);
            let temp = bounded_step(
                prev.temperature,
                target_temperature,
                profile.temperature_max_delta,
                profile.temperature_step_noise,
                &mut rng,
            )
            .clamp(profile.temperature_min, profile.temperature_max);
            (irr, temp)
        }
        (GenerationStrategy::BoundedWalk, None) => {
            // Brand-new panel on the live path: seed from weather or the
            // documented defaults rather than inventing history.
            match weather {
                Some(w) => (w.irradiance.clamp(0.0, profile.irradiance_cap), w.temperature),
                None => (profile.default_irradiance, profile.default_temperature),
            }
        }
        (GenerationStrategy::OneShot, _) => (
            target_irradiance.clamp(0.0, profile.irradiance_cap),
            (target_temperature + rng.gen_range(-profile.temperature_step_noise..=profile.temperature_step_noise))
                .clamp(profile.temperature_min, profile.temperature_max),
        ),
    };
    let irradiance = round2(irradiance);
    let temperature = round2(temperature);

    // ── 4. Dust accumulation / cleaning resets ─────────────────
    let dust = match previous {
        Some(prev) => {
            if rng.gen_bool(profile.cleaning_probability) {
                rng.gen_range(profile.cleaning_reset_min..=profile.cleaning_reset_max)
            } else {
                (prev.dust + rng.gen_range(profile.dust_step_min..=profile.dust_step_max))
                    .min(profile.dust_cap)
            }
        }
        None => rng.gen_range(profile.initial_dust_min..=profile.initial_dust_max),
    };
    let dust = round2(dust);

    // ── 5. Shading walk ─────────────────────────────────────────
    let shading = match previous {
        Some(prev) => (prev.shading
            + rng.gen_range(-profile.shading_max_delta..=profile.shading_max_delta))
        .clamp(0.0, profile.shading_cap),
        None => profile.default_shading,
    };
    let shading = round2(shading);

    // ── 6. Electrical chain ─────────────────────────────────────
    let (voltage, current) = if irradiance <= 0.0 {
        (0.0, 0.0)
    } else {
        let current_target = irradiance / profile.current_divisor;
        match (strategy, previous) {
            (_, None) => (profile.default_voltage, profile.default_current),
            (GenerationStrategy::BoundedWalk, Some(prev)) => {
                let v = bounded_step(
                    prev.voltage,
                    profile.voltage_anchor,
                    profile.voltage_max_delta,
                    profile.voltage_step_noise,
                    &mut rng,
                )
                .clamp(profile.voltage_min, profile.voltage_max);
                let c = bounded_step(
                    prev.current,
                    current_target,
                    profile.current_max_delta,
                    profile.current_step_noise,
                    &mut rng,
                )
                .max(0.0);
                (v, c)
            }
            (GenerationStrategy::OneShot, Some(_)) => {
                let v = rng.gen_range(profile.voltage_min..=profile.voltage_max);
                let c = (current_target + rng.gen_range(-1.0..=3.0)).max(0.0);
                (v, c)
            }
        }
    };
    let voltage = round2(voltage);
    let current = round2(current);
    let power = round2(voltage * current);

    // ── 7. Efficiency from losses ───────────────────────────────
    let temp_loss =
        (temperature - profile.temp_loss_threshold).max(0.0) * profile.temp_loss_per_degree;
    let dust_loss = dust * profile.dust_loss_per_unit;
    let shading_loss = shading * profile.shading_loss_per_unit;
    let efficiency = round2(
        (profile.base_efficiency - (temp_loss + dust_loss + shading_loss) / profile.loss_divisor)
            .max(0.0),
    );

    SensorReading {
        id: Uuid::new_v4(),
        panel_id: panel.id,
        timestamp: at,
        temperature,
        voltage,
        current,
        power,
        efficiency,
        irradiance,
        dust,
        tilt: panel.tilt,
        shading,
    }
}

/// Stable seed for one (panel, step) pair. Mixing the id halves with the
/// step keeps concurrent panels on disjoint streams while successive steps
/// for one panel stay reproducible within a run.
fn stream_seed(panel_id: Uuid, step: u64) -> u64 {
    let (hi, lo) = panel_id.as_u64_pair();
    hi.wrapping_mul(6364136223846793005)
        ^ lo.rotate_left(31)
        ^ step.wrapping_mul(1442695040888963407)
}

/// One clamped move toward `target` plus uniform noise. The clamp bounds the
/// target-chasing part; the noise rides on top, so callers asserting the walk
/// property allow `max_delta + noise`.
fn bounded_step(prev: f64, target: f64, max_delta: f64, noise: f64, rng: &mut StdRng) -> f64 {
    prev + (target - prev).clamp(-max_delta, max_delta) + rng.gen_range(-noise..=noise)
}

// ─── Synthetic fallback targets ───────────────────────────────

fn fractional_hour(at: DateTime<Utc>) -> f64 {
    at.hour() as f64 + at.minute() as f64 / 60.0 + at.second() as f64 / 3600.0
}

/// Triangular day curve: zero outside 06:00–18:00, peak at noon, plus
/// bounded noise during daylight.
fn synthetic_irradiance(at: DateTime<Utc>, rng: &mut StdRng, profile: &GeneratorProfile) -> f64 {
    let hour = fractional_hour(at);
    if !(DAYLIGHT_START_H..=DAYLIGHT_END_H).contains(&hour) {
        return 0.0;
    }
    let base = (CURVE_PEAK_W_M2 - (hour - 12.0).abs() * CURVE_FALLOFF_PER_HOUR).max(0.0);
    (base + rng.gen_range(-CURVE_NOISE_W_M2..=CURVE_NOISE_W_M2)).clamp(0.0, profile.irradiance_cap)
}

/// Cell temperature shadowing the day curve: the default baseline at night,
/// up to ~15 °C hotter at full sun.
fn synthetic_temperature(at: DateTime<Utc>, rng: &mut StdRng, profile: &GeneratorProfile) -> f64 {
    let hour = fractional_hour(at);
    let curve = if (DAYLIGHT_START_H..=DAYLIGHT_END_H).contains(&hour) {
        (CURVE_PEAK_W_M2 - (hour - 12.0).abs() * CURVE_FALLOFF_PER_HOUR).max(0.0)
    } else {
        0.0
    };
    let base = profile.default_temperature + curve / CURVE_PEAK_W_M2 * 15.0;
    (base + rng.gen_range(-2.0..=2.0)).clamp(profile.temperature_min, profile.temperature_max)
}

/// Round to 2 decimals, the storage precision for every generated field.
pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn panel_fixture(id_byte: u128) -> Panel {
        Panel {
            id: Uuid::from_u128(id_byte),
            name: format!("Test panel {id_byte}"),
            owner: "tester".to_string(),
            latitude: 45.07,
            longitude: 7.33,
            tilt: 30.0,
            capacity_w: 450.0,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn same_panel_and_step_reproduce_the_same_reading() {
        let profile = GeneratorProfile::live();
        let panel = panel_fixture(7);
        let a = generate(&panel, None, None, noon(), 3, GenerationStrategy::OneShot, &profile);
        let b = generate(&panel, None, None, noon(), 3, GenerationStrategy::OneShot, &profile);

        assert_eq!(a.irradiance, b.irradiance);
        assert_eq!(a.temperature, b.temperature);
        assert_eq!(a.dust, b.dust);
        assert_eq!(a.shading, b.shading);
        assert_eq!(a.voltage, b.voltage);
        assert_eq!(a.current, b.current);
        assert_eq!(a.power, b.power);
        assert_eq!(a.efficiency, b.efficiency);
    }

    #[test]
    fn different_panels_get_independent_streams() {
        let profile = GeneratorProfile::live();
        let a = generate(
            &panel_fixture(1),
            None,
            None,
            noon(),
            0,
            GenerationStrategy::OneShot,
            &profile,
        );
        let b = generate(
            &panel_fixture(2),
            None,
            None,
            noon(),
            0,
            GenerationStrategy::OneShot,
            &profile,
        );
        assert!(
            a.irradiance != b.irradiance || a.dust != b.dust || a.shading != b.shading,
            "two panels at the same step must not mirror each other"
        );
    }

    #[test]
    fn bounded_walk_respects_the_irradiance_delta() {
        let profile = GeneratorProfile::live();
        let panel = panel_fixture(9);
        let mut prev = generate(&panel, None, None, noon(), 0, GenerationStrategy::BoundedWalk, &profile);

        for step in 1..200 {
            let at = noon() + chrono::Duration::minutes(15 * step as i64);
            let next = generate(
                &panel,
                Some(&prev),
                None,
                at,
                step,
                GenerationStrategy::BoundedWalk,
                &profile,
            );
            let max_delta = (prev.irradiance * profile.irradiance_max_frac_delta)
                .max(profile.irradiance_delta_floor)
                + profile.irradiance_step_noise;
            let jump = (next.irradiance - prev.irradiance).abs();
            assert!(
                jump <= max_delta + 0.01,
                "step {step}: irradiance jumped {jump:.2}, bound was {max_delta:.2}"
            );
            assert!(next.irradiance >= 0.0 && next.irradiance <= profile.irradiance_cap);
            assert!(
                (next.temperature - prev.temperature).abs()
                    <= profile.temperature_max_delta + profile.temperature_step_noise + 0.01
            );
            prev = next;
        }
    }

    #[test]
    fn dust_is_monotonic_outside_cleaning_resets() {
        let profile = GeneratorProfile::live();
        let panel = panel_fixture(21);
        let mut prev = generate(&panel, None, None, noon(), 0, GenerationStrategy::BoundedWalk, &profile);
        let mut resets = 0;

        for step in 1..500 {
            let at = noon() + chrono::Duration::minutes(15 * step as i64);
            let next = generate(
                &panel,
                Some(&prev),
                None,
                at,
                step,
                GenerationStrategy::BoundedWalk,
                &profile,
            );
            let gained = next.dust - prev.dust;
            let accumulated = next.dust == profile.dust_cap
                || (gained >= profile.dust_step_min - 0.02
                    && gained <= profile.dust_step_max + 0.02);
            if accumulated {
                assert!(next.dust >= prev.dust || next.dust == profile.dust_cap);
            } else {
                // anything outside the accumulation band is a cleaning reset,
                // including the rare reset that lands above a fresh low level
                resets += 1;
                assert!(
                    next.dust >= profile.cleaning_reset_min - 0.01
                        && next.dust <= profile.cleaning_reset_max + 0.01,
                    "step {step}: reset landed at {} outside the cleaning band",
                    next.dust
                );
            }
            assert!(next.dust <= profile.dust_cap);
            prev = next;
        }
        // 500 steps at 3% — statistically certain to see a few, and the seed
        // is fixed so this is deterministic
        assert!(resets > 0, "expected at least one cleaning reset in 500 steps");
    }

    #[test]
    fn power_is_the_rounded_product_and_efficiency_stays_in_range() {
        let profile = GeneratorProfile::live();
        let panel = panel_fixture(4);
        let mut prev: Option<SensorReading> = None;

        for step in 0..300 {
            let at = noon() + chrono::Duration::minutes(15 * step as i64);
            let r = generate(
                &panel,
                prev.as_ref(),
                None,
                at,
                step,
                GenerationStrategy::BoundedWalk,
                &profile,
            );
            assert_eq!(
                r.power,
                round2(r.voltage * r.current),
                "step {step}: power must be the rounded product of the stored values"
            );
            assert!(
                r.efficiency >= 0.0 && r.efficiency <= profile.base_efficiency,
                "step {step}: efficiency {} escaped [0, {}]",
                r.efficiency,
                profile.base_efficiency
            );
            prev = Some(r);
        }
    }

    #[test]
    fn night_readings_are_electrically_dead() {
        let profile = GeneratorProfile::live();
        let panel = panel_fixture(11);
        let at = Utc.with_ymd_and_hms(2024, 6, 15, 23, 0, 0).unwrap();
        let prev = generate(&panel, None, None, noon(), 0, GenerationStrategy::OneShot, &profile);
        let r = generate(
            &panel,
            Some(&prev),
            None,
            at,
            1,
            GenerationStrategy::OneShot,
            &profile,
        );
        assert_eq!(r.irradiance, 0.0);
        assert_eq!(r.voltage, 0.0);
        assert_eq!(r.current, 0.0);
        assert_eq!(r.power, 0.0);
    }

    #[test]
    fn first_live_reading_seeds_from_the_documented_defaults() {
        let profile = GeneratorProfile::live();
        let panel = panel_fixture(30);
        let r = generate(&panel, None, None, noon(), 0, GenerationStrategy::BoundedWalk, &profile);

        assert_eq!(r.irradiance, profile.default_irradiance);
        assert_eq!(r.temperature, profile.default_temperature);
        assert_eq!(r.shading, profile.default_shading);
        assert_eq!(r.voltage, profile.default_voltage);
        assert_eq!(r.current, profile.default_current);
        assert_eq!(r.power, round2(profile.default_voltage * profile.default_current));
        assert!(r.dust >= profile.initial_dust_min && r.dust <= profile.initial_dust_max);
    }

    #[test]
    fn weather_sample_steers_the_walk() {
        let profile = GeneratorProfile::live();
        let panel = panel_fixture(14);
        let prev = generate(&panel, None, None, noon(), 0, GenerationStrategy::BoundedWalk, &profile);
        let sample = WeatherSample { irradiance: 1500.0, temperature: 42.0 };
        let next = generate(
            &panel,
            Some(&prev),
            Some(sample),
            noon() + chrono::Duration::minutes(15),
            1,
            GenerationStrategy::BoundedWalk,
            &profile,
        );
        assert!(
            next.irradiance > prev.irradiance,
            "walk should move toward a much sunnier weather target"
        );
        assert!(
            next.temperature > prev.temperature,
            "walk should move toward the hotter weather target"
        );
    }

    #[test]
    fn one_shot_noon_tracks_the_day_curve() {
        let profile = GeneratorProfile::live();
        let panel = panel_fixture(17);
        let r = generate(&panel, None, None, noon(), 0, GenerationStrategy::OneShot, &profile);
        assert!(
            (800.0..=1100.0).contains(&r.irradiance),
            "noon one-shot irradiance {} should sit near the 1000 W/m² peak",
            r.irradiance
        );
    }

    #[test]
    fn backfill_profile_keeps_its_own_loss_constants() {
        let live = GeneratorProfile::live();
        let backfill = GeneratorProfile::backfill();
        assert_eq!(live.dust_loss_per_unit, 0.1);
        assert_eq!(backfill.dust_loss_per_unit, 0.08);
        assert_eq!(live.loss_divisor, 10.0);
        assert_eq!(backfill.loss_divisor, 8.0);
        assert_eq!(live.base_efficiency, backfill.base_efficiency);
    }
}
