use crate::config::AlertThresholds;
use crate::models::alert::{AlertDraft, AlertKind};
use crate::models::reading::SensorReading;

/// Threshold scan over a single reading. Pure and stateless: every reading
/// that crosses a threshold yields a fresh draft, with no memory of prior
/// alerts (at-every-exceedance semantics, not on-transition).
pub fn evaluate(reading: &SensorReading, thresholds: &AlertThresholds) -> Vec<AlertDraft> {
    let mut drafts = Vec::new();

    if reading.temperature > thresholds.temperature_warning {
        drafts.push(AlertDraft {
            kind: AlertKind::Warning,
            message: format!(
                "High panel temperature detected: {}°C",
                reading.temperature
            ),
        });
    }

    if reading.dust > thresholds.dust_warning {
        drafts.push(AlertDraft {
            kind: AlertKind::Warning,
            message: format!("Excessive dust accumulation detected: {}", reading.dust),
        });
    }

    if reading.shading > thresholds.shading_info {
        drafts.push(AlertDraft {
            kind: AlertKind::Info,
            message: format!("Shading above normal: {}%", reading.shading),
        });
    }

    drafts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn reading(temperature: f64, dust: f64, shading: f64) -> SensorReading {
        SensorReading {
            id: Uuid::new_v4(),
            panel_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            temperature,
            voltage: 35.0,
            current: 5.0,
            power: 175.0,
            efficiency: 15.0,
            irradiance: 600.0,
            dust,
            tilt: 30.0,
            shading,
        }
    }

    #[test]
    fn hot_panel_raises_exactly_one_warning() {
        let drafts = evaluate(&reading(70.0, 20.0, 10.0), &AlertThresholds::default());
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].kind, AlertKind::Warning);
        assert_eq!(drafts[0].message, "High panel temperature detected: 70°C");
    }

    #[test]
    fn each_exceeded_threshold_fires_independently() {
        let drafts = evaluate(&reading(70.0, 150.0, 10.0), &AlertThresholds::default());
        assert_eq!(drafts.len(), 2, "temperature and dust both crossed");
        assert!(drafts.iter().all(|d| d.kind == AlertKind::Warning));

        let all = evaluate(&reading(70.0, 150.0, 45.0), &AlertThresholds::default());
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].kind, AlertKind::Info);
        assert_eq!(all[2].message, "Shading above normal: 45%");
    }

    #[test]
    fn nominal_readings_stay_silent() {
        assert!(evaluate(&reading(40.0, 20.0, 10.0), &AlertThresholds::default()).is_empty());
    }

    #[test]
    fn thresholds_are_strict_inequalities() {
        assert!(evaluate(&reading(65.0, 100.0, 30.0), &AlertThresholds::default()).is_empty());
    }
}
