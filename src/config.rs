use serde::Deserialize;
use tracing::warn;

fn default_offline_mode() -> bool {
    false
}

fn default_owner() -> String {
    "fleet-ops".to_string()
}

fn default_tilt() -> f64 {
    30.0
}

fn default_capacity() -> f64 {
    450.0
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub ingestion: IngestionConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub thresholds: AlertThresholds,
    /// When true the weather adapter is never called and generation runs on
    /// the synthetic day curve alone. Also flippable at runtime over the API.
    #[serde(default = "default_offline_mode")]
    pub offline_mode: bool,
    pub panels: Vec<PanelConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct IngestionConfig {
    /// Wall-clock spacing of scheduled generation ticks
    pub interval_minutes: u64,
    /// Spacing of the recurring-maintenance due sweep
    pub sweep_interval_hours: u64,
    /// Days of history to synthesize at startup for panels with no readings
    /// (0 disables backfill)
    pub backfill_days: u32,
    /// Spacing between backfilled samples
    pub backfill_stride_minutes: u32,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 15,
            sweep_interval_hours: 24,
            backfill_days: 7,
            backfill_stride_minutes: 60,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct WeatherConfig {
    pub base_url: String,
    /// Upper bound on one fetch; past it the adapter reports a miss
    pub timeout_secs: u64,
    /// How long a fetched sample stays valid for its coordinate
    pub cache_ttl_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            timeout_secs: 10,
            cache_ttl_secs: 3600,
        }
    }
}

/// Static alert thresholds. Every reading crossing one yields a fresh alert;
/// there is deliberately no deduplication while a condition persists.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct AlertThresholds {
    /// Cell temperature above this raises a warning (°C)
    pub temperature_warning: f64,
    /// Dust index above this raises a warning
    pub dust_warning: f64,
    /// Shading above this raises an info alert (%)
    pub shading_info: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            temperature_warning: 65.0,
            dust_warning: 100.0,
            shading_info: 30.0,
        }
    }
}

/// The two constant sets for the signal generator. Live ticks use `live`;
/// historical backfill uses `backfill`. The two paths carry different loss
/// coefficients and divisors, and they stay independently tunable.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GeneratorConfig {
    pub live: GeneratorProfile,
    pub backfill: GeneratorProfile,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            live: GeneratorProfile::live(),
            backfill: GeneratorProfile::backfill(),
        }
    }
}

/// Every tunable of the signal generator, with units. One instance fully
/// describes a generation profile.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GeneratorProfile {
    /// Nominal panel efficiency before losses (%)
    pub base_efficiency: f64,
    /// Efficiency loss per °C above `temp_loss_threshold` (%/°C)
    pub temp_loss_per_degree: f64,
    /// Cell temperature where thermal derating starts (°C)
    pub temp_loss_threshold: f64,
    /// Efficiency loss per dust index point
    pub dust_loss_per_unit: f64,
    /// Efficiency loss per shading percent
    pub shading_loss_per_unit: f64,
    /// Combined losses are divided by this before subtraction
    pub loss_divisor: f64,

    /// Per-step irradiance change bound, as a fraction of the previous value
    pub irradiance_max_frac_delta: f64,
    /// Absolute floor on the irradiance step bound (W/m²), so a panel parked
    /// at 0 overnight can still ramp at dawn
    pub irradiance_delta_floor: f64,
    /// Uniform noise amplitude on each irradiance step (W/m²)
    pub irradiance_step_noise: f64,
    /// Hard ceiling on generated irradiance (W/m²)
    pub irradiance_cap: f64,

    /// Per-step temperature change bound (°C)
    pub temperature_max_delta: f64,
    /// Uniform noise amplitude on each temperature step (°C)
    pub temperature_step_noise: f64,
    /// Generated temperature clamp (°C)
    pub temperature_min: f64,
    pub temperature_max: f64,

    /// Dust gain per reading, uniform in [min, max]
    pub dust_step_min: f64,
    pub dust_step_max: f64,
    pub dust_cap: f64,
    /// Chance per reading that the panel was just cleaned
    pub cleaning_probability: f64,
    /// Post-cleaning dust level, uniform in [min, max]
    pub cleaning_reset_min: f64,
    pub cleaning_reset_max: f64,

    /// Per-step shading change bound (%)
    pub shading_max_delta: f64,
    pub shading_cap: f64,

    /// Operating voltage anchor and clamp (V)
    pub voltage_anchor: f64,
    pub voltage_min: f64,
    pub voltage_max: f64,
    pub voltage_max_delta: f64,
    pub voltage_step_noise: f64,

    /// Current target is irradiance divided by this
    pub current_divisor: f64,
    pub current_max_delta: f64,
    pub current_step_noise: f64,

    /// First-reading seeds when a panel has no history
    pub default_irradiance: f64,
    pub default_temperature: f64,
    pub initial_dust_min: f64,
    pub initial_dust_max: f64,
    pub default_shading: f64,
    pub default_voltage: f64,
    pub default_current: f64,
}

impl GeneratorProfile {
    /// Constants used by the scheduled (live) tick path.
    pub fn live() -> Self {
        Self {
            base_efficiency: 18.0,
            temp_loss_per_degree: 0.4,
            temp_loss_threshold: 25.0,
            dust_loss_per_unit: 0.1,
            shading_loss_per_unit: 0.5,
            loss_divisor: 10.0,
            irradiance_max_frac_delta: 0.10,
            irradiance_delta_floor: 120.0,
            irradiance_step_noise: 20.0,
            irradiance_cap: 2000.0,
            temperature_max_delta: 2.0,
            temperature_step_noise: 0.5,
            temperature_min: -50.0,
            temperature_max: 80.0,
            dust_step_min: 0.1,
            dust_step_max: 0.5,
            dust_cap: 100.0,
            cleaning_probability: 0.03,
            cleaning_reset_min: 5.0,
            cleaning_reset_max: 15.0,
            shading_max_delta: 3.0,
            shading_cap: 35.0,
            voltage_anchor: 35.0,
            voltage_min: 28.0,
            voltage_max: 45.0,
            voltage_max_delta: 2.0,
            voltage_step_noise: 0.5,
            current_divisor: 25.0,
            current_max_delta: 2.0,
            current_step_noise: 0.5,
            default_irradiance: 500.0,
            default_temperature: 30.0,
            initial_dust_min: 20.0,
            initial_dust_max: 30.0,
            default_shading: 20.0,
            default_voltage: 35.0,
            default_current: 5.0,
        }
    }

    /// Constants used by the one-shot/backfill path. Softer loss coefficients
    /// and a smaller divisor than the live path.
    pub fn backfill() -> Self {
        Self {
            dust_loss_per_unit: 0.08,
            shading_loss_per_unit: 0.3,
            loss_divisor: 8.0,
            ..Self::live()
        }
    }

    /// `cleaning_probability` feeds `Rng::gen_bool`, which only accepts
    /// values in `[0, 1]`. Out-of-range overrides are pulled to the nearest
    /// bound instead of being handed to the generator as-is.
    fn sanitize(&mut self, profile: &str) {
        let p = self.cleaning_probability;
        if !(0.0..=1.0).contains(&p) {
            let clamped = if p > 1.0 { 1.0 } else { 0.0 };
            warn!(profile, value = p, clamped, "cleaning_probability out of range, clamping");
            self.cleaning_probability = clamped;
        }
    }
}

impl Default for GeneratorProfile {
    fn default() -> Self {
        Self::live()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PanelConfig {
    pub name: String,
    #[serde(default = "default_owner")]
    pub owner: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default = "default_tilt")]
    pub tilt: f64,
    #[serde(default = "default_capacity")]
    pub capacity_w: f64,
}

impl Config {
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    fn from_json(raw: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let mut config: Config = serde_json::from_str(raw)?;
        config.generator.live.sanitize("generator.live");
        config.generator.backfill.sanitize("generator.backfill");
        Ok(config)
    }
}
