use serde::Deserialize;

// ─── Open-Meteo wire types ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CurrentWeatherResponse {
    pub current: CurrentData,
}

#[derive(Debug, Deserialize)]
pub struct CurrentData {
    pub time: String,
    pub shortwave_radiation: Option<f64>,
    pub temperature_2m: Option<f64>,
}

// ─── Validated sample ────────────────────────────────────────────────────────

/// Weather values that passed range/sentinel validation, ready to steer the
/// signal generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherSample {
    /// Shortwave radiation (W/m²)
    pub irradiance: f64,
    /// Air temperature (°C)
    pub temperature: f64,
}
