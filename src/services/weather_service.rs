use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use reqwest::Client;
use tracing::{debug, warn};

use crate::config::WeatherConfig;
use crate::models::weather::{CurrentWeatherResponse, WeatherSample};

// ─── Validation bounds ────────────────────────────────────────
const IRRADIANCE_VALID_MAX: f64 = 2000.0;
const TEMPERATURE_VALID_MIN: f64 = -50.0;
const TEMPERATURE_VALID_MAX: f64 = 80.0;

fn is_sentinel(v: f64) -> bool {
    v == -999.0 || v == -1000.0
}

/// Cache key: coordinate rounded to two decimals, the granularity at which
/// one weather sample is shared between panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordKey {
    lat_centi: i32,
    lon_centi: i32,
}

impl CoordKey {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat_centi: (lat * 100.0).round() as i32,
            lon_centi: (lon * 100.0).round() as i32,
        }
    }
}

/// Cache capability injected into the adapter, so callers can swap in a test
/// double instead of relying on a module-level singleton.
pub trait WeatherCache: Send + Sync {
    fn get(&self, key: &CoordKey) -> Option<WeatherSample>;
    fn set(&self, key: CoordKey, sample: WeatherSample);
}

/// In-memory TTL cache. Entries carry their insertion instant; one older
/// than the TTL reads as a miss and gets overwritten by the next successful
/// fetch. A poisoned lock degrades to a miss, which is harmless here.
pub struct MemoryWeatherCache {
    ttl: Duration,
    entries: RwLock<HashMap<CoordKey, (WeatherSample, Instant)>>,
}

impl MemoryWeatherCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl WeatherCache for MemoryWeatherCache {
    fn get(&self, key: &CoordKey) -> Option<WeatherSample> {
        let map = self.entries.read().ok()?;
        map.get(key)
            .filter(|(_, at)| at.elapsed() < self.ttl)
            .map(|(sample, _)| *sample)
    }

    fn set(&self, key: CoordKey, sample: WeatherSample) {
        if let Ok(mut map) = self.entries.write() {
            map.insert(key, (sample, Instant::now()));
        }
    }
}

/// Open-Meteo adapter. Failure is a first-class outcome: every error path
/// (timeout, transport, malformed payload, sentinel values) logs at `warn`
/// and returns `None`, leaving the caller on its synthetic fallback.
#[derive(Clone)]
pub struct WeatherService {
    client: Client,
    base_url: String,
    cache: Arc<dyn WeatherCache>,
}

impl WeatherService {
    pub fn new(
        config: &WeatherConfig,
        cache: Arc<dyn WeatherCache>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            cache,
        })
    }

    pub fn with_memory_cache(config: &WeatherConfig) -> Result<Self, reqwest::Error> {
        let cache = MemoryWeatherCache::new(Duration::from_secs(config.cache_ttl_secs));
        Self::new(config, Arc::new(cache))
    }

    /// Current irradiance/temperature for a coordinate, cache first.
    pub async fn fetch(&self, lat: f64, lon: f64) -> Option<WeatherSample> {
        let key = CoordKey::new(lat, lon);
        if let Some(hit) = self.cache.get(&key) {
            return Some(hit);
        }

        let url = format!(
            "{}?latitude={}&longitude={}&current=shortwave_radiation,temperature_2m",
            self.base_url, lat, lon
        );

        match self.client.get(&url).send().await {
            Ok(response) => match response.json::<CurrentWeatherResponse>().await {
                Ok(resp) => {
                    debug!(time = %resp.current.time, lat, lon, "weather sample fetched");
                    match validate(resp.current.shortwave_radiation, resp.current.temperature_2m) {
                        Some(sample) => {
                            self.cache.set(key, sample);
                            Some(sample)
                        }
                        None => {
                            warn!(lat, lon, "weather payload failed range validation");
                            None
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to parse weather payload");
                    None
                }
            },
            Err(e) => {
                warn!(error = %e, "weather fetch failed");
                None
            }
        }
    }
}

/// Range and sentinel validation. Both fields must be present and physically
/// plausible before a sample may steer generation.
fn validate(irradiance: Option<f64>, temperature: Option<f64>) -> Option<WeatherSample> {
    let irradiance = irradiance?;
    let temperature = temperature?;
    if is_sentinel(irradiance) || is_sentinel(temperature) {
        return None;
    }
    if !(0.0..=IRRADIANCE_VALID_MAX).contains(&irradiance) {
        return None;
    }
    if !(TEMPERATURE_VALID_MIN..=TEMPERATURE_VALID_MAX).contains(&temperature) {
        return None;
    }
    Some(WeatherSample {
        irradiance,
        temperature,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_accepts_plausible_samples() {
        let sample = validate(Some(850.0), Some(31.5)).unwrap();
        assert_eq!(sample.irradiance, 850.0);
        assert_eq!(sample.temperature, 31.5);
    }

    #[test]
    fn validation_rejects_sentinels_and_out_of_range_values() {
        assert!(validate(Some(-999.0), Some(20.0)).is_none());
        assert!(validate(Some(500.0), Some(-1000.0)).is_none());
        assert!(validate(Some(2500.0), Some(20.0)).is_none());
        assert!(validate(Some(-5.0), Some(20.0)).is_none());
        assert!(validate(Some(500.0), Some(95.0)).is_none());
        assert!(validate(Some(500.0), Some(-60.0)).is_none());
        assert!(validate(None, Some(20.0)).is_none());
        assert!(validate(Some(500.0), None).is_none());
    }

    #[test]
    fn coord_keys_round_to_two_decimals() {
        assert_eq!(CoordKey::new(45.071, 7.3349), CoordKey::new(45.0699, 7.334));
        assert_ne!(CoordKey::new(45.07, 7.33), CoordKey::new(45.08, 7.33));
    }

    #[test]
    fn cache_entries_expire_after_the_ttl() {
        let sample = WeatherSample { irradiance: 700.0, temperature: 28.0 };
        let key = CoordKey::new(45.07, 7.33);

        let fresh = MemoryWeatherCache::new(Duration::from_secs(60));
        fresh.set(key, sample);
        assert_eq!(fresh.get(&key), Some(sample));

        let expired = MemoryWeatherCache::new(Duration::ZERO);
        expired.set(key, sample);
        assert_eq!(expired.get(&key), None);
    }

    #[tokio::test]
    async fn cache_hit_short_circuits_the_network() {
        // unreachable base URL: a hit must come back without any fetch attempt
        let config = WeatherConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 1,
            cache_ttl_secs: 60,
        };
        let service = WeatherService::with_memory_cache(&config).unwrap();
        let sample = WeatherSample { irradiance: 640.0, temperature: 26.0 };
        service.cache.set(CoordKey::new(45.07, 7.33), sample);

        assert_eq!(service.fetch(45.07, 7.33).await, Some(sample));
    }

    #[tokio::test]
    async fn transport_failure_reads_as_a_miss() {
        let config = WeatherConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 1,
            cache_ttl_secs: 60,
        };
        let service = WeatherService::with_memory_cache(&config).unwrap();
        assert_eq!(service.fetch(45.07, 7.33).await, None);
    }
}
