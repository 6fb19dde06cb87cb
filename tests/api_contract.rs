//! Black-box contract checks against a running instance.
//!
//! Point BASE_URL at a live server (default http://localhost:3000) and run
//! `cargo test --test api_contract`. When nothing is listening the tests
//! skip rather than fail, so a plain `cargo test` stays green.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct HealthStatus {
    status: String,
    panels: usize,
    readings: usize,
    offline_mode: bool,
}

#[derive(Debug, Deserialize)]
struct Panel {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SensorReading {
    panel_id: String,
    timestamp: DateTime<Utc>,
    voltage: f64,
    current: f64,
    power: f64,
    efficiency: f64,
    dust: f64,
    shading: f64,
}

fn base_url() -> String {
    std::env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:3000".into())
}

/// None when no server is reachable; tests skip in that case.
async fn probe(client: &Client) -> Option<()> {
    let url = format!("{}/api/health", base_url());
    match client.get(&url).send().await {
        Ok(resp) if resp.status().is_success() => Some(()),
        _ => {
            eprintln!("skipping: no server reachable at {}", base_url());
            None
        }
    }
}

#[tokio::test]
async fn health_reports_fleet_shape() {
    let client = Client::new();
    if probe(&client).await.is_none() {
        return;
    }

    let health: HealthStatus = client
        .get(format!("{}/api/health", base_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(health.status, "ok");
    assert!(health.panels > 0, "fleet should be seeded from config");
    assert!(
        health.readings >= health.panels,
        "backfill plus the first tick leave every panel with history"
    );
    let _ = health.offline_mode;
}

#[tokio::test]
async fn stored_readings_satisfy_the_generator_invariants() {
    let client = Client::new();
    if probe(&client).await.is_none() {
        return;
    }

    let readings: Vec<SensorReading> = client
        .get(format!("{}/api/sensors?limit=50", base_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!readings.is_empty(), "no readings returned");

    for r in &readings {
        assert!(!r.panel_id.is_empty());
        assert!(r.timestamp <= Utc::now());

        // power is derived, never stored independently
        let expected = (r.voltage * r.current * 100.0).round() / 100.0;
        assert!(
            (r.power - expected).abs() < 0.01,
            "power {} != voltage {} × current {}",
            r.power,
            r.voltage,
            r.current
        );

        assert!(r.efficiency >= 0.0);
        assert!((0.0..=100.0).contains(&r.dust), "generated dust stays capped");
        assert!(r.shading >= 0.0);
    }
}

#[tokio::test]
async fn timeseries_buckets_come_back_oldest_first() {
    #[derive(Debug, Deserialize)]
    struct Bucket {
        timestamp: DateTime<Utc>,
        count: usize,
    }

    let client = Client::new();
    if probe(&client).await.is_none() {
        return;
    }

    let panels: Vec<Panel> = client
        .get(format!("{}/api/panels", base_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!panels.is_empty());

    let buckets: Vec<Bucket> = client
        .get(format!(
            "{}/api/trends/timeseries/{}?interval=hour&limit=48",
            base_url(),
            panels[0].id
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(!buckets.is_empty(), "backfilled panel should aggregate");
    assert!(buckets.iter().all(|b| b.count > 0));
    assert!(
        buckets.windows(2).all(|w| w[0].timestamp < w[1].timestamp),
        "buckets sorted oldest to newest"
    );
    assert!(buckets.last().unwrap().timestamp <= Utc::now());
}

#[tokio::test]
async fn malformed_panel_id_is_a_client_error() {
    let client = Client::new();
    if probe(&client).await.is_none() {
        return;
    }

    let resp = client
        .get(format!("{}/api/sensors/latest/not-a-uuid", base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("invalid panel id"));
}
