mod routes;
mod controllers;
mod services;
mod models;
mod api_docs;
mod shared_state;
mod store;
mod errors;
mod config;

use std::net::SocketAddr;

use axum::{response::Html, routing::get, Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use utoipa::OpenApi;
use utoipa_scalar::Scalar;

use crate::api_docs::ApiDoc;
use crate::config::Config;
use crate::routes::api_routes::api_routes;
use crate::services::ingestion_service;
use crate::shared_state::{AppState, SharedState};

#[tokio::main]
async fn main() {
    // 1. Logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "solar_fleet_monitor=info,tower_http=info".into()),
        )
        .init();

    // 2. Load configuration
    let config_path =
        std::env::var("FLEET_CONFIG").unwrap_or_else(|_| "config.json".to_string());
    let config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            error!(path = %config_path, error = %e, "failed to load configuration");
            return;
        }
    };
    info!(panels = config.panels.len(), "configuration loaded");

    // 3. Initialize shared state and register the fleet
    let state = match AppState::new(&config) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to initialize shared state");
            return;
        }
    };
    if let Err(e) = state.seed_panels(&config, chrono::Utc::now()) {
        error!(error = %e, "failed to register the configured fleet");
        return;
    }

    // 4. Backfill history so trend analyses work from the first boot
    if let Err(e) = ingestion_service::backfill(&state, &config).await {
        error!(error = %e, "backfill failed, starting with whatever history exists");
    }

    // 5. Background tasks: generation ticks and maintenance sweeps
    tokio::spawn(ingestion_service::run_scheduled(
        state.clone(),
        config.clone(),
    ));
    tokio::spawn(ingestion_service::run_sweeps(state.clone(), config.clone()));

    // 6. Start Axum HTTP server
    let server_port = config.server.port;
    let shared = SharedState {
        app: state,
        config,
    };
    let app = Router::new()
        .nest("/api", api_routes(shared))
        .route("/scalar", get(|| async {
            Html(Scalar::new(ApiDoc::openapi()).to_html())
        }))
        .route("/api-docs/openapi.json", get(|| async {
            Json(ApiDoc::openapi())
        }))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], server_port));
    info!("API server listening on http://{}", addr);
    info!("Scalar UI: http://{}/scalar", addr);

    axum_server::bind(addr)
        .serve(app.into_make_service())
        .await
        .unwrap();
}
