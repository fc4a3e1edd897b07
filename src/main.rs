//! Orbital propagation service
//!
//! Serves a JSON API over an in-memory satellite catalog: TLE sets are
//! loaded once and propagated with SGP4 on request.

mod config;
mod metrics;
mod service;

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{routing::get, Router};
use orbital_toolkit::{Catalog, PropagationEngine};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::ServiceConfig;
use crate::metrics::MetricsState;

/// Application state shared across handlers
pub struct AppState {
    pub start_time: Instant,
    pub metrics: MetricsState,
    pub engine: PropagationEngine,
    pub max_ephemeris_points: usize,
}

impl AppState {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            start_time: Instant::now(),
            metrics: MetricsState::new(),
            engine: PropagationEngine::new(Arc::new(Catalog::new()), config.earth_model),
            max_ephemeris_points: config.max_ephemeris_points,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = ServiceConfig::from_env()?;

    if config.json_logs {
        tracing_subscriber::registry()
            .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
            .with(fmt::layer())
            .init();
    }

    let state = Arc::new(AppState::new(&config));

    let http_addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let metrics_addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));

    info!("Starting Orbital Service v{}", env!("CARGO_PKG_VERSION"));
    info!(earth_model = %config.earth_model, "Propagation engine ready");
    info!("API server listening on {}", http_addr);
    info!("Metrics server listening on {}", metrics_addr);

    let metrics_app = Router::new()
        .route("/metrics", get(metrics::metrics_handler))
        .route("/health", get(metrics::health_handler))
        .with_state(Arc::clone(&state));
    let metrics_listener = tokio::net::TcpListener::bind(metrics_addr).await?;
    let metrics_server = axum::serve(metrics_listener, metrics_app).into_future();

    let api_listener = tokio::net::TcpListener::bind(http_addr).await?;
    let api_server = axum::serve(api_listener, service::router(state)).into_future();

    // Run both servers concurrently
    tokio::select! {
        result = api_server => {
            if let Err(e) = result {
                tracing::error!("API server error: {}", e);
            }
        }
        result = metrics_server => {
            if let Err(e) = result {
                tracing::error!("Metrics server error: {}", e);
            }
            tracing::error!("Metrics server stopped unexpectedly");
        }
    }

    Ok(())
}
