//! Prometheus metrics for the orbital service

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_histogram_vec, register_int_gauge, Counter,
    CounterVec, Encoder, HistogramVec, IntGauge, TextEncoder,
};
use tracing::error;

use crate::AppState;

lazy_static! {
    /// HTTP requests by route and response status
    pub static ref HTTP_REQUESTS: CounterVec = register_counter_vec!(
        "orbital_http_requests_total",
        "Total number of API requests",
        &["route", "status"]
    ).unwrap();

    /// Wall time of propagation work per route
    pub static ref PROPAGATION_LATENCY: HistogramVec = register_histogram_vec!(
        "orbital_propagation_seconds",
        "Time spent on propagation operations",
        &["route"],
        vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]
    ).unwrap();

    pub static ref EPHEMERIS_POINTS: Counter = register_counter!(
        "orbital_ephemeris_points_total",
        "Total number of ephemeris points generated"
    ).unwrap();

    pub static ref LOADED_SATELLITES: IntGauge = register_int_gauge!(
        "orbital_loaded_satellites",
        "Satellites currently held in the catalog"
    ).unwrap();
}

/// Recording facade used by the API handlers
#[derive(Debug, Default)]
pub struct MetricsState;

impl MetricsState {
    pub fn new() -> Self {
        Self
    }

    pub fn record_request(&self, route: &str, status: StatusCode, duration: Duration) {
        HTTP_REQUESTS
            .with_label_values(&[route, status.as_str()])
            .inc();
        PROPAGATION_LATENCY
            .with_label_values(&[route])
            .observe(duration.as_secs_f64());
    }

    pub fn record_ephemeris(&self, points: usize) {
        EPHEMERIS_POINTS.inc_by(points as f64);
    }

    pub fn set_loaded(&self, count: usize) {
        LOADED_SATELLITES.set(count as i64);
    }
}

/// Handler for /metrics endpoint (Prometheus format)
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain")],
            Vec::new(),
        );
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        buffer,
    )
}

/// Handler for /health endpoint
pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let body = serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.uptime_seconds(),
        "loaded_satellites": state.engine.catalog().count(),
    });

    (StatusCode::OK, axum::Json(body))
}
