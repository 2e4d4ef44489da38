//! Health and Metrics Routes
//!
//! - `GET /health`: JSON status, uptime, stream state and cache sizes
//! - `GET /healthz`: liveness
//! - `GET /readyz`: readiness, failing once shutdown starts
//! - `GET /metrics`: Prometheus text format

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::AppState;
use crate::infrastructure::metrics::get_metrics_handle;
use crate::infrastructure::stream::{StreamState, StreamStatusSnapshot};

/// Overall health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Proxies serving and the price stream connected.
    Healthy,
    /// Proxies serving without a live price stream.
    Degraded,
}

impl HealthStatus {
    /// Status implied by the price stream state.
    #[must_use]
    pub const fn from_stream(state: StreamState) -> Self {
        match state {
            StreamState::Connected => Self::Healthy,
            _ => Self::Degraded,
        }
    }
}

/// Cached fingerprints per endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheSizes {
    /// `/crypto` entries.
    pub live_prices: usize,
    /// `/crypto/historical` entries.
    pub historical_prices: usize,
    /// `/news` entries.
    pub news: usize,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: HealthStatus,
    /// Service version.
    pub version: String,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
    /// Current time.
    pub current_time: DateTime<Utc>,
    /// Price stream status.
    pub stream: StreamStatusSnapshot,
    /// Cache sizes.
    pub caches: CacheSizes,
}

fn build_health_response(state: &AppState) -> HealthResponse {
    let stream = state.stream.snapshot();
    HealthResponse {
        status: HealthStatus::from_stream(stream.state),
        version: state.version.clone(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        current_time: Utc::now(),
        stream,
        caches: CacheSizes {
            live_prices: state.proxies.prices.cache().len(),
            historical_prices: state.proxies.historical.cache().len(),
            news: state.proxies.news.cache().len(),
        },
    }
}

pub(super) async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, Json(build_health_response(&state)))
}

pub(super) async fn liveness() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Ready until shutdown begins.
pub(super) async fn readiness(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.shutdown.is_cancelled() {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    } else {
        (StatusCode::OK, "READY")
    }
}

pub(super) async fn metrics() -> impl IntoResponse {
    get_metrics_handle().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [("content-type", "text/plain")],
                "Metrics not initialized".to_string(),
            )
        },
        |handle| {
            (
                StatusCode::OK,
                [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
                handle.render(),
            )
        },
    )
}
