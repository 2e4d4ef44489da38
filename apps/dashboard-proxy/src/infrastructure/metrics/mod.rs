//! Prometheus Metrics Module
//!
//! Exposes application metrics via Prometheus format for monitoring.
//!
//! # Metrics Categories
//!
//! - **Cache**: Lookups per endpoint by outcome, entries per endpoint
//! - **Upstream**: Requests per provider by outcome, request latency
//! - **Stream**: Frames received, reconnects, connection state
//! - **Alerts**: Price alerts raised per asset
//!
//! # Integration
//!
//! Metrics are rendered at `/metrics` on the HTTP server.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Later calls return the same handle.
///
/// # Errors
///
/// Returns an error if another global recorder is already installed.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }
    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();
    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "dashboard_proxy_cache_lookups_total",
        "Proxy cache lookups by endpoint and outcome"
    );
    describe_gauge!(
        "dashboard_proxy_cache_entries",
        "Fingerprints held in each endpoint cache"
    );

    describe_counter!(
        "dashboard_proxy_upstream_requests_total",
        "Upstream API requests by provider and outcome"
    );
    describe_histogram!(
        "dashboard_proxy_upstream_request_seconds",
        "Upstream API request latency"
    );

    describe_counter!(
        "dashboard_proxy_stream_frames_total",
        "Price stream frames received"
    );
    describe_counter!(
        "dashboard_proxy_stream_reconnects_total",
        "Price stream reconnection attempts"
    );
    describe_gauge!(
        "dashboard_proxy_stream_connected",
        "1 while the price stream is connected"
    );

    describe_counter!(
        "dashboard_proxy_price_alerts_total",
        "Price alerts raised by asset"
    );
}

// =============================================================================
// Labels
// =============================================================================

/// Proxied endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `/crypto`.
    LivePrices,
    /// `/crypto/historical`.
    HistoricalPrices,
    /// `/news`.
    News,
    /// `/weather/forecast`.
    WeatherForecast,
}

impl Endpoint {
    /// Label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LivePrices => "live_prices",
            Self::HistoricalPrices => "historical_prices",
            Self::News => "news",
            Self::WeatherForecast => "weather_forecast",
        }
    }
}

/// Upstream data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// CoinGecko market data.
    CoinGecko,
    /// NewsData.io headlines.
    NewsData,
    /// Open-Meteo geocoding and forecast.
    OpenMeteo,
}

impl Provider {
    /// Label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CoinGecko => "coingecko",
            Self::NewsData => "newsdata",
            Self::OpenMeteo => "open_meteo",
        }
    }
}

/// Result of an upstream request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamOutcome {
    /// 2xx with a decodable body.
    Success,
    /// HTTP 429.
    RateLimited,
    /// Any other failure.
    Error,
}

impl UpstreamOutcome {
    /// Label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::RateLimited => "rate_limited",
            Self::Error => "error",
        }
    }
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Record a cache lookup and its outcome label.
pub fn record_cache_lookup(endpoint: Endpoint, outcome: &'static str) {
    counter!(
        "dashboard_proxy_cache_lookups_total",
        "endpoint" => endpoint.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Update the entry count of an endpoint cache.
#[allow(clippy::cast_precision_loss)]
pub fn set_cache_entries(endpoint: Endpoint, entries: usize) {
    gauge!(
        "dashboard_proxy_cache_entries",
        "endpoint" => endpoint.as_str()
    )
    .set(entries as f64);
}

/// Record an upstream request.
pub fn record_upstream_request(provider: Provider, outcome: UpstreamOutcome, elapsed: Duration) {
    counter!(
        "dashboard_proxy_upstream_requests_total",
        "provider" => provider.as_str(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
    histogram!(
        "dashboard_proxy_upstream_request_seconds",
        "provider" => provider.as_str()
    )
    .record(elapsed.as_secs_f64());
}

/// Record a price stream frame.
pub fn record_stream_frame() {
    counter!("dashboard_proxy_stream_frames_total").increment(1);
}

/// Record a price stream reconnection attempt.
pub fn record_stream_reconnect() {
    counter!("dashboard_proxy_stream_reconnects_total").increment(1);
}

/// Update the price stream connection gauge.
pub fn set_stream_connected(connected: bool) {
    gauge!("dashboard_proxy_stream_connected").set(if connected { 1.0 } else { 0.0 });
}

/// Record a price alert.
pub fn record_price_alert(asset_id: &str) {
    counter!(
        "dashboard_proxy_price_alerts_total",
        "asset" => asset_id.to_string()
    )
    .increment(1);
}

// =============================================================================
// Tests
// =============================================================================
