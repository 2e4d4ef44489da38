//! Dashboard Configuration Settings
//!
//! Configuration types for the dashboard proxy, loaded from environment
//! variables. Every variable is optional; unset or unparseable values
//! fall back to the defaults below.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::application::services::{PollerConfig, ProxyPacing};
use crate::domain::market::AlertPolicy;
use crate::infrastructure::stream::{PriceStreamConfig, ReconnectPolicy};

/// Third-party API key. Redacted in `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key.
    #[must_use]
    pub const fn new(key: String) -> Self {
        Self(key)
    }

    /// Get the key.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Port for proxy, health and metrics routes.
    pub http_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { http_port: 3000 }
    }
}

/// Upstream provider settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamSettings {
    /// CoinGecko API base, without trailing slash.
    pub coingecko_base_url: String,
    /// NewsData latest-news endpoint.
    pub newsdata_base_url: String,
    /// NewsData API key.
    pub newsdata_api_key: Option<ApiKey>,
    /// Open-Meteo forecast endpoint.
    pub open_meteo_forecast_url: String,
    /// Open-Meteo geocoding endpoint.
    pub open_meteo_geocoding_url: String,
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            coingecko_base_url: "https://api.coingecko.com/api/v3".to_string(),
            newsdata_base_url: "https://newsdata.io/api/1/news".to_string(),
            newsdata_api_key: None,
            open_meteo_forecast_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            open_meteo_geocoding_url: "https://geocoding-api.open-meteo.com/v1/search"
                .to_string(),
            timeout: None,
        }
    }
}

/// Price stream settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSettings {
    /// Stream endpoint, without query string.
    pub url: String,
    /// Subscribed asset ids.
    pub assets: Vec<String>,
    /// Fixed delay before each reconnect.
    pub reconnect_delay: Duration,
    /// Reconnects attempted before giving up.
    pub max_reconnect_attempts: u32,
}

impl Default for StreamSettings {
    fn default() -> Self {
        let reconnect = ReconnectPolicy::default();
        Self {
            url: "wss://ws.coincap.io/prices".to_string(),
            assets: PollerConfig::default().assets,
            reconnect_delay: reconnect.delay,
            max_reconnect_attempts: reconnect.max_attempts,
        }
    }
}

/// Dashboard store settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSettings {
    /// Time between store refreshes.
    pub poll_interval: Duration,
    /// Cities refreshed on every poll.
    pub cities: Vec<String>,
    /// Favorites file.
    pub favorites_path: PathBuf,
    /// Price move, in percent, that raises an alert.
    pub alert_threshold_pct: Decimal,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        let poller = PollerConfig::default();
        Self {
            poll_interval: poller.interval,
            cities: poller.cities,
            favorites_path: PathBuf::from("./favorites.json"),
            alert_threshold_pct: AlertPolicy::default().threshold_pct,
        }
    }
}

/// Complete dashboard configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardConfig {
    /// HTTP server settings.
    pub server: ServerSettings,
    /// Upstream provider settings.
    pub upstream: UpstreamSettings,
    /// Price stream settings.
    pub stream: StreamSettings,
    /// Dashboard store settings.
    pub dashboard: DashboardSettings,
    /// Delays around upstream calls.
    pub pacing: ProxyPacing,
}

impl DashboardConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a list variable is set but contains no items.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a list variable is set but contains no items.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = EnvReader { lookup: &lookup };
        let defaults = Self::default();

        let server = ServerSettings {
            http_port: env.parse("DASHBOARD_HTTP_PORT", defaults.server.http_port),
        };

        let upstream = UpstreamSettings {
            coingecko_base_url: env.url("COINGECKO_BASE_URL", defaults.upstream.coingecko_base_url),
            newsdata_base_url: env.url("NEWSDATA_BASE_URL", defaults.upstream.newsdata_base_url),
            newsdata_api_key: env.non_empty("NEWSDATA_API_KEY").map(ApiKey::new),
            open_meteo_forecast_url: env.url(
                "OPEN_METEO_FORECAST_URL",
                defaults.upstream.open_meteo_forecast_url,
            ),
            open_meteo_geocoding_url: env.url(
                "OPEN_METEO_GEOCODING_URL",
                defaults.upstream.open_meteo_geocoding_url,
            ),
            timeout: env
                .non_empty("UPSTREAM_TIMEOUT_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        };

        let stream = StreamSettings {
            url: env.url("PRICE_STREAM_URL", defaults.stream.url),
            assets: env.list("PRICE_STREAM_ASSETS", defaults.stream.assets)?,
            reconnect_delay: env.duration_millis(
                "PRICE_STREAM_RECONNECT_DELAY_MS",
                defaults.stream.reconnect_delay,
            ),
            max_reconnect_attempts: env.parse(
                "PRICE_STREAM_MAX_RECONNECT_ATTEMPTS",
                defaults.stream.max_reconnect_attempts,
            ),
        };

        let dashboard = DashboardSettings {
            poll_interval: env.duration_secs(
                "DASHBOARD_POLL_INTERVAL_SECS",
                defaults.dashboard.poll_interval,
            ),
            cities: env.list("DASHBOARD_CITIES", defaults.dashboard.cities)?,
            favorites_path: env
                .non_empty("FAVORITES_PATH")
                .map_or(defaults.dashboard.favorites_path, PathBuf::from),
            alert_threshold_pct: env.parse(
                "PRICE_ALERT_THRESHOLD_PCT",
                defaults.dashboard.alert_threshold_pct,
            ),
        };

        Ok(Self {
            server,
            upstream,
            stream,
            dashboard,
            pacing: defaults.pacing,
        })
    }

    /// Price stream client configuration.
    #[must_use]
    pub fn price_stream(&self) -> PriceStreamConfig {
        PriceStreamConfig {
            url: self.stream.url.clone(),
            assets: self.stream.assets.clone(),
            reconnect: ReconnectPolicy {
                max_attempts: self.stream.max_reconnect_attempts,
                delay: self.stream.reconnect_delay,
            },
        }
    }

    /// Poller configuration.
    #[must_use]
    pub fn poller(&self) -> PollerConfig {
        PollerConfig {
            interval: self.dashboard.poll_interval,
            cities: self.dashboard.cities.clone(),
            assets: self.stream.assets.clone(),
        }
    }

    /// Price alert policy.
    #[must_use]
    pub const fn alert_policy(&self) -> AlertPolicy {
        AlertPolicy::new(self.dashboard.alert_threshold_pct)
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A list variable was set but held no items.
    #[error("environment variable {0} must list at least one item")]
    EmptyList(String),
}

struct EnvReader<'a, F> {
    lookup: &'a F,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<'_, F> {
    fn non_empty(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse<T: FromStr>(&self, key: &str, default: T) -> T {
        self.non_empty(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn url(&self, key: &str, default: String) -> String {
        self.non_empty(key)
            .map_or(default, |v| v.trim_end_matches('/').to_string())
    }

    /// Whole seconds. Zero is treated as unset.
    fn duration_secs(&self, key: &str, default: Duration) -> Duration {
        self.non_empty(key)
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map_or(default, Duration::from_secs)
    }

    fn duration_millis(&self, key: &str, default: Duration) -> Duration {
        self.non_empty(key)
            .and_then(|v| v.parse::<u64>().ok())
            .map_or(default, Duration::from_millis)
    }

    fn list(&self, key: &str, default: Vec<String>) -> Result<Vec<String>, ConfigError> {
        let Some(raw) = self.non_empty(key) else {
            return Ok(default);
        };
        let items: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect();
        if items.is_empty() {
            return Err(ConfigError::EmptyList(key.to_string()));
        }
        Ok(items)
    }
}
