//! Proxy Services
//!
//! One service per upstream data domain. Each validates its request,
//! consults its response cache and calls the upstream port only on a
//! miss or an expired entry.
//!
//! # Fetch Flow
//!
//! 1. A fresh cache entry is returned without touching the upstream.
//! 2. Otherwise wait the pre-request delay, then call the upstream.
//! 3. A 429 is retried once after the rate-limit delay.
//! 4. Success overwrites the cache entry.
//! 5. Failure serves the stale entry if there is one, else an error.
//!
//! There is no request coalescing: concurrent misses for the same
//! fingerprint each reach the upstream.

mod forecast;
mod historical;
mod news;
mod prices;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

pub use forecast::{ForecastParams, ForecastProxy};
pub use historical::{HistoricalParams, HistoricalPriceProxy};
pub use news::NewsProxy;
pub use prices::{PriceParams, PriceProxy};

use crate::application::ports::{
    ClockPort, MarketDataPort, NewsPort, UpstreamError, WeatherPort,
};
use crate::domain::cache::{CacheLookup, Fingerprint, ResponseCache};

// =============================================================================
// Errors
// =============================================================================

/// Error returned to proxy clients.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProxyError {
    /// Required query parameters are absent or invalid.
    #[error("{message}")]
    BadRequest {
        /// Message for the error envelope.
        message: String,
    },

    /// The geocoder found no match.
    #[error("Location not found")]
    LocationNotFound,

    /// The upstream rate limited us and no cached data exists.
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    /// The upstream failed and no cached data exists.
    #[error("{message}")]
    Upstream {
        /// Message for the error envelope.
        message: String,
    },
}

impl ProxyError {
    /// Create a bad request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest { .. } => 400,
            Self::LocationNotFound => 404,
            Self::RateLimited => 429,
            Self::Upstream { .. } => 500,
        }
    }
}

// =============================================================================
// Pacing
// =============================================================================

/// Delays applied around upstream calls for one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpstreamPacing {
    /// Wait before every upstream call.
    pub pre_request_delay: Duration,
    /// Wait before the single retry after a 429.
    pub rate_limit_retry_delay: Duration,
}

impl UpstreamPacing {
    /// No delays. Used in tests.
    pub const IMMEDIATE: Self = Self {
        pre_request_delay: Duration::ZERO,
        rate_limit_retry_delay: Duration::ZERO,
    };

    /// Live price pacing: no pre-delay, one second before the retry.
    pub const LIVE_PRICES: Self = Self {
        pre_request_delay: Duration::ZERO,
        rate_limit_retry_delay: Duration::from_secs(1),
    };

    /// Historical pacing: one second before each call, five before the retry.
    pub const HISTORICAL_PRICES: Self = Self {
        pre_request_delay: Duration::from_secs(1),
        rate_limit_retry_delay: Duration::from_secs(5),
    };

    /// News pacing: no pre-delay, one second before the retry.
    pub const NEWS: Self = Self {
        pre_request_delay: Duration::ZERO,
        rate_limit_retry_delay: Duration::from_secs(1),
    };
}

/// Pacing for every proxied endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxyPacing {
    /// `/crypto`.
    pub live_prices: UpstreamPacing,
    /// `/crypto/historical`.
    pub historical_prices: UpstreamPacing,
    /// `/news`.
    pub news: UpstreamPacing,
}

impl Default for ProxyPacing {
    fn default() -> Self {
        Self {
            live_prices: UpstreamPacing::LIVE_PRICES,
            historical_prices: UpstreamPacing::HISTORICAL_PRICES,
            news: UpstreamPacing::NEWS,
        }
    }
}

impl ProxyPacing {
    /// No delays anywhere.
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            live_prices: UpstreamPacing::IMMEDIATE,
            historical_prices: UpstreamPacing::IMMEDIATE,
            news: UpstreamPacing::IMMEDIATE,
        }
    }
}

// =============================================================================
// Served Responses
// =============================================================================

/// How a response was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Served from a fresh cache entry.
    Hit,
    /// Fetched from the upstream and cached.
    Refreshed,
    /// Upstream failed; served an expired entry.
    StaleFallback,
    /// Not cacheable; fetched from the upstream.
    Passthrough,
}

impl CacheOutcome {
    /// Lowercase label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Refreshed => "refreshed",
            Self::StaleFallback => "stale_fallback",
            Self::Passthrough => "passthrough",
        }
    }
}

/// A payload together with its cache outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Served<T> {
    /// Response body.
    pub payload: T,
    /// How it was produced.
    pub outcome: CacheOutcome,
}

impl<T> Served<T> {
    const fn new(payload: T, outcome: CacheOutcome) -> Self {
        Self { payload, outcome }
    }
}

// =============================================================================
// Cache-Then-Fetch
// =============================================================================

/// Run the fetch flow for one fingerprint.
///
/// `failure_message` builds the envelope message when a non-429 failure
/// has no stale entry to fall back to.
pub(crate) async fn serve_with_cache<T, F, Fut>(
    cache: &ResponseCache<T>,
    clock: &dyn ClockPort,
    fingerprint: Fingerprint,
    pacing: UpstreamPacing,
    failure_message: fn(&UpstreamError) -> &'static str,
    mut fetch: F,
) -> Result<Served<T>, ProxyError>
where
    T: Clone + Send + Sync,
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<T, UpstreamError>> + Send,
{
    let stale = match cache.lookup(&fingerprint, clock.now_millis()) {
        CacheLookup::Fresh(payload) => {
            debug!(key = %fingerprint, "Cache hit");
            return Ok(Served::new(payload, CacheOutcome::Hit));
        }
        CacheLookup::Stale(payload) => Some(payload),
        CacheLookup::Miss => None,
    };

    if !pacing.pre_request_delay.is_zero() {
        tokio::time::sleep(pacing.pre_request_delay).await;
    }

    let mut retried = false;
    let result = match fetch().await {
        Err(UpstreamError::RateLimited) => {
            warn!(
                key = %fingerprint,
                delay_ms = pacing.rate_limit_retry_delay.as_millis(),
                "Upstream rate limited, retrying once"
            );
            tokio::time::sleep(pacing.rate_limit_retry_delay).await;
            retried = true;
            fetch().await
        }
        other => other,
    };

    match result {
        Ok(payload) => {
            cache.put(fingerprint, payload.clone(), clock.now_millis());
            Ok(Served::new(payload, CacheOutcome::Refreshed))
        }
        Err(error) => {
            if let Some(payload) = stale {
                warn!(key = %fingerprint, error = %error, "Upstream failed, serving stale cache entry");
                return Ok(Served::new(payload, CacheOutcome::StaleFallback));
            }
            warn!(key = %fingerprint, error = %error, "Upstream failed with no cached fallback");
            if retried || error.is_rate_limited() {
                Err(ProxyError::RateLimited)
            } else {
                Err(ProxyError::Upstream {
                    message: failure_message(&error).to_string(),
                })
            }
        }
    }
}

// =============================================================================
// Service Bundle
// =============================================================================

/// The four proxy services sharing one clock.
pub struct ProxyServices {
    /// `/crypto`.
    pub prices: PriceProxy,
    /// `/crypto/historical`.
    pub historical: HistoricalPriceProxy,
    /// `/news`.
    pub news: NewsProxy,
    /// `/weather/forecast`.
    pub forecast: ForecastProxy,
}

impl ProxyServices {
    /// Wire the services to their upstream ports.
    #[must_use]
    pub fn new(
        market: Arc<dyn MarketDataPort>,
        news: Arc<dyn NewsPort>,
        weather: Arc<dyn WeatherPort>,
        clock: Arc<dyn ClockPort>,
        pacing: ProxyPacing,
    ) -> Self {
        Self {
            prices: PriceProxy::new(Arc::clone(&market), Arc::clone(&clock), pacing.live_prices),
            historical: HistoricalPriceProxy::new(
                market,
                Arc::clone(&clock),
                pacing.historical_prices,
            ),
            news: NewsProxy::new(news, clock, pacing.news),
            forecast: ForecastProxy::new(weather),
        }
    }
}
