//! Live price proxy (`/crypto`).

use std::sync::Arc;

use serde::Deserialize;
use tracing::instrument;

use super::{ProxyError, Served, UpstreamPacing, serve_with_cache};
use crate::application::ports::{ClockPort, MarketDataPort, PriceQuery, PriceTable};
use crate::domain::cache::{Fingerprint, LIVE_PRICES_TTL, ResponseCache};

const MISSING_PARAMETERS: &str = "Missing required parameters";
const FAILURE_MESSAGE: &str = "Failed to fetch crypto data";

/// Query parameters accepted by `/crypto`.
///
/// Only `ids` is read. Quotes are always USD with change, market cap and
/// volume included, so the cache key depends on the ids alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PriceParams {
    /// Comma-separated asset ids.
    pub ids: Option<String>,
}

impl PriceParams {
    /// Parameters for USD prices of `ids`.
    #[must_use]
    pub fn for_ids(ids: &[&str]) -> Self {
        Self {
            ids: Some(ids.join(",")),
        }
    }
}

/// Cached proxy over the market data provider's simple price endpoint.
pub struct PriceProxy {
    upstream: Arc<dyn MarketDataPort>,
    clock: Arc<dyn ClockPort>,
    pacing: UpstreamPacing,
    cache: ResponseCache<PriceTable>,
}

impl PriceProxy {
    /// Create the proxy with an empty cache.
    #[must_use]
    pub fn new(
        upstream: Arc<dyn MarketDataPort>,
        clock: Arc<dyn ClockPort>,
        pacing: UpstreamPacing,
    ) -> Self {
        Self {
            upstream,
            clock,
            pacing,
            cache: ResponseCache::new(LIVE_PRICES_TTL),
        }
    }

    /// The response cache.
    #[must_use]
    pub const fn cache(&self) -> &ResponseCache<PriceTable> {
        &self.cache
    }

    /// Serve prices for the requested ids.
    ///
    /// # Errors
    ///
    /// - `BadRequest` when `ids` is absent or has no usable id
    /// - `RateLimited` / `Upstream` when the provider fails and nothing
    ///   is cached for these ids
    #[instrument(skip(self, params), fields(ids = ?params.ids))]
    pub async fn prices(&self, params: PriceParams) -> Result<Served<PriceTable>, ProxyError> {
        let fingerprint = Fingerprint::live_prices(params.ids.as_deref().unwrap_or("").split(','));
        if fingerprint.as_str().is_empty() {
            return Err(ProxyError::bad_request(MISSING_PARAMETERS));
        }

        let ids = fingerprint.as_str().split(',').map(str::to_string).collect();
        let query = PriceQuery::usd(ids);

        let upstream = self.upstream.as_ref();
        let query = &query;
        serve_with_cache(
            &self.cache,
            self.clock.as_ref(),
            fingerprint,
            self.pacing,
            |_| FAILURE_MESSAGE,
            move || upstream.simple_prices(query),
        )
        .await
    }
}
