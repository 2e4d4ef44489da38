//! Historical price proxy (`/crypto/historical`).

use std::sync::Arc;

use serde::Deserialize;
use tracing::instrument;

use super::{ProxyError, Served, UpstreamPacing, serve_with_cache};
use crate::application::ports::{ClockPort, MarketDataPort, UpstreamError};
use crate::domain::cache::{Fingerprint, HISTORICAL_PRICES_TTL, ResponseCache};
use crate::domain::market::MarketChart;

const MISSING_PARAMETERS: &str = "Missing required parameters";
const INVALID_DAYS: &str = "Invalid days parameter";
const FAILURE_MESSAGE: &str = "Failed to fetch historical data. Please try again later.";
const INVALID_DATA_MESSAGE: &str = "Invalid data received from CoinGecko";

/// Query parameters accepted by `/crypto/historical`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoricalParams {
    /// Asset id.
    pub id: Option<String>,
    /// Day range, a positive integer.
    pub days: Option<String>,
}

impl HistoricalParams {
    /// Parameters for `id` over `days`.
    #[must_use]
    pub fn new(id: &str, days: u32) -> Self {
        Self {
            id: Some(id.to_string()),
            days: Some(days.to_string()),
        }
    }

    fn validate(&self) -> Result<(String, u32), ProxyError> {
        let id = self.id.as_deref().map(str::trim).unwrap_or_default();
        let days = self.days.as_deref().map(str::trim).unwrap_or_default();
        if id.is_empty() || days.is_empty() {
            return Err(ProxyError::bad_request(MISSING_PARAMETERS));
        }
        match days.parse::<u32>() {
            Ok(days) if days > 0 => Ok((id.to_lowercase(), days)),
            _ => Err(ProxyError::bad_request(INVALID_DAYS)),
        }
    }
}

fn failure_message(error: &UpstreamError) -> &'static str {
    match error {
        UpstreamError::InvalidPayload { .. } => INVALID_DATA_MESSAGE,
        _ => FAILURE_MESSAGE,
    }
}

/// Cached proxy over the market data provider's chart endpoint.
pub struct HistoricalPriceProxy {
    upstream: Arc<dyn MarketDataPort>,
    clock: Arc<dyn ClockPort>,
    pacing: UpstreamPacing,
    cache: ResponseCache<MarketChart>,
}

impl HistoricalPriceProxy {
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
            cache: ResponseCache::new(HISTORICAL_PRICES_TTL),
        }
    }

    /// The response cache.
    #[must_use]
    pub const fn cache(&self) -> &ResponseCache<MarketChart> {
        &self.cache
    }

    /// Serve the chart for one asset and day range.
    ///
    /// # Errors
    ///
    /// - `BadRequest` when `id` or `days` is absent, or `days` is not a
    ///   positive integer
    /// - `RateLimited` / `Upstream` when the provider fails and nothing
    ///   is cached for this id and range
    #[instrument(skip(self, params), fields(id = ?params.id, days = ?params.days))]
    pub async fn historical(
        &self,
        params: HistoricalParams,
    ) -> Result<Served<MarketChart>, ProxyError> {
        let (id, days) = params.validate()?;
        let fingerprint = Fingerprint::historical_prices(&id, days);

        let upstream = self.upstream.as_ref();
        let id = id.as_str();
        serve_with_cache(
            &self.cache,
            self.clock.as_ref(),
            fingerprint,
            self.pacing,
            failure_message,
            move || upstream.market_chart(id, days),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{ManualClock, MockMarketDataPort};
    use crate::application::services::proxy::CacheOutcome;
    use crate::domain::market::ChartPoint;
    use test_case::test_case;

    fn chart() -> MarketChart {
        MarketChart {
            prices: vec![ChartPoint(1_711_929_600_000, 70_000.0)],
            market_caps: vec![],
            total_volumes: vec![],
        }
    }

    fn proxy(upstream: MockMarketDataPort) -> HistoricalPriceProxy {
        HistoricalPriceProxy::new(
            Arc::new(upstream),
            Arc::new(ManualClock::new(0)),
            UpstreamPacing::IMMEDIATE,
        )
    }

    #[test_case(None, Some("7"), "Missing required parameters" ; "missing id")]
    #[test_case(Some("bitcoin"), None, "Missing required parameters" ; "missing days")]
    #[test_case(Some("bitcoin"), Some("0"), "Invalid days parameter" ; "zero days")]
    #[test_case(Some("bitcoin"), Some("-3"), "Invalid days parameter" ; "negative days")]
    #[test_case(Some("bitcoin"), Some("week"), "Invalid days parameter" ; "non numeric days")]
    #[tokio::test]
    async fn invalid_params_are_rejected(id: Option<&str>, days: Option<&str>, message: &str) {
        let proxy = proxy(MockMarketDataPort::new());
        let params = HistoricalParams {
            id: id.map(str::to_string),
            days: days.map(str::to_string),
        };
        let err = proxy.historical(params).await.unwrap_err();
        assert_eq!(err, ProxyError::bad_request(message));
    }

    #[tokio::test]
    async fn second_request_within_ttl_hits_cache() {
        let mut upstream = MockMarketDataPort::new();
        upstream
            .expect_market_chart()
            .withf(|id, days| id == "bitcoin" && *days == 7)
            .times(1)
            .returning(|_, _| Ok(chart()));
        let proxy = proxy(upstream);

        let first = proxy.historical(HistoricalParams::new("bitcoin", 7)).await.unwrap();
        let second = proxy.historical(HistoricalParams::new("bitcoin", 7)).await.unwrap();

        assert_eq!(first.outcome, CacheOutcome::Refreshed);
        assert_eq!(second.outcome, CacheOutcome::Hit);
        assert_eq!(second.payload, chart());
    }

    #[tokio::test]
    async fn different_ranges_are_cached_separately() {
        let mut upstream = MockMarketDataPort::new();
        upstream
            .expect_market_chart()
            .times(2)
            .returning(|_, _| Ok(chart()));
        let proxy = proxy(upstream);

        proxy.historical(HistoricalParams::new("bitcoin", 7)).await.unwrap();
        proxy.historical(HistoricalParams::new("bitcoin", 30)).await.unwrap();

        assert_eq!(proxy.cache().len(), 2);
    }

    #[tokio::test]
    async fn invalid_payload_is_upstream_error() {
        let mut upstream = MockMarketDataPort::new();
        upstream
            .expect_market_chart()
            .times(1)
            .returning(|_, _| Err(UpstreamError::invalid_payload("prices is not an array")));
        let proxy = proxy(upstream);

        let err = proxy
            .historical(HistoricalParams::new("bitcoin", 7))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid data received from CoinGecko");
    }

    #[tokio::test]
    async fn network_failure_asks_to_retry_later() {
        let mut upstream = MockMarketDataPort::new();
        upstream.expect_market_chart().times(1).returning(|_, _| {
            Err(UpstreamError::Network {
                message: "timed out".into(),
            })
        });
        let proxy = proxy(upstream);

        let err = proxy
            .historical(HistoricalParams::new("bitcoin", 7))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to fetch historical data. Please try again later."
        );
    }
}
