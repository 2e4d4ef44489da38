//! Market Data Port (Driven Port)
//!
//! Interface to the cryptocurrency market data provider.

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::UpstreamError;
use crate::domain::market::{CryptoAsset, MarketChart};

/// Assets keyed by id, as served by `/crypto`.
pub type PriceTable = BTreeMap<String, CryptoAsset>;

/// Parameters of a live price request.
///
/// Everything except `ids` is forwarded to the provider unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceQuery {
    /// Normalized asset ids.
    pub ids: Vec<String>,
    /// Quote currencies.
    pub vs_currencies: String,
    /// Include 24-hour change.
    pub include_24hr_change: String,
    /// Include market cap.
    pub include_market_cap: String,
    /// Include 24-hour volume.
    pub include_24hr_vol: String,
}

impl PriceQuery {
    /// USD prices with all extras for `ids`.
    #[must_use]
    pub fn usd(ids: Vec<String>) -> Self {
        Self {
            ids,
            vs_currencies: "usd".to_string(),
            include_24hr_change: "true".to_string(),
            include_market_cap: "true".to_string(),
            include_24hr_vol: "true".to_string(),
        }
    }
}

/// Port for market data.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataPort: Send + Sync {
    /// Latest prices for the queried assets. Every queried id is present;
    /// figures the provider does not report are zero.
    async fn simple_prices(&self, query: &PriceQuery) -> Result<PriceTable, UpstreamError>;

    /// Historical series for one asset over `days` days.
    async fn market_chart(&self, id: &str, days: u32) -> Result<MarketChart, UpstreamError>;
}
