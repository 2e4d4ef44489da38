//! Dashboard API Port (Driver Port)
//!
//! The proxy's own HTTP surface as seen by the dashboard store. The store
//! never talks to upstream providers directly.

use async_trait::async_trait;

use super::PriceTable;
use crate::domain::market::MarketChart;
use crate::domain::news::NewsFeed;
use crate::domain::weather::ForecastReport;

/// Dashboard API error. Displays as the message the store records.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DashboardApiError {
    /// The proxy answered with an error envelope.
    #[error("{message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message from the error envelope.
        message: String,
    },

    /// The request did not complete.
    #[error("Request failed: {message}")]
    Transport {
        /// Error details.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("Invalid response: {message}")]
    Decode {
        /// Error details.
        message: String,
    },
}

/// Port for fetching dashboard data through the proxy.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DashboardApiPort: Send + Sync {
    /// Live prices for `ids`.
    async fn crypto_prices(&self, ids: &[String]) -> Result<PriceTable, DashboardApiError>;

    /// Historical chart for one asset.
    async fn historical_prices(&self, id: &str, days: u32) -> Result<MarketChart, DashboardApiError>;

    /// Latest news.
    async fn news(&self) -> Result<NewsFeed, DashboardApiError>;

    /// Forecast for a city name.
    async fn weather_forecast(&self, city: &str) -> Result<ForecastReport, DashboardApiError>;
}
