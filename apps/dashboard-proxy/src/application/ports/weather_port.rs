//! Weather Port (Driven Port)
//!
//! Interface to the geocoding and forecast providers.

use async_trait::async_trait;

use super::UpstreamError;
use crate::domain::weather::{ForecastReport, Location};

/// Port for weather data.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WeatherPort: Send + Sync {
    /// Resolve a free-text place name. `None` when nothing matches.
    async fn geocode(&self, name: &str) -> Result<Option<Location>, UpstreamError>;

    /// Forecast for a resolved location.
    async fn forecast(&self, location: &Location) -> Result<ForecastReport, UpstreamError>;
}
