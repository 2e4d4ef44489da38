//! Application Ports (Driver and Driven)
//!
//! Ports define interfaces for interacting with external systems.
//! - **Driven Ports** (Secondary/Outbound): upstream data providers, the
//!   clock, favorites storage
//! - **Driver Ports** (Primary/Inbound): the dashboard API the store
//!   fetches through

mod clock_port;
mod dashboard_api_port;
mod favorites_storage_port;
mod market_data_port;
mod news_port;
mod upstream_error;
mod weather_port;

pub use clock_port::{ClockPort, ManualClock, SystemClock};
pub use dashboard_api_port::{DashboardApiError, DashboardApiPort};
pub use favorites_storage_port::{FavoritesStoragePort, InMemoryFavoritesStorage, StorageError};
pub use market_data_port::{MarketDataPort, PriceQuery, PriceTable};
pub use news_port::NewsPort;
pub use upstream_error::UpstreamError;
pub use weather_port::WeatherPort;

#[cfg(test)]
pub use dashboard_api_port::MockDashboardApiPort;
#[cfg(test)]
pub use market_data_port::MockMarketDataPort;
#[cfg(test)]
pub use news_port::MockNewsPort;
#[cfg(test)]
pub use weather_port::MockWeatherPort;
