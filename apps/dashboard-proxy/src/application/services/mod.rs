//! Application Services
//!
//! Services that orchestrate domain logic and coordinate between ports.
//!
//! - `ProxyServices`: Cached proxies over the upstream data providers
//! - `DashboardStore`: Client-side state for weather, prices, news and
//!   favorites
//! - `DashboardPoller`: Periodic refresh of the store while it is mounted

mod poller;
pub mod proxy;
pub mod store;

pub use poller::{DashboardPoller, PollerConfig};
pub use proxy::{
    CacheOutcome, ForecastParams, ForecastProxy, HistoricalParams, HistoricalPriceProxy,
    NewsProxy, PriceParams, PriceProxy, ProxyError, ProxyPacing, ProxyServices, Served,
    UpstreamPacing,
};
pub use store::{CryptoSlice, DashboardSnapshot, DashboardStore, SliceStatus, WeatherSlice};
