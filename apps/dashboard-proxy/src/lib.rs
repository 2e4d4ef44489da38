#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Dashboard Proxy - Market, Weather and News Backend
//!
//! An HTTP service that fronts the CoinGecko, NewsData and Open-Meteo APIs
//! with short-lived response caches, and a dashboard store kept current by
//! periodic polling and a live price stream.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Records and pure rules
//!   - `cache`: Fingerprints, TTLs and the response cache
//!   - `market`, `weather`, `news`, `favorites`: Dashboard data
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: Upstream providers, favorites storage, dashboard API, clock
//!   - `services`: Cached proxies, the dashboard store, the poller
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `upstream`: reqwest clients for the providers
//!   - `stream`: Live price WebSocket client
//!   - `http`: axum routes for proxies, dashboard, health and metrics
//!   - `client`, `persistence`, `config`, `telemetry`, `metrics`
//!
//! # Data Flow
//!
//! ```text
//! CoinGecko ──┐
//! NewsData  ──┼──► Proxy caches ──► HTTP routes ◄── Dashboard API client
//! Open-Meteo ─┘                                          │
//!                                                        ▼
//! Price stream WS ─────────────────────────────────► Dashboard store
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Dashboard types with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::favorites::FavoritesSet;
pub use domain::market::{AlertPolicy, CryptoAsset, PriceAlert, PriceDirection, PriceTick};

// Application services
pub use application::services::{
    DashboardPoller, DashboardStore, PollerConfig, ProxyError, ProxyPacing, ProxyServices,
};

// Infrastructure config
pub use infrastructure::config::{ConfigError, DashboardConfig};

// HTTP server
pub use infrastructure::http::{AppState, HttpServer, ServerError, create_router};

// Price stream
pub use infrastructure::stream::{
    PriceStreamClient, PriceStreamConfig, PriceStreamEvent, StreamStatus, forward_price_events,
};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
