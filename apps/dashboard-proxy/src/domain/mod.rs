//! Domain Layer - Dashboard data types and pure business rules.
//!
//! This layer holds the records exchanged with the dashboard (assets,
//! weather reports, news articles, favorites) and the rules that govern
//! them: cache freshness, price direction, alert thresholds and weather
//! code descriptions. Nothing here performs I/O.

/// Fingerprint-keyed response cache with TTL freshness.
pub mod cache;

/// User favorites (cities and cryptocurrencies).
pub mod favorites;

/// Cryptocurrency assets, market charts and price alerts.
pub mod market;

/// News articles and feed normalization.
pub mod news;

/// Weather snapshots, forecasts and condition descriptions.
pub mod weather;
