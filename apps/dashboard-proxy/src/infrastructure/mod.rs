//! Infrastructure Layer - Adapters and external integrations.
//!
//! This layer contains the concrete implementations of the port interfaces
//! defined in the application layer.

/// reqwest clients for the market data, news and weather providers.
pub mod upstream;

/// Live price WebSocket client and event handling.
pub mod stream;

/// HTTP client for the proxy's own endpoints.
pub mod client;

/// JSON-file favorites storage.
pub mod persistence;

/// axum router and server.
pub mod http;

/// Configuration loading.
pub mod config;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// Logging and OpenTelemetry tracing.
pub mod telemetry;
