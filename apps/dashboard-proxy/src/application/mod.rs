//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the proxy services, the dashboard store and its
//! poller, and the port interfaces they depend on.

/// Port interfaces for upstream providers, storage and the dashboard API.
pub mod ports;

/// Proxy services, dashboard store and poller.
pub mod services;
