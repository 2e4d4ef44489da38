//! Configuration Module
//!
//! Configuration loading for the dashboard proxy.

mod settings;

pub use settings::{
    ApiKey, ConfigError, DashboardConfig, DashboardSettings, ServerSettings, StreamSettings,
    UpstreamSettings,
};
