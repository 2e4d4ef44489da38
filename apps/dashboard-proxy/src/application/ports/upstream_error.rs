//! Upstream Errors
//!
//! Failure modes shared by every upstream data provider port.

/// Error returned by an upstream provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    /// Provider answered HTTP 429.
    #[error("Rate limited by upstream")]
    RateLimited,

    /// Provider answered with another non-success status.
    #[error("Upstream returned HTTP {status}: {reason}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Status reason or body excerpt.
        reason: String,
    },

    /// Request never produced a response.
    #[error("Upstream request failed: {message}")]
    Network {
        /// Error details.
        message: String,
    },

    /// Response body did not have the expected shape.
    #[error("Invalid upstream payload: {message}")]
    InvalidPayload {
        /// Error details.
        message: String,
    },

    /// A required credential or setting is absent.
    #[error("{setting} is not configured")]
    NotConfigured {
        /// Missing setting name.
        setting: &'static str,
    },
}

impl UpstreamError {
    /// Whether the provider asked us to back off.
    #[must_use]
    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited)
    }

    /// Create an invalid payload error.
    #[must_use]
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            message: message.into(),
        }
    }
}
