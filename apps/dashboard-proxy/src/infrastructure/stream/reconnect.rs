//! Reconnection State Machine
//!
//! Pure transition function for the price stream connection lifecycle.
//! Timing lives in the client; this module only decides what happens
//! next.
//!
//! ```text
//! Connecting ──Opened──► Connected ──Closed──► Reconnecting{1}
//!      │                     ▲                      │
//!      └──────Closed─────────┼──────────────────────┤
//!                            └──────Opened──────────┤
//!                          Reconnecting{n} ──Closed──► Reconnecting{n+1}  (n < max)
//!                                                 └──► Abandoned          (n = max)
//! ```

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Fixed-delay, bounded reconnection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Reconnects attempted before giving up.
    pub max_attempts: u32,
    /// Delay before each reconnect.
    pub delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_millis(3000),
        }
    }
}

/// Input to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSignal {
    /// The connection opened.
    Opened,
    /// The connection closed or failed to open.
    Closed,
}

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum StreamState {
    /// First connection in progress.
    Connecting,
    /// Connected and receiving frames.
    Connected,
    /// Waiting to make reconnect attempt `attempt` (1-based).
    Reconnecting {
        /// Attempt number.
        attempt: u32,
    },
    /// Gave up. Terminal.
    Abandoned,
}

impl StreamState {
    /// Apply a signal under `policy`.
    #[must_use]
    pub const fn next(self, signal: StreamSignal, policy: &ReconnectPolicy) -> Self {
        match (self, signal) {
            (Self::Abandoned, _) => Self::Abandoned,
            (_, StreamSignal::Opened) => Self::Connected,
            (Self::Connecting | Self::Connected, StreamSignal::Closed) => {
                Self::after_attempts(0, policy)
            }
            (Self::Reconnecting { attempt }, StreamSignal::Closed) => {
                Self::after_attempts(attempt, policy)
            }
        }
    }

    const fn after_attempts(made: u32, policy: &ReconnectPolicy) -> Self {
        if made < policy.max_attempts {
            Self::Reconnecting { attempt: made + 1 }
        } else {
            Self::Abandoned
        }
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Abandoned)
    }

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting { .. } => "reconnecting",
            Self::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reconnecting { attempt } => write!(f, "reconnecting (attempt {attempt})"),
            other => f.write_str(other.as_str()),
        }
    }
}
