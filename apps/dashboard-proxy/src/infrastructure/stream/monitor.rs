//! Stream Event Handling
//!
//! Applies price stream events to the dashboard store and tracks the
//! connection state for the health endpoint.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::mpsc;

use super::client::PriceStreamEvent;
use super::reconnect::StreamState;
use crate::application::services::DashboardStore;
use crate::infrastructure::metrics;

/// Point-in-time view of [`StreamStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamStatusSnapshot {
    /// Connection state.
    #[serde(flatten)]
    pub state: StreamState,
    /// Successful connections, including reconnects.
    pub connections: u64,
    /// Price ticks received.
    pub ticks_received: u64,
    /// Price alerts raised.
    pub alerts_raised: u64,
}

/// Connection state and counters shared with the HTTP layer.
#[derive(Debug)]
pub struct StreamStatus {
    state: RwLock<StreamState>,
    connections: AtomicU64,
    ticks_received: AtomicU64,
    alerts_raised: AtomicU64,
}

impl Default for StreamStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamStatus {
    /// Create a status in the `connecting` state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: RwLock::new(StreamState::Connecting),
            connections: AtomicU64::new(0),
            ticks_received: AtomicU64::new(0),
            alerts_raised: AtomicU64::new(0),
        }
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> StreamState {
        *self.state.read()
    }

    /// Current state and counters.
    #[must_use]
    pub fn snapshot(&self) -> StreamStatusSnapshot {
        StreamStatusSnapshot {
            state: self.state(),
            connections: self.connections.load(Ordering::Relaxed),
            ticks_received: self.ticks_received.load(Ordering::Relaxed),
            alerts_raised: self.alerts_raised.load(Ordering::Relaxed),
        }
    }

    fn observe(&self, event: &PriceStreamEvent) {
        let next = match event {
            PriceStreamEvent::Connected => {
                self.connections.fetch_add(1, Ordering::Relaxed);
                StreamState::Connected
            }
            PriceStreamEvent::Reconnecting { attempt } => StreamState::Reconnecting { attempt: *attempt },
            PriceStreamEvent::Abandoned => StreamState::Abandoned,
            PriceStreamEvent::Prices(ticks) => {
                self.ticks_received
                    .fetch_add(ticks.len() as u64, Ordering::Relaxed);
                return;
            }
            PriceStreamEvent::Disconnected => {
                metrics::set_stream_connected(false);
                return;
            }
        };
        metrics::set_stream_connected(next == StreamState::Connected);
        *self.state.write() = next;
    }
}

/// Consume stream events until the channel closes, applying price ticks
/// to `store`.
pub async fn forward_price_events(
    mut events: mpsc::Receiver<PriceStreamEvent>,
    store: Arc<DashboardStore>,
    status: Arc<StreamStatus>,
) {
    while let Some(event) = events.recv().await {
        status.observe(&event);
        if let PriceStreamEvent::Prices(ticks) = event {
            for tick in &ticks {
                if let Some(alert) = store.update_crypto_price(tick) {
                    status.alerts_raised.fetch_add(1, Ordering::Relaxed);
                    metrics::record_price_alert(&alert.asset_id);
                }
            }
        }
    }
    tracing::debug!("Price event channel closed");
}
