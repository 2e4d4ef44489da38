//! Price Stream Client
//!
//! Holds a WebSocket connection to the live price feed and turns frames
//! into [`PriceStreamEvent`]s. Dropped connections are retried after a
//! fixed delay until the [`ReconnectPolicy`] is exhausted, then the client
//! stops quietly.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use super::codec::PriceFrameCodec;
use super::reconnect::{ReconnectPolicy, StreamSignal, StreamState};
use crate::domain::market::PriceTick;
use crate::infrastructure::metrics;

// =============================================================================
// Error Type
// =============================================================================

/// Errors that end a single connection.
#[derive(Debug, thiserror::Error)]
pub enum PriceStreamError {
    /// WebSocket error, including failure to connect.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Server closed the connection.
    #[error("connection closed")]
    ConnectionClosed,

    /// Event receiver was dropped.
    #[error("event channel closed")]
    ChannelClosed,
}

// =============================================================================
// Events
// =============================================================================

/// Events emitted by the price stream client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceStreamEvent {
    /// Connection opened.
    Connected,
    /// Connection closed or could not be opened.
    Disconnected,
    /// Waiting to reconnect.
    Reconnecting {
        /// Attempt number, starting at 1.
        attempt: u32,
    },
    /// Prices from one frame.
    Prices(Vec<PriceTick>),
    /// Reconnect attempts exhausted. No further events follow.
    Abandoned,
}

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the price stream client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceStreamConfig {
    /// Feed endpoint without the asset query.
    pub url: String,
    /// Asset ids to subscribe to.
    pub assets: Vec<String>,
    /// Reconnection policy.
    pub reconnect: ReconnectPolicy,
}

impl PriceStreamConfig {
    /// Endpoint with the `assets` query appended.
    #[must_use]
    pub fn stream_url(&self) -> String {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{separator}assets={}", self.url, self.assets.join(","))
    }
}

// =============================================================================
// Client
// =============================================================================

/// WebSocket client for the live price feed.
pub struct PriceStreamClient {
    config: PriceStreamConfig,
    codec: PriceFrameCodec,
    event_tx: mpsc::Sender<PriceStreamEvent>,
    cancel: CancellationToken,
}

impl PriceStreamClient {
    /// Create a new client.
    #[must_use]
    pub const fn new(
        config: PriceStreamConfig,
        event_tx: mpsc::Sender<PriceStreamEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            codec: PriceFrameCodec::new(),
            event_tx,
            cancel,
        }
    }

    /// Run the connection loop until cancelled or abandoned.
    ///
    /// Abandoning after the last reconnect attempt is not an error: an
    /// [`PriceStreamEvent::Abandoned`] event is sent and `Ok` returned.
    ///
    /// # Errors
    ///
    /// Returns [`PriceStreamError::ChannelClosed`] if the event receiver is
    /// dropped.
    pub async fn run(self: Arc<Self>) -> Result<(), PriceStreamError> {
        let policy = self.config.reconnect;
        let mut state = StreamState::Connecting;

        loop {
            if self.cancel.is_cancelled() {
                tracing::info!("Price stream cancelled");
                return Ok(());
            }

            match self.connect_and_run(&mut state).await {
                Ok(()) => {
                    tracing::info!("Price stream stopped");
                    return Ok(());
                }
                Err(PriceStreamError::ChannelClosed) => {
                    return Err(PriceStreamError::ChannelClosed);
                }
                Err(e) => {
                    tracing::warn!(error = %e, state = %state, "Price stream connection lost");
                    self.emit(PriceStreamEvent::Disconnected).await?;

                    state = state.next(StreamSignal::Closed, &policy);
                    let StreamState::Reconnecting { attempt } = state else {
                        tracing::info!(
                            max_attempts = policy.max_attempts,
                            "Price stream reconnect attempts exhausted, giving up"
                        );
                        self.emit(PriceStreamEvent::Abandoned).await?;
                        return Ok(());
                    };

                    tracing::info!(
                        attempt,
                        delay_ms = policy.delay.as_millis(),
                        "Reconnecting to price stream"
                    );
                    metrics::record_stream_reconnect();
                    self.emit(PriceStreamEvent::Reconnecting { attempt }).await?;

                    tokio::select! {
                        () = self.cancel.cancelled() => {
                            tracing::info!("Price stream cancelled during reconnect delay");
                            return Ok(());
                        }
                        () = tokio::time::sleep(policy.delay) => {}
                    }
                }
            }
        }
    }

    /// Connect and read frames until the connection ends or the client is
    /// cancelled. Cancellation returns `Ok`.
    async fn connect_and_run(&self, state: &mut StreamState) -> Result<(), PriceStreamError> {
        let url = self.config.stream_url();
        tracing::info!(url = %url, "Connecting to price stream");

        let (ws_stream, _response) = tokio::select! {
            () = self.cancel.cancelled() => return Ok(()),
            connected = tokio_tungstenite::connect_async(url) => connected?,
        };
        let (mut write, mut read) = ws_stream.split();

        *state = state.next(StreamSignal::Opened, &self.config.reconnect);
        tracing::info!(assets = ?self.config.assets, "Price stream connected");
        self.emit(PriceStreamEvent::Connected).await?;

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(());
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_text_frame(&text).await?;
                        }
                        Some(Ok(Message::Ping(data))) => {
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(_))) => {
                            tracing::info!("Server sent close frame");
                            return Err(PriceStreamError::ConnectionClosed);
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return Err(e.into()),
                        None => {
                            tracing::info!("Price stream ended");
                            return Err(PriceStreamError::ConnectionClosed);
                        }
                    }
                }
            }
        }
    }

    async fn handle_text_frame(&self, text: &str) -> Result<(), PriceStreamError> {
        metrics::record_stream_frame();
        match self.codec.decode(text) {
            Ok(ticks) if ticks.is_empty() => Ok(()),
            Ok(ticks) => self.emit(PriceStreamEvent::Prices(ticks)).await,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed price frame");
                Ok(())
            }
        }
    }

    async fn emit(&self, event: PriceStreamEvent) -> Result<(), PriceStreamError> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| PriceStreamError::ChannelClosed)
    }
}
