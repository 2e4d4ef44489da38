//! Live Price Stream
//!
//! WebSocket feed of asset prices. The client connects, decodes frames and
//! reconnects on loss; the monitor applies prices to the dashboard store.
//!
//! # Components
//!
//! - [`PriceFrameCodec`]: Frame decoding
//! - [`StreamState`]: Reconnection state machine
//! - [`PriceStreamClient`]: Connection loop
//! - [`forward_price_events`]: Applies events to the store

mod client;
mod codec;
mod monitor;
mod reconnect;

pub use client::{PriceStreamClient, PriceStreamConfig, PriceStreamError, PriceStreamEvent};
pub use codec::{PriceFrameCodec, StreamCodecError};
pub use monitor::{StreamStatus, StreamStatusSnapshot, forward_price_events};
pub use reconnect::{ReconnectPolicy, StreamSignal, StreamState};
