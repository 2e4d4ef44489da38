//! Price Frame Codec
//!
//! Decodes price stream frames. A frame is a flat JSON object mapping
//! asset id to price, e.g. `{"bitcoin":"67000.5","ethereum":"3500.12"}`.
//! Prices are normally decimal strings; bare JSON numbers are accepted too.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tracing::warn;

use crate::domain::market::PriceTick;

/// Codec errors.
#[derive(Debug, thiserror::Error)]
pub enum StreamCodecError {
    /// Frame is not valid JSON.
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// Frame is valid JSON but not an object.
    #[error("invalid frame format: expected object, got {0}")]
    InvalidFormat(&'static str),
}

/// Codec for price stream text frames.
#[derive(Debug, Default, Clone, Copy)]
pub struct PriceFrameCodec;

impl PriceFrameCodec {
    /// Create a new codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Decode a frame into price ticks, in key order.
    ///
    /// Entries whose price does not parse as a decimal are skipped with a
    /// warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame is not a JSON object.
    pub fn decode(&self, text: &str) -> Result<Vec<PriceTick>, StreamCodecError> {
        let value: Value = serde_json::from_str(text.trim())?;
        let Value::Object(entries) = value else {
            return Err(StreamCodecError::InvalidFormat(json_kind(&value)));
        };
        Ok(Self::ticks(entries))
    }

    fn ticks(entries: Map<String, Value>) -> Vec<PriceTick> {
        entries
            .into_iter()
            .filter_map(|(asset_id, raw)| match parse_price(&raw) {
                Some(price) => Some(PriceTick { asset_id, price }),
                None => {
                    warn!(asset = %asset_id, value = %raw, "Skipping unparseable price");
                    None
                }
            })
            .collect()
    }
}

fn parse_price(raw: &Value) -> Option<Decimal> {
    match raw {
        Value::String(s) => {
            let s = s.trim();
            Decimal::from_str(s)
                .or_else(|_| Decimal::from_scientific(s))
                .ok()
        }
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        _ => None,
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
