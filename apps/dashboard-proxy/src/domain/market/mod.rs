//! Market Data Types
//!
//! Cryptocurrency assets as shown on the dashboard, historical market
//! charts, live price ticks and the alert rule applied to them.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Assets
// =============================================================================

/// A tracked cryptocurrency with its latest market figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoAsset {
    /// Upstream identifier, e.g. `bitcoin`.
    pub id: String,
    /// Display name: the id with its first letter capitalized.
    pub name: String,
    /// Ticker: the id uppercased.
    pub symbol: String,
    /// Price in USD.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// 24-hour change in percent.
    #[serde(with = "rust_decimal::serde::float")]
    pub price_change_24h: Decimal,
    /// Market capitalization in USD.
    #[serde(with = "rust_decimal::serde::float")]
    pub market_cap: Decimal,
    /// 24-hour trading volume in USD.
    #[serde(with = "rust_decimal::serde::float")]
    pub volume_24h: Decimal,
}

impl CryptoAsset {
    /// Build an asset from its id and figures, deriving name and symbol.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        price: Decimal,
        price_change_24h: Decimal,
        market_cap: Decimal,
        volume_24h: Decimal,
    ) -> Self {
        let id = id.into();
        Self {
            name: display_name(&id),
            symbol: id.to_uppercase(),
            id,
            price,
            price_change_24h,
            market_cap,
            volume_24h,
        }
    }

    /// Direction of the 24-hour change.
    #[must_use]
    pub fn direction(&self) -> PriceDirection {
        PriceDirection::from_change(self.price_change_24h)
    }
}

/// Capitalize the first character of an asset id.
#[must_use]
pub fn display_name(id: &str) -> String {
    let mut chars = id.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

// =============================================================================
// Direction
// =============================================================================

/// Sign of a price change. Zero counts as up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceDirection {
    /// Change is zero or positive.
    Up,
    /// Change is negative.
    Down,
}

impl PriceDirection {
    /// Classify a signed change.
    #[must_use]
    pub fn from_change(change: Decimal) -> Self {
        if change.is_sign_negative() && !change.is_zero() {
            Self::Down
        } else {
            Self::Up
        }
    }

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl fmt::Display for PriceDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presentation of a signed price change.
pub trait PriceChangeRenderer: Send + Sync {
    /// Glyph for the direction.
    fn arrow(&self, direction: PriceDirection) -> &'static str;

    /// Word for the direction.
    fn label(&self, direction: PriceDirection) -> &'static str {
        direction.as_str()
    }

    /// Render a percentage change, e.g. `▲ 2.50%`.
    fn render(&self, change_pct: Decimal) -> String {
        let direction = PriceDirection::from_change(change_pct);
        format!("{} {:.2}%", self.arrow(direction), change_pct.abs().round_dp(2))
    }
}

/// Triangle arrows.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrowRenderer;

impl PriceChangeRenderer for ArrowRenderer {
    fn arrow(&self, direction: PriceDirection) -> &'static str {
        match direction {
            PriceDirection::Up => "▲",
            PriceDirection::Down => "▼",
        }
    }
}

// =============================================================================
// Market Chart
// =============================================================================

/// A `[timestamp_ms, value]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint(pub i64, pub f64);

/// Historical series for one asset over a day range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketChart {
    /// Price series. Always present.
    pub prices: Vec<ChartPoint>,
    /// Market cap series.
    #[serde(default)]
    pub market_caps: Vec<ChartPoint>,
    /// Volume series.
    #[serde(default)]
    pub total_volumes: Vec<ChartPoint>,
}

// =============================================================================
// Live Ticks and Alerts
// =============================================================================

/// A single price update from the streaming feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceTick {
    /// Asset id.
    pub asset_id: String,
    /// New price in USD.
    pub price: Decimal,
}

/// A notable price move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceAlert {
    /// Asset id.
    pub asset_id: String,
    /// Price the move is measured from.
    pub from: Decimal,
    /// Price that triggered the alert.
    pub to: Decimal,
    /// Move in percent, signed.
    pub change_pct: Decimal,
    /// Direction of the move.
    pub direction: PriceDirection,
}

/// Threshold rule for price alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertPolicy {
    /// Minimum absolute move, in percent, that raises an alert.
    pub threshold_pct: Decimal,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            threshold_pct: Decimal::from(5),
        }
    }
}

impl AlertPolicy {
    /// Create a policy with the given threshold.
    #[must_use]
    pub const fn new(threshold_pct: Decimal) -> Self {
        Self { threshold_pct }
    }

    /// Compare `price` with `reference` and raise an alert if the move is
    /// at least the threshold. A zero reference never alerts, nor does a
    /// move too large to represent.
    #[must_use]
    pub fn evaluate(&self, asset_id: &str, reference: Decimal, price: Decimal) -> Option<PriceAlert> {
        if reference.is_zero() {
            return None;
        }
        let Some(change_pct) = price
            .checked_sub(reference)
            .and_then(|delta| delta.checked_div(reference))
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        else {
            tracing::warn!(
                asset = asset_id,
                %reference,
                %price,
                "Price change out of range, skipping alert"
            );
            return None;
        };
        if change_pct.abs() < self.threshold_pct {
            return None;
        }
        Some(PriceAlert {
            asset_id: asset_id.to_string(),
            from: reference,
            to: price,
            change_pct,
            direction: PriceDirection::from_change(change_pct),
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
