//! Store Slices
//!
//! Pure state holders for the weather and crypto parts of the store. Each
//! fetch moves a slice through `loading` to `succeeded` or `failed`; a
//! failure records its message and leaves previously loaded data intact.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::market::{AlertPolicy, CryptoAsset, PriceAlert};
use crate::domain::news::NewsArticle;
use crate::domain::weather::WeatherReport;

/// Fetch lifecycle of a slice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SliceStatus {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// A request is in flight.
    Loading,
    /// Last request succeeded.
    Succeeded,
    /// Last request failed.
    Failed,
}

// =============================================================================
// Weather
// =============================================================================

/// Weather reports keyed by requested city name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeatherSlice {
    /// Reports by city.
    pub data: BTreeMap<String, WeatherReport>,
    /// Fetch status.
    pub status: SliceStatus,
    /// Message of the last failure.
    pub error: Option<String>,
}

impl WeatherSlice {
    /// A fetch started.
    pub fn begin_fetch(&mut self) {
        self.status = SliceStatus::Loading;
        self.error = None;
    }

    /// A fetch returned a report.
    pub fn fetch_succeeded(&mut self, report: WeatherReport) {
        self.data
            .insert(report.snapshot.city_name.clone(), report);
        self.status = SliceStatus::Succeeded;
    }

    /// A fetch failed.
    pub fn fetch_failed(&mut self, message: String) {
        self.status = SliceStatus::Failed;
        self.error = Some(message);
    }

    /// Drop the recorded failure message.
    pub fn clear_error(&mut self) {
        self.error = None;
    }
}

// =============================================================================
// Crypto
// =============================================================================

/// Asset prices and the news feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoSlice {
    /// Assets by id.
    pub data: BTreeMap<String, CryptoAsset>,
    /// Price fetch status.
    pub status: SliceStatus,
    /// Message of the last price failure.
    pub error: Option<String>,
    /// Latest articles.
    pub news: Vec<NewsArticle>,
    /// News fetch status.
    pub news_status: SliceStatus,
    /// Message of the last news failure.
    pub news_error: Option<String>,
    #[serde(skip)]
    alert_references: HashMap<String, Decimal>,
}

impl CryptoSlice {
    /// A price fetch started.
    pub fn begin_fetch(&mut self) {
        self.status = SliceStatus::Loading;
        self.error = None;
    }

    /// A price fetch returned. Merges the assets and resets their alert
    /// reference prices.
    pub fn fetch_succeeded(&mut self, assets: impl IntoIterator<Item = CryptoAsset>) {
        for asset in assets {
            self.alert_references.insert(asset.id.clone(), asset.price);
            self.data.insert(asset.id.clone(), asset);
        }
        self.status = SliceStatus::Succeeded;
    }

    /// A price fetch failed.
    pub fn fetch_failed(&mut self, message: String) {
        self.status = SliceStatus::Failed;
        self.error = Some(message);
    }

    /// A news fetch started.
    pub fn begin_news_fetch(&mut self) {
        self.news_status = SliceStatus::Loading;
        self.news_error = None;
    }

    /// A news fetch returned.
    pub fn news_succeeded(&mut self, articles: Vec<NewsArticle>) {
        self.news = articles;
        self.news_status = SliceStatus::Succeeded;
    }

    /// A news fetch failed.
    pub fn news_failed(&mut self, message: String) {
        self.news_status = SliceStatus::Failed;
        self.news_error = Some(message);
    }

    /// Drop the recorded price failure message.
    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Apply a streamed price. Ignored for assets not already present.
    ///
    /// Returns an alert when the price has moved past the policy threshold
    /// since the reference price; the reference then moves to `price`.
    pub fn apply_price(&mut self, id: &str, price: Decimal, policy: &AlertPolicy) -> Option<PriceAlert> {
        let asset = self.data.get_mut(id)?;
        asset.price = price;

        let reference = *self
            .alert_references
            .entry(id.to_string())
            .or_insert(price);
        let alert = policy.evaluate(id, reference, price);
        if alert.is_some() {
            self.alert_references.insert(id.to_string(), price);
        }
        alert
    }
}
