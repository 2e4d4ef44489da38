//! Dashboard Store
//!
//! Client-side state for the dashboard: weather by city, asset prices,
//! news and favorites. Data is fetched through the dashboard API port and
//! live prices are applied from the streaming feed.
//!
//! # Detaching
//!
//! The store is bound to a session token. Once the session is cancelled,
//! new fetches are skipped and results of fetches still in flight are
//! discarded instead of applied. In-flight HTTP requests are not aborted.

mod slices;

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use slices::{CryptoSlice, SliceStatus, WeatherSlice};

use crate::application::ports::{DashboardApiError, DashboardApiPort, FavoritesStoragePort};
use crate::domain::favorites::FavoritesSet;
use crate::domain::market::{AlertPolicy, ArrowRenderer, PriceAlert, PriceChangeRenderer, PriceTick};
use crate::domain::weather::WeatherReport;

/// Capacity of the price alert channel.
const ALERT_CHANNEL_CAPACITY: usize = 64;

/// Read-only view of the whole store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    /// Weather slice.
    pub weather: WeatherSlice,
    /// Crypto slice.
    pub crypto: CryptoSlice,
    /// Favorites.
    pub favorites: FavoritesSet,
}

/// Dashboard state container.
pub struct DashboardStore {
    api: Arc<dyn DashboardApiPort>,
    storage: Arc<dyn FavoritesStoragePort>,
    alert_policy: AlertPolicy,
    session: CancellationToken,
    weather: RwLock<WeatherSlice>,
    crypto: RwLock<CryptoSlice>,
    favorites: Mutex<FavoritesSet>,
    alerts: broadcast::Sender<PriceAlert>,
}

impl DashboardStore {
    /// Create the store and load favorites from storage.
    ///
    /// Unreadable stored favorites are logged and replaced by an empty
    /// set.
    #[must_use]
    pub fn new(
        api: Arc<dyn DashboardApiPort>,
        storage: Arc<dyn FavoritesStoragePort>,
        alert_policy: AlertPolicy,
        session: CancellationToken,
    ) -> Self {
        let favorites = match storage.load() {
            Ok(Some(favorites)) => favorites.deduplicated(),
            Ok(None) => FavoritesSet::default(),
            Err(e) => {
                warn!(error = %e, "Failed to load favorites, starting empty");
                FavoritesSet::default()
            }
        };
        info!(
            cities = favorites.cities.len(),
            cryptocurrencies = favorites.cryptocurrencies.len(),
            "Loaded favorites"
        );

        let (alerts, _) = broadcast::channel(ALERT_CHANNEL_CAPACITY);
        Self {
            api,
            storage,
            alert_policy,
            session,
            weather: RwLock::new(WeatherSlice::default()),
            crypto: RwLock::new(CryptoSlice::default()),
            favorites: Mutex::new(favorites),
            alerts,
        }
    }

    fn is_detached(&self, what: &str) -> bool {
        let detached = self.session.is_cancelled();
        if detached {
            debug!(what, "Store detached, discarding fetch result");
        }
        detached
    }

    // =========================================================================
    // Weather
    // =========================================================================

    /// Fetch the forecast for `city` and store it under that name.
    ///
    /// # Errors
    ///
    /// Returns the API error, which is also recorded on the weather slice.
    pub async fn fetch_weather(&self, city: &str) -> Result<(), DashboardApiError> {
        if self.is_detached("weather") {
            return Ok(());
        }
        self.weather.write().begin_fetch();
        let result = self.api.weather_forecast(city).await;
        if self.is_detached("weather") {
            return result.map(|_| ());
        }

        match result {
            Ok(report) => {
                self.weather
                    .write()
                    .fetch_succeeded(WeatherReport::from_forecast(city, report));
                Ok(())
            }
            Err(e) => {
                warn!(city, error = %e, "Weather fetch failed");
                self.weather.write().fetch_failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Clear the weather failure message.
    pub fn clear_weather_error(&self) {
        self.weather.write().clear_error();
    }

    // =========================================================================
    // Crypto
    // =========================================================================

    /// Fetch live prices for `ids` and merge them into the crypto slice.
    ///
    /// # Errors
    ///
    /// Returns the API error, which is also recorded on the crypto slice.
    pub async fn fetch_crypto(&self, ids: &[String]) -> Result<(), DashboardApiError> {
        if self.is_detached("crypto") {
            return Ok(());
        }
        self.crypto.write().begin_fetch();
        let result = self.api.crypto_prices(ids).await;
        if self.is_detached("crypto") {
            return result.map(|_| ());
        }

        match result {
            Ok(table) => {
                self.crypto.write().fetch_succeeded(table.into_values());
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Crypto fetch failed");
                self.crypto.write().fetch_failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Fetch the news feed.
    ///
    /// # Errors
    ///
    /// Returns the API error, which is also recorded as the news error.
    pub async fn fetch_news(&self) -> Result<(), DashboardApiError> {
        if self.is_detached("news") {
            return Ok(());
        }
        self.crypto.write().begin_news_fetch();
        let result = self.api.news().await;
        if self.is_detached("news") {
            return result.map(|_| ());
        }

        match result {
            Ok(feed) => {
                self.crypto.write().news_succeeded(feed.results);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "News fetch failed");
                self.crypto.write().news_failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Apply a streamed price to an asset already in the store.
    ///
    /// Ticks for unknown assets are ignored. A move past the alert
    /// threshold is logged and broadcast to alert subscribers.
    pub fn update_crypto_price(&self, tick: &PriceTick) -> Option<PriceAlert> {
        let alert = self
            .crypto
            .write()
            .apply_price(&tick.asset_id, tick.price, &self.alert_policy)?;

        warn!(
            asset = %alert.asset_id,
            from = %alert.from,
            to = %alert.to,
            change = %ArrowRenderer.render(alert.change_pct),
            direction = %alert.direction,
            "Price alert"
        );
        if self.alerts.send(alert.clone()).is_err() {
            debug!("No price alert subscribers");
        }
        Some(alert)
    }

    /// Clear the price failure message.
    pub fn clear_crypto_error(&self) {
        self.crypto.write().clear_error();
    }

    /// Subscribe to price alerts.
    #[must_use]
    pub fn subscribe_alerts(&self) -> broadcast::Receiver<PriceAlert> {
        self.alerts.subscribe()
    }

    // =========================================================================
    // Favorites
    // =========================================================================

    /// Toggle a favorite city and persist. Returns `true` if now a favorite.
    pub fn toggle_city(&self, city: &str) -> bool {
        let mut favorites = self.favorites.lock();
        let added = favorites.toggle_city(city);
        self.persist(&favorites);
        added
    }

    /// Toggle a favorite asset and persist. Returns `true` if now a favorite.
    pub fn toggle_cryptocurrency(&self, id: &str) -> bool {
        let mut favorites = self.favorites.lock();
        let added = favorites.toggle_cryptocurrency(id);
        self.persist(&favorites);
        added
    }

    /// Empty both favorite lists and delete the stored record.
    pub fn clear_favorites(&self) {
        let mut favorites = self.favorites.lock();
        *favorites = FavoritesSet::default();
        if let Err(e) = self.storage.remove() {
            warn!(error = %e, "Failed to remove stored favorites");
        }
    }

    fn persist(&self, favorites: &FavoritesSet) {
        if let Err(e) = self.storage.save(favorites) {
            warn!(error = %e, "Failed to persist favorites");
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Current favorites.
    #[must_use]
    pub fn favorites(&self) -> FavoritesSet {
        self.favorites.lock().clone()
    }

    /// Current weather slice.
    #[must_use]
    pub fn weather(&self) -> WeatherSlice {
        self.weather.read().clone()
    }

    /// Current crypto slice.
    #[must_use]
    pub fn crypto(&self) -> CryptoSlice {
        self.crypto.read().clone()
    }

    /// Whole-store snapshot.
    #[must_use]
    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            weather: self.weather(),
            crypto: self.crypto(),
            favorites: self.favorites(),
        }
    }
}
