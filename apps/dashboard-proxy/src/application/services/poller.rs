//! Dashboard Poller
//!
//! Refreshes the store on a fixed interval while its token is live: one
//! forecast per city, one price request for all assets, and the news
//! feed. The first refresh runs immediately.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Shortest interval the poller will tick at.
const MIN_INTERVAL: Duration = Duration::from_secs(1);

use super::store::DashboardStore;

/// Poller configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerConfig {
    /// Time between refreshes.
    pub interval: Duration,
    /// Cities always refreshed, in addition to favorites.
    pub cities: Vec<String>,
    /// Assets always refreshed, in addition to favorites.
    pub assets: Vec<String>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            cities: vec!["New York".into(), "London".into(), "Tokyo".into()],
            assets: vec!["bitcoin".into(), "ethereum".into(), "solana".into()],
        }
    }
}

/// Periodic store refresher.
pub struct DashboardPoller {
    store: Arc<DashboardStore>,
    config: PollerConfig,
    cancel: CancellationToken,
}

impl DashboardPoller {
    /// Create a poller.
    #[must_use]
    pub const fn new(store: Arc<DashboardStore>, config: PollerConfig, cancel: CancellationToken) -> Self {
        Self {
            store,
            config,
            cancel,
        }
    }

    /// Refresh until cancelled.
    pub async fn run(self) {
        let interval = self.config.interval.max(MIN_INTERVAL);
        info!(
            interval_secs = interval.as_secs(),
            cities = ?self.config.cities,
            assets = ?self.config.assets,
            "Dashboard poller started"
        );
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    info!("Dashboard poller stopped");
                    return;
                }
                _ = ticker.tick() => self.refresh().await,
            }
        }
    }

    /// Run one refresh of weather, prices and news concurrently.
    pub async fn refresh(&self) {
        let favorites = self.store.favorites();
        let cities = merge(&self.config.cities, &favorites.cities);
        let assets = merge(&self.config.assets, &favorites.cryptocurrencies);

        let weather = join_all(cities.iter().map(|city| self.store.fetch_weather(city)));
        let (weather, crypto, news) =
            tokio::join!(weather, self.store.fetch_crypto(&assets), self.store.fetch_news());

        let weather_failures = weather.iter().filter(|r| r.is_err()).count();
        if weather_failures > 0 || crypto.is_err() || news.is_err() {
            warn!(
                weather_failures,
                crypto_ok = crypto.is_ok(),
                news_ok = news.is_ok(),
                "Dashboard refresh completed with failures"
            );
        } else {
            debug!(cities = cities.len(), assets = assets.len(), "Dashboard refreshed");
        }
    }
}

fn merge(base: &[String], extra: &[String]) -> Vec<String> {
    let mut merged = base.to_vec();
    for item in extra {
        if !merged.contains(item) {
            merged.push(item.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        DashboardApiError, InMemoryFavoritesStorage, MockDashboardApiPort,
    };
    use crate::domain::favorites::FavoritesSet;
    use crate::domain::market::AlertPolicy;
    use crate::domain::news::NewsFeed;

    #[test]
    fn merge_appends_new_items_only() {
        let base = vec!["bitcoin".to_string(), "ethereum".to_string()];
        let extra = vec!["ethereum".to_string(), "cardano".to_string()];
        assert_eq!(merge(&base, &extra), vec!["bitcoin", "ethereum", "cardano"]);
    }

    #[tokio::test]
    async fn refresh_includes_favorites() {
        let mut api = MockDashboardApiPort::new();
        api.expect_weather_forecast()
            .times(2)
            .returning(|_| {
                Err(DashboardApiError::Transport {
                    message: "offline".into(),
                })
            });
        api.expect_crypto_prices()
            .withf(|ids| ids == ["bitcoin", "cardano"])
            .times(1)
            .returning(|_| Ok(std::collections::BTreeMap::new()));
        api.expect_news().times(1).returning(|| {
            Ok(NewsFeed {
                status: "success".into(),
                total_results: 0,
                results: vec![],
            })
        });

        let storage = Arc::new(InMemoryFavoritesStorage::with_favorites(FavoritesSet {
            cities: vec!["Paris".into()],
            cryptocurrencies: vec!["cardano".into()],
        }));
        let store = Arc::new(DashboardStore::new(
            Arc::new(api),
            storage,
            AlertPolicy::default(),
            CancellationToken::new(),
        ));
        let config = PollerConfig {
            interval: Duration::from_secs(60),
            cities: vec!["London".into()],
            assets: vec!["bitcoin".into()],
        };

        DashboardPoller::new(Arc::clone(&store), config, CancellationToken::new())
            .refresh()
            .await;

        let snapshot = store.snapshot();
        assert_eq!(snapshot.weather.error.as_deref(), Some("Request failed: offline"));
        assert_eq!(snapshot.crypto.status, crate::application::services::SliceStatus::Succeeded);
    }

    #[tokio::test]
    async fn run_returns_when_cancelled() {
        let mut api = MockDashboardApiPort::new();
        api.expect_weather_forecast().returning(|_| {
            Err(DashboardApiError::Transport {
                message: "offline".into(),
            })
        });
        api.expect_crypto_prices()
            .returning(|_| Ok(std::collections::BTreeMap::new()));
        api.expect_news().returning(|| {
            Err(DashboardApiError::Transport {
                message: "offline".into(),
            })
        });
        let store = Arc::new(DashboardStore::new(
            Arc::new(api),
            Arc::new(InMemoryFavoritesStorage::new()),
            AlertPolicy::default(),
            CancellationToken::new(),
        ));
        let cancel = CancellationToken::new();
        cancel.cancel();

        tokio::time::timeout(
            Duration::from_secs(1),
            DashboardPoller::new(store, PollerConfig::default(), cancel).run(),
        )
        .await
        .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_is_clamped() {
        let mut api = MockDashboardApiPort::new();
        api.expect_weather_forecast().returning(|_| {
            Err(DashboardApiError::Transport {
                message: "offline".into(),
            })
        });
        api.expect_crypto_prices()
            .returning(|_| Ok(std::collections::BTreeMap::new()));
        api.expect_news().returning(|| {
            Err(DashboardApiError::Transport {
                message: "offline".into(),
            })
        });
        let store = Arc::new(DashboardStore::new(
            Arc::new(api),
            Arc::new(InMemoryFavoritesStorage::new()),
            AlertPolicy::default(),
            CancellationToken::new(),
        ));
        let config = PollerConfig {
            interval: Duration::ZERO,
            ..PollerConfig::default()
        };
        let cancel = CancellationToken::new();
        let poller = tokio::spawn(DashboardPoller::new(store, config, cancel.clone()).run());

        tokio::time::sleep(Duration::from_secs(3)).await;
        cancel.cancel();
        poller.await.unwrap();
    }
}
