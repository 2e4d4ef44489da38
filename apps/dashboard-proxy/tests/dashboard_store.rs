//! Dashboard Store Integration Tests
//!
//! Runs the full loop: upstream providers on wiremock, the proxy served
//! over a real socket, and the store fetching through its HTTP client.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dashboard_proxy::application::ports::SystemClock;
use dashboard_proxy::application::services::store::SliceStatus;
use dashboard_proxy::infrastructure::client::HttpDashboardApi;
use dashboard_proxy::infrastructure::config::ApiKey;
use dashboard_proxy::infrastructure::persistence::JsonFileFavoritesStorage;
use dashboard_proxy::infrastructure::upstream::{CoinGeckoClient, NewsDataClient, OpenMeteoClient};
use dashboard_proxy::{
    AlertPolicy, AppState, DashboardPoller, DashboardStore, HttpServer, PollerConfig, ProxyPacing,
    ProxyServices, StreamStatus,
};

/// Mount happy-path responses for every provider.
async fn mount_providers(upstream: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/simple/price"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bitcoin": {"usd": 67000.0, "usd_24h_change": -1.25, "usd_market_cap": 1.3e12, "usd_24h_vol": 2.0e10}
        })))
        .mount(upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/news"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "totalResults": 1,
            "results": [{"title": "Bitcoin steady", "pubDate": "2024-04-01 09:00:00"}]
        })))
        .mount(upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"name": "Tokyo", "country": "Japan", "latitude": 35.69, "longitude": 139.69}]
        })))
        .mount(upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hourly": {
                "time": ["2024-04-01T00:00"],
                "temperature_2m": [15.0],
                "relative_humidity_2m": [70.0],
                "wind_speed_10m": [8.0],
                "pressure_msl": [1009.0],
                "weather_code": [61]
            },
            "daily": {
                "time": ["2024-04-01"],
                "temperature_2m_max": [17.0],
                "temperature_2m_min": [10.0],
                "precipitation_probability_max": [80.0]
            }
        })))
        .mount(upstream)
        .await;
}

struct Stack {
    _upstream: MockServer,
    proxy_url: String,
    shutdown: CancellationToken,
    _dir: tempfile::TempDir,
}

impl Stack {
    /// Serve the proxy on an ephemeral port in front of mocked providers.
    async fn start(news_key: Option<&str>) -> Self {
        let upstream = MockServer::start().await;
        mount_providers(&upstream).await;

        let http = reqwest::Client::new();
        let proxies = ProxyServices::new(
            Arc::new(CoinGeckoClient::new(http.clone(), upstream.uri())),
            Arc::new(NewsDataClient::new(
                http.clone(),
                format!("{}/news", upstream.uri()),
                news_key.map(|k| ApiKey::new(k.to_string())),
            )),
            Arc::new(OpenMeteoClient::new(
                http,
                format!("{}/v1/forecast", upstream.uri()),
                format!("{}/v1/search", upstream.uri()),
            )),
            Arc::new(SystemClock),
            ProxyPacing::immediate(),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let proxy_url = format!("http://{}", listener.local_addr().unwrap());
        let dir = tempfile::tempdir().unwrap();
        let shutdown = CancellationToken::new();

        let served_store = DashboardStore::new(
            Arc::new(HttpDashboardApi::new(reqwest::Client::new(), proxy_url.clone())),
            Arc::new(JsonFileFavoritesStorage::new(dir.path().join("server-favorites.json"))),
            AlertPolicy::default(),
            shutdown.child_token(),
        );
        let state = Arc::new(AppState::new(
            Arc::new(proxies),
            Arc::new(served_store),
            Arc::new(StreamStatus::new()),
            shutdown.clone(),
        ));
        let server = HttpServer::new(0, state, shutdown.clone());
        tokio::spawn(server.serve(listener));

        Self {
            _upstream: upstream,
            proxy_url,
            shutdown,
            _dir: dir,
        }
    }

    fn store(&self, favorites_path: &Path, session: CancellationToken) -> Arc<DashboardStore> {
        Arc::new(DashboardStore::new(
            Arc::new(HttpDashboardApi::new(reqwest::Client::new(), self.proxy_url.clone())),
            Arc::new(JsonFileFavoritesStorage::new(favorites_path)),
            AlertPolicy::default(),
            session,
        ))
    }
}

impl Drop for Stack {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn poller_config() -> PollerConfig {
    PollerConfig {
        interval: Duration::from_secs(60),
        cities: vec!["Tokyo".to_string()],
        assets: vec!["bitcoin".to_string()],
    }
}

#[tokio::test]
async fn refresh_fills_every_slice() {
    let stack = Stack::start(Some("secret")).await;
    let dir = tempfile::tempdir().unwrap();
    let store = stack.store(&dir.path().join("favorites.json"), CancellationToken::new());

    DashboardPoller::new(Arc::clone(&store), poller_config(), CancellationToken::new())
        .refresh()
        .await;

    let weather = store.weather();
    assert_eq!(weather.status, SliceStatus::Succeeded);
    let tokyo = &weather.data["Tokyo"];
    assert_eq!(tokyo.snapshot.temperature_c, 15.0);
    assert_eq!(tokyo.snapshot.condition_description, "slight rain");
    assert_eq!(tokyo.forecast.as_ref().unwrap().daily.len(), 1);

    let crypto = store.crypto();
    assert_eq!(crypto.status, SliceStatus::Succeeded);
    let bitcoin = &crypto.data["bitcoin"];
    assert_eq!(bitcoin.price, Decimal::from(67000));
    assert_eq!(bitcoin.symbol, "BITCOIN");

    assert_eq!(crypto.news_status, SliceStatus::Succeeded);
    assert_eq!(crypto.news.len(), 1);
    assert_eq!(crypto.news[0].published_at, "2024-04-01T09:00:00.000Z");
}

#[tokio::test]
async fn failed_news_is_recorded_on_the_slice() {
    let stack = Stack::start(None).await;
    let dir = tempfile::tempdir().unwrap();
    let store = stack.store(&dir.path().join("favorites.json"), CancellationToken::new());

    assert!(store.fetch_news().await.is_err());

    let crypto = store.crypto();
    assert_eq!(crypto.news_status, SliceStatus::Failed);
    assert_eq!(crypto.news_error.as_deref(), Some("Failed to fetch news"));
    assert!(crypto.news.is_empty());

    store.clear_crypto_error();
    store.fetch_crypto(&["bitcoin".to_string()]).await.unwrap();
    assert_eq!(store.crypto().news_error.as_deref(), Some("Failed to fetch news"));
}

#[tokio::test]
async fn favorites_survive_a_new_store() {
    let stack = Stack::start(Some("secret")).await;
    let dir = tempfile::tempdir().unwrap();
    let favorites_path = dir.path().join("favorites.json");
    std::fs::write(&favorites_path, r#"{"theme":"dark"}"#).unwrap();

    let store = stack.store(&favorites_path, CancellationToken::new());
    assert!(store.toggle_city("Paris"));
    assert!(store.toggle_cryptocurrency("dogecoin"));
    assert!(store.toggle_city("Oslo"));
    assert!(!store.toggle_city("Paris"));

    let reopened = stack.store(&favorites_path, CancellationToken::new());
    assert_eq!(reopened.favorites(), store.favorites());
    assert_eq!(reopened.favorites().cities, vec!["Oslo".to_string()]);
    assert_eq!(reopened.favorites().cryptocurrencies, vec!["dogecoin".to_string()]);

    reopened.clear_favorites();
    let document: Value = serde_json::from_str(&std::fs::read_to_string(&favorites_path).unwrap()).unwrap();
    assert_eq!(document, json!({"theme": "dark"}));
    assert!(stack.store(&favorites_path, CancellationToken::new()).favorites().cities.is_empty());
}

#[tokio::test]
async fn detached_store_discards_results() {
    let stack = Stack::start(Some("secret")).await;
    let dir = tempfile::tempdir().unwrap();
    let session = CancellationToken::new();
    let store = stack.store(&dir.path().join("favorites.json"), session.clone());

    session.cancel();
    DashboardPoller::new(Arc::clone(&store), poller_config(), CancellationToken::new())
        .refresh()
        .await;

    let snapshot = store.snapshot();
    assert!(snapshot.weather.data.is_empty());
    assert!(snapshot.crypto.data.is_empty());
    assert!(snapshot.crypto.news.is_empty());
    assert_eq!(snapshot.weather.status, SliceStatus::Idle);
    assert_eq!(snapshot.crypto.status, SliceStatus::Idle);
    assert_eq!(snapshot.crypto.news_status, SliceStatus::Idle);
}
