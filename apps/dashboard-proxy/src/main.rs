//! Dashboard Proxy Binary
//!
//! Starts the proxy routes, the dashboard store with its poller, and the
//! live price stream.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin dashboard-proxy
//! ```
//!
//! # Environment Variables
//!
//! All optional.
//! - `DASHBOARD_HTTP_PORT`: HTTP port (default: 3000)
//! - `NEWSDATA_API_KEY`: NewsData.io key; `/news` fails without it
//! - `COINGECKO_BASE_URL`, `NEWSDATA_BASE_URL`, `OPEN_METEO_FORECAST_URL`,
//!   `OPEN_METEO_GEOCODING_URL`: Upstream endpoints
//! - `UPSTREAM_TIMEOUT_SECS`: Upstream request timeout (default: none)
//! - `PRICE_STREAM_URL`: Price feed (default: wss://ws.coincap.io/prices)
//! - `PRICE_STREAM_ASSETS`: Streamed assets (default: bitcoin,ethereum,solana)
//! - `PRICE_STREAM_RECONNECT_DELAY_MS`: Reconnect delay (default: 3000)
//! - `PRICE_STREAM_MAX_RECONNECT_ATTEMPTS`: Reconnect attempts (default: 5)
//! - `DASHBOARD_POLL_INTERVAL_SECS`: Store refresh interval (default: 60)
//! - `DASHBOARD_CITIES`: Polled cities (default: New York,London,Tokyo)
//! - `FAVORITES_PATH`: Favorites document (default: ./favorites.json)
//! - `PRICE_ALERT_THRESHOLD_PCT`: Alert threshold (default: 5)
//! - `OTEL_ENABLED`, `OTEL_EXPORTER_OTLP_ENDPOINT`, `OTEL_SERVICE_NAME`: Tracing export
//! - `RUST_LOG`: Log filter (default: dashboard_proxy=info)

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use dashboard_proxy::application::ports::SystemClock;
use dashboard_proxy::infrastructure::client::HttpDashboardApi;
use dashboard_proxy::infrastructure::persistence::JsonFileFavoritesStorage;
use dashboard_proxy::infrastructure::telemetry;
use dashboard_proxy::infrastructure::upstream::{
    CoinGeckoClient, NewsDataClient, OpenMeteoClient, build_http_client,
};
use dashboard_proxy::{
    AppState, DashboardConfig, DashboardPoller, DashboardStore, HttpServer, PriceStreamClient,
    ProxyServices, StreamStatus, forward_price_events, init_metrics,
};
use tokio::signal;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Graceful shutdown timeout.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Capacity of the price event channel.
const PRICE_EVENT_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    load_dotenv();

    let _telemetry_guard = telemetry::init();

    tracing::info!("Starting Dashboard Proxy");

    if let Err(e) = init_metrics() {
        tracing::warn!(error = %e, "Metrics recorder unavailable");
    }

    let config = DashboardConfig::from_env().context("invalid configuration")?;
    log_config(&config);

    let shutdown_token = CancellationToken::new();

    // Upstream providers and proxy services
    let http = build_http_client(config.upstream.timeout).context("failed to build HTTP client")?;
    let proxies = Arc::new(ProxyServices::new(
        Arc::new(CoinGeckoClient::new(
            http.clone(),
            config.upstream.coingecko_base_url.clone(),
        )),
        Arc::new(NewsDataClient::new(
            http.clone(),
            config.upstream.newsdata_base_url.clone(),
            config.upstream.newsdata_api_key.clone(),
        )),
        Arc::new(OpenMeteoClient::new(
            http.clone(),
            config.upstream.open_meteo_forecast_url.clone(),
            config.upstream.open_meteo_geocoding_url.clone(),
        )),
        Arc::new(SystemClock),
        config.pacing,
    ));

    // Dashboard store, fetching through this service's own routes
    let api = HttpDashboardApi::new(
        http,
        format!("http://127.0.0.1:{}", config.server.http_port),
    );
    let store = Arc::new(DashboardStore::new(
        Arc::new(api),
        Arc::new(JsonFileFavoritesStorage::new(
            config.dashboard.favorites_path.clone(),
        )),
        config.alert_policy(),
        shutdown_token.child_token(),
    ));
    let stream_status = Arc::new(StreamStatus::new());

    // Bind before anything fetches through the routes
    let app_state = Arc::new(AppState::new(
        Arc::clone(&proxies),
        Arc::clone(&store),
        Arc::clone(&stream_status),
        shutdown_token.clone(),
    ));
    let http_server = HttpServer::new(
        config.server.http_port,
        app_state,
        shutdown_token.clone(),
    );
    let listener = http_server.bind().await?;

    let mut tasks = JoinSet::new();

    tasks.spawn(async move {
        if let Err(e) = http_server.serve(listener).await {
            tracing::error!(error = %e, "HTTP server error");
        }
    });

    // Price stream
    let (price_tx, price_rx) = mpsc::channel(PRICE_EVENT_CAPACITY);
    let price_client = Arc::new(PriceStreamClient::new(
        config.price_stream(),
        price_tx,
        shutdown_token.clone(),
    ));
    tasks.spawn(forward_price_events(
        price_rx,
        Arc::clone(&store),
        Arc::clone(&stream_status),
    ));
    tasks.spawn(async move {
        if let Err(e) = price_client.run().await {
            tracing::error!(error = %e, "Price stream error");
        }
    });

    // Poller
    let poller = DashboardPoller::new(Arc::clone(&store), config.poller(), shutdown_token.clone());
    tasks.spawn(poller.run());

    tracing::info!("Dashboard proxy ready");

    await_shutdown(shutdown_token).await;

    if tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
        while tasks.join_next().await.is_some() {}
    })
    .await
    .is_err()
    {
        tracing::warn!("Shutdown timed out, aborting remaining tasks");
        tasks.abort_all();
    }

    tracing::info!("Dashboard proxy stopped");
    Ok(())
}

/// Log the parsed configuration.
fn log_config(config: &DashboardConfig) {
    tracing::info!(
        http_port = config.server.http_port,
        poll_interval_secs = config.dashboard.poll_interval.as_secs(),
        cities = ?config.dashboard.cities,
        assets = ?config.stream.assets,
        news_configured = config.upstream.newsdata_api_key.is_some(),
        "Configuration loaded"
    );
    tracing::debug!(
        coingecko = %config.upstream.coingecko_base_url,
        newsdata = %config.upstream.newsdata_base_url,
        price_stream = %config.stream.url,
        favorites_path = %config.dashboard.favorites_path.display(),
        "Endpoints"
    );
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();

    tracing::info!(
        timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
        "Graceful shutdown started"
    );
}
