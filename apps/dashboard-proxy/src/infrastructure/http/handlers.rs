//! Proxy and Dashboard Handlers

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use serde::Serialize;

use super::AppState;
use crate::application::ports::PriceTable;
use crate::application::services::{
    CacheOutcome, DashboardSnapshot, ForecastParams, HistoricalParams, PriceParams, ProxyError,
};
use crate::domain::favorites::FavoritesSet;
use crate::domain::market::MarketChart;
use crate::domain::news::NewsFeed;
use crate::infrastructure::metrics::{self, Endpoint};
use crate::infrastructure::stream::StreamStatusSnapshot;

/// Cache hint sent with forecasts.
const FORECAST_CACHE_CONTROL: &str = "public, max-age=300";

fn record_outcome(endpoint: Endpoint, outcome: CacheOutcome, entries: usize) {
    metrics::record_cache_lookup(endpoint, outcome.as_str());
    metrics::set_cache_entries(endpoint, entries);
    tracing::debug!(endpoint = endpoint.as_str(), outcome = outcome.as_str(), "Served");
}

// =============================================================================
// Proxy Routes
// =============================================================================

pub(super) async fn crypto(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PriceParams>,
) -> Result<Json<PriceTable>, ProxyError> {
    let proxy = &state.proxies.prices;
    let served = proxy.prices(params).await?;
    record_outcome(Endpoint::LivePrices, served.outcome, proxy.cache().len());
    Ok(Json(served.payload))
}

pub(super) async fn crypto_historical(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoricalParams>,
) -> Result<Json<MarketChart>, ProxyError> {
    let proxy = &state.proxies.historical;
    let served = proxy.historical(params).await?;
    record_outcome(Endpoint::HistoricalPrices, served.outcome, proxy.cache().len());
    Ok(Json(served.payload))
}

pub(super) async fn news(State(state): State<Arc<AppState>>) -> Result<Json<NewsFeed>, ProxyError> {
    let proxy = &state.proxies.news;
    let served = proxy.news().await?;
    record_outcome(Endpoint::News, served.outcome, proxy.cache().len());
    Ok(Json(served.payload))
}

pub(super) async fn weather_forecast(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ForecastParams>,
) -> Result<impl IntoResponse, ProxyError> {
    let served = state.proxies.forecast.forecast(params).await?;
    metrics::record_cache_lookup(Endpoint::WeatherForecast, served.outcome.as_str());
    Ok((
        [(header::CACHE_CONTROL, FORECAST_CACHE_CONTROL)],
        Json(served.payload),
    ))
}

// =============================================================================
// Dashboard Routes
// =============================================================================

/// `/dashboard` response body.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    /// Store contents.
    #[serde(flatten)]
    pub store: DashboardSnapshot,
    /// Price stream status.
    pub stream: StreamStatusSnapshot,
}

pub(super) async fn dashboard(State(state): State<Arc<AppState>>) -> Json<DashboardView> {
    Json(DashboardView {
        store: state.store.snapshot(),
        stream: state.stream.snapshot(),
    })
}

pub(super) async fn favorites(State(state): State<Arc<AppState>>) -> Json<FavoritesSet> {
    Json(state.store.favorites())
}

pub(super) async fn toggle_favorite_city(
    State(state): State<Arc<AppState>>,
    Path(city): Path<String>,
) -> Json<FavoritesSet> {
    state.store.toggle_city(&city);
    Json(state.store.favorites())
}

pub(super) async fn toggle_favorite_cryptocurrency(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<FavoritesSet> {
    state.store.toggle_cryptocurrency(&id);
    Json(state.store.favorites())
}

pub(super) async fn clear_favorites(State(state): State<Arc<AppState>>) -> Json<FavoritesSet> {
    state.store.clear_favorites();
    Json(state.store.favorites())
}

pub(super) async fn clear_errors(State(state): State<Arc<AppState>>) -> Json<DashboardSnapshot> {
    state.store.clear_weather_error();
    state.store.clear_crypto_error();
    Json(state.store.snapshot())
}
