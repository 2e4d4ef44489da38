//! CoinGecko Client
//!
//! Simple price and market chart endpoints of the CoinGecko v3 API.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Client, Url};
use rust_decimal::Decimal;
use serde::Deserialize;

use super::fetch_json;
use crate::application::ports::{MarketDataPort, PriceQuery, PriceTable, UpstreamError};
use crate::domain::market::{CryptoAsset, MarketChart};
use crate::infrastructure::metrics::Provider;

/// One entry of a `/simple/price` response. Missing figures read as zero.
#[derive(Debug, Default, Deserialize)]
struct SimplePrice {
    #[serde(default, with = "rust_decimal::serde::float_option")]
    usd: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    usd_24h_change: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    usd_market_cap: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    usd_24h_vol: Option<Decimal>,
}

impl SimplePrice {
    fn into_asset(self, id: &str) -> CryptoAsset {
        CryptoAsset::new(
            id,
            self.usd.unwrap_or_default(),
            self.usd_24h_change.unwrap_or_default(),
            self.usd_market_cap.unwrap_or_default(),
            self.usd_24h_vol.unwrap_or_default(),
        )
    }
}

/// CoinGecko market data client.
#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    http: Client,
    base_url: String,
}

impl CoinGeckoClient {
    /// Create a client against `base_url` (e.g. `https://api.coingecko.com/api/v3`).
    #[must_use]
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// `{base}/coins/{id}/market_chart` with `id` escaped as a single path
    /// segment.
    fn market_chart_url(&self, id: &str) -> Result<Url, UpstreamError> {
        let invalid_base = || UpstreamError::Network {
            message: format!("invalid CoinGecko base URL: {}", self.base_url),
        };
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid_base())?;
        url.path_segments_mut()
            .map_err(|()| invalid_base())?
            .pop_if_empty()
            .extend(["coins", id, "market_chart"]);
        Ok(url)
    }
}

#[async_trait]
impl MarketDataPort for CoinGeckoClient {
    async fn simple_prices(&self, query: &PriceQuery) -> Result<PriceTable, UpstreamError> {
        let ids = query.ids.join(",");
        let request = self
            .http
            .get(format!("{}/simple/price", self.base_url))
            .query(&[
                ("ids", ids.as_str()),
                ("vs_currencies", query.vs_currencies.as_str()),
                ("include_24hr_change", query.include_24hr_change.as_str()),
                ("include_market_cap", query.include_market_cap.as_str()),
                ("include_24hr_vol", query.include_24hr_vol.as_str()),
            ]);

        let mut raw: HashMap<String, SimplePrice> = fetch_json(Provider::CoinGecko, request).await?;

        let mut table: PriceTable = query
            .ids
            .iter()
            .map(|id| {
                let price = raw.remove(id).unwrap_or_default();
                (id.clone(), price.into_asset(id))
            })
            .collect();
        table.extend(raw.into_iter().map(|(id, price)| {
            let asset = price.into_asset(&id);
            (id, asset)
        }));
        tracing::debug!(assets = table.len(), "Fetched simple prices");
        Ok(table)
    }

    async fn market_chart(&self, id: &str, days: u32) -> Result<MarketChart, UpstreamError> {
        let days = days.to_string();
        let request = self
            .http
            .get(self.market_chart_url(id)?)
            .query(&[("vs_currency", "usd"), ("days", days.as_str())]);

        let chart: MarketChart = fetch_json(Provider::CoinGecko, request).await?;
        tracing::debug!(id, points = chart.prices.len(), "Fetched market chart");
        Ok(chart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> CoinGeckoClient {
        CoinGeckoClient::new(Client::new(), format!("{}/", server.uri()))
    }

    #[tokio::test]
    async fn simple_prices_formats_assets() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/simple/price"))
            .and(query_param("ids", "bitcoin,ethereum"))
            .and(query_param("vs_currencies", "usd"))
            .and(query_param("include_24hr_vol", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "bitcoin": {
                    "usd": 67000.5,
                    "usd_24h_change": -1.25,
                    "usd_market_cap": 1_300_000_000_000_u64,
                    "usd_24h_vol": 25_000_000_000_u64
                }
            })))
            .mount(&server)
            .await;

        let query = PriceQuery::usd(vec!["bitcoin".into(), "ethereum".into()]);
        let table = client(&server).simple_prices(&query).await.unwrap();

        let bitcoin = &table["bitcoin"];
        assert_eq!(bitcoin.name, "Bitcoin");
        assert_eq!(bitcoin.symbol, "BITCOIN");
        assert_eq!(bitcoin.price, Decimal::new(670_005, 1));
        assert_eq!(bitcoin.price_change_24h, Decimal::new(-125, 2));

        let ethereum = &table["ethereum"];
        assert_eq!(ethereum.price, Decimal::ZERO);
        assert_eq!(ethereum.volume_24h, Decimal::ZERO);
    }

    #[tokio::test]
    async fn rate_limit_maps_to_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/simple/price"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = client(&server)
            .simple_prices(&PriceQuery::usd(vec!["bitcoin".into()]))
            .await
            .unwrap_err();
        assert_eq!(err, UpstreamError::RateLimited);
    }

    #[tokio::test]
    async fn server_error_maps_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client(&server).market_chart("bitcoin", 7).await.unwrap_err();
        assert_eq!(
            err,
            UpstreamError::Status {
                status: 503,
                reason: "Service Unavailable".to_string()
            }
        );
    }

    #[tokio::test]
    async fn market_chart_decodes_series() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/coins/bitcoin/market_chart"))
            .and(query_param("vs_currency", "usd"))
            .and(query_param("days", "7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "prices": [[1_711_929_600_000_i64, 70000.5]],
                "market_caps": [[1_711_929_600_000_i64, 1.3e12]],
                "total_volumes": []
            })))
            .mount(&server)
            .await;

        let chart = client(&server).market_chart("bitcoin", 7).await.unwrap();
        assert_eq!(chart.prices.len(), 1);
        assert_eq!(chart.market_caps.len(), 1);
    }

    #[test]
    fn market_chart_id_stays_one_path_segment() {
        let client = CoinGeckoClient::new(Client::new(), "https://api.coingecko.com/api/v3/");
        let url = client.market_chart_url("bitcoin/../simple?x=1#y").unwrap();
        assert_eq!(url.path(), "/api/v3/coins/bitcoin%2F..%2Fsimple%3Fx=1%23y/market_chart");
        assert!(url.query().is_none());
        assert!(url.fragment().is_none());

        let local = CoinGeckoClient::new(Client::new(), "http://127.0.0.1:8080");
        assert_eq!(
            local.market_chart_url("bitcoin").unwrap().as_str(),
            "http://127.0.0.1:8080/coins/bitcoin/market_chart"
        );
    }

    #[tokio::test]
    async fn market_chart_without_prices_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/coins/bitcoin/market_chart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "coin not found"})))
            .mount(&server)
            .await;

        let err = client(&server).market_chart("bitcoin", 7).await.unwrap_err();
        assert!(matches!(err, UpstreamError::InvalidPayload { .. }));
    }
}
