//! Dashboard API Client
//!
//! reqwest implementation of [`DashboardApiPort`] against this service's
//! own proxy routes. Error envelopes (`{"error": "..."}`) become
//! [`DashboardApiError::Status`] carrying the envelope message.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::application::ports::{DashboardApiError, DashboardApiPort, PriceTable};
use crate::domain::market::MarketChart;
use crate::domain::news::NewsFeed;
use crate::domain::weather::ForecastReport;

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: String,
}

/// HTTP client for the proxy endpoints.
#[derive(Debug, Clone)]
pub struct HttpDashboardApi {
    http: Client,
    base_url: String,
}

impl HttpDashboardApi {
    /// Create a client for the proxy at `base_url`, e.g. `http://127.0.0.1:3000`.
    #[must_use]
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, DashboardApiError> {
        let response = self
            .http
            .get(format!("{}{path}", self.base_url))
            .query(query)
            .send()
            .await
            .map_err(|e| DashboardApiError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| DashboardApiError::Transport {
                message: e.to_string(),
            })?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorEnvelope>(&body).map_or_else(
                |_| format!("HTTP {}", status.as_u16()),
                |envelope| envelope.error,
            );
            return Err(DashboardApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&body).map_err(|e| DashboardApiError::Decode {
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl DashboardApiPort for HttpDashboardApi {
    async fn crypto_prices(&self, ids: &[String]) -> Result<PriceTable, DashboardApiError> {
        let ids = ids.join(",");
        self.get_json("/crypto", &[("ids", ids.as_str())]).await
    }

    async fn historical_prices(&self, id: &str, days: u32) -> Result<MarketChart, DashboardApiError> {
        let days = days.to_string();
        self.get_json("/crypto/historical", &[("id", id), ("days", days.as_str())])
            .await
    }

    async fn news(&self) -> Result<NewsFeed, DashboardApiError> {
        self.get_json("/news", &[]).await
    }

    async fn weather_forecast(&self, city: &str) -> Result<ForecastReport, DashboardApiError> {
        self.get_json("/weather/forecast", &[("id", city)]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api(server: &MockServer) -> HttpDashboardApi {
        HttpDashboardApi::new(Client::new(), server.uri())
    }

    #[tokio::test]
    async fn crypto_prices_decodes_table() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/crypto"))
            .and(query_param("ids", "bitcoin,solana"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "bitcoin": {
                    "id": "bitcoin", "name": "Bitcoin", "symbol": "BITCOIN",
                    "price": 67000.5, "priceChange24h": 1.5, "marketCap": 0, "volume24h": 0
                }
            })))
            .mount(&server)
            .await;

        let table = api(&server)
            .crypto_prices(&["bitcoin".into(), "solana".into()])
            .await
            .unwrap();
        assert_eq!(table["bitcoin"].name, "Bitcoin");
    }

    #[tokio::test]
    async fn error_envelope_becomes_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather/forecast"))
            .and(query_param("id", "Atlantis"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Location not found"})))
            .mount(&server)
            .await;

        let err = api(&server).weather_forecast("Atlantis").await.unwrap_err();
        assert_eq!(
            err,
            DashboardApiError::Status {
                status: 404,
                message: "Location not found".to_string()
            }
        );
        assert_eq!(err.to_string(), "Location not found");
    }

    #[tokio::test]
    async fn error_without_envelope_uses_status_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = api(&server).news().await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP 502");
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/crypto/historical"))
            .and(query_param("days", "30"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = api(&server).historical_prices("bitcoin", 30).await.unwrap_err();
        assert!(matches!(err, DashboardApiError::Decode { .. }));
    }
}
