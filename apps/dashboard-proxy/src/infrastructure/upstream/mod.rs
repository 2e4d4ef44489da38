//! Upstream HTTP Clients
//!
//! reqwest implementations of the market data, news and weather ports.
//!
//! # Status Mapping
//!
//! | Response | Error |
//! |----------|-------|
//! | 429 | [`UpstreamError::RateLimited`] |
//! | other non-2xx | [`UpstreamError::Status`] |
//! | undecodable body | [`UpstreamError::InvalidPayload`] |
//! | no response | [`UpstreamError::Network`] |

mod coingecko;
mod newsdata;
mod open_meteo;

use std::time::{Duration, Instant};

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

pub use coingecko::CoinGeckoClient;
pub use newsdata::NewsDataClient;
pub use open_meteo::OpenMeteoClient;

use crate::application::ports::UpstreamError;
use crate::infrastructure::metrics::{self, Provider, UpstreamOutcome};

/// Build the shared HTTP client. `None` disables the request timeout.
///
/// # Errors
///
/// Returns [`UpstreamError::Network`] if the TLS backend fails to
/// initialize.
pub fn build_http_client(timeout: Option<Duration>) -> Result<Client, UpstreamError> {
    let mut builder = Client::builder().user_agent(concat!(
        env!("CARGO_PKG_NAME"),
        "/",
        env!("CARGO_PKG_VERSION")
    ));
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(|e| UpstreamError::Network {
        message: e.to_string(),
    })
}

/// Send `request` and decode a JSON body, recording the outcome for
/// `provider`.
async fn fetch_json<T: DeserializeOwned>(
    provider: Provider,
    request: RequestBuilder,
) -> Result<T, UpstreamError> {
    let started = Instant::now();
    let result = send_and_decode(request).await;
    let outcome = match &result {
        Ok(_) => UpstreamOutcome::Success,
        Err(UpstreamError::RateLimited) => UpstreamOutcome::RateLimited,
        Err(_) => UpstreamOutcome::Error,
    };
    metrics::record_upstream_request(provider, outcome, started.elapsed());
    if let Err(e) = &result {
        tracing::warn!(provider = provider.as_str(), error = %e, "Upstream request failed");
    }
    result
}

async fn send_and_decode<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, UpstreamError> {
    let response = request
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(|e| UpstreamError::Network {
            message: e.to_string(),
        })?;

    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(UpstreamError::RateLimited);
    }
    if !status.is_success() {
        return Err(UpstreamError::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        });
    }

    let body = response.text().await.map_err(|e| UpstreamError::Network {
        message: e.to_string(),
    })?;
    serde_json::from_str(&body).map_err(|e| UpstreamError::invalid_payload(e.to_string()))
}
