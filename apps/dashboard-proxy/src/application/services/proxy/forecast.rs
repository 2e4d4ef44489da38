//! Weather forecast proxy (`/weather/forecast`).
//!
//! Not cached. A place name is geocoded, then the forecast is fetched for
//! the first match.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::{CacheOutcome, ProxyError, Served};
use crate::application::ports::{UpstreamError, WeatherPort};
use crate::domain::weather::ForecastReport;

const MISSING_LOCATION: &str = "Missing location ID";

/// Query parameters accepted by `/weather/forecast`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastParams {
    /// Free-text place name.
    pub id: Option<String>,
}

impl ForecastParams {
    /// Parameters for `place`.
    #[must_use]
    pub fn new(place: &str) -> Self {
        Self {
            id: Some(place.to_string()),
        }
    }
}

/// Proxy over the geocoding and forecast providers.
pub struct ForecastProxy {
    upstream: Arc<dyn WeatherPort>,
}

impl ForecastProxy {
    /// Create the proxy.
    #[must_use]
    pub fn new(upstream: Arc<dyn WeatherPort>) -> Self {
        Self { upstream }
    }

    /// Geocode the place and fetch its forecast.
    ///
    /// # Errors
    ///
    /// - `BadRequest` when `id` is absent
    /// - `LocationNotFound` when the geocoder has no match
    /// - `RateLimited` when either provider answers 429
    /// - `Upstream` with the provider's error message otherwise
    #[instrument(skip(self, params), fields(place = ?params.id))]
    pub async fn forecast(&self, params: ForecastParams) -> Result<Served<ForecastReport>, ProxyError> {
        let place = params.id.as_deref().map(str::trim).unwrap_or_default();
        if place.is_empty() {
            return Err(ProxyError::bad_request(MISSING_LOCATION));
        }

        let location = self
            .upstream
            .geocode(place)
            .await
            .map_err(|e| upstream_failure("Geocoding", &e))?
            .ok_or(ProxyError::LocationNotFound)?;
        debug!(
            name = %location.name,
            latitude = location.latitude,
            longitude = location.longitude,
            "Resolved location"
        );

        let report = self
            .upstream
            .forecast(&location)
            .await
            .map_err(|e| upstream_failure("Forecast", &e))?;

        Ok(Served {
            payload: report,
            outcome: CacheOutcome::Passthrough,
        })
    }
}

fn upstream_failure(stage: &str, error: &UpstreamError) -> ProxyError {
    warn!(stage, error = %error, "Weather upstream failed");
    if error.is_rate_limited() {
        ProxyError::RateLimited
    } else {
        ProxyError::Upstream {
            message: format!("{stage} request failed: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::MockWeatherPort;
    use crate::domain::weather::{CurrentConditions, Location};

    fn paris() -> Location {
        Location {
            name: "Paris".to_string(),
            country: Some("France".to_string()),
            latitude: 48.85,
            longitude: 2.35,
        }
    }

    fn report(location: Location) -> ForecastReport {
        ForecastReport {
            current: CurrentConditions {
                temperature: 18.0,
                humidity: 55.0,
                wind_speed: 10.0,
                pressure: 1012.0,
                condition: "clear sky".to_string(),
            },
            hourly: vec![],
            daily: vec![],
            location,
        }
    }

    #[tokio::test]
    async fn missing_place_is_bad_request() {
        let proxy = ForecastProxy::new(Arc::new(MockWeatherPort::new()));
        let err = proxy.forecast(ForecastParams::default()).await.unwrap_err();
        assert_eq!(err, ProxyError::bad_request("Missing location ID"));
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn unknown_place_is_not_found() {
        let mut upstream = MockWeatherPort::new();
        upstream.expect_geocode().times(1).returning(|_| Ok(None));
        upstream.expect_forecast().never();
        let proxy = ForecastProxy::new(Arc::new(upstream));

        let err = proxy.forecast(ForecastParams::new("Atlantis")).await.unwrap_err();
        assert_eq!(err, ProxyError::LocationNotFound);
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn forecast_for_resolved_place() {
        let mut upstream = MockWeatherPort::new();
        upstream
            .expect_geocode()
            .withf(|name| name == "Paris")
            .returning(|_| Ok(Some(paris())));
        upstream
            .expect_forecast()
            .times(1)
            .returning(|location| Ok(report(location.clone())));
        let proxy = ForecastProxy::new(Arc::new(upstream));

        let served = proxy.forecast(ForecastParams::new(" Paris ")).await.unwrap();
        assert_eq!(served.outcome, CacheOutcome::Passthrough);
        assert_eq!(served.payload.location.name, "Paris");
    }

    #[tokio::test]
    async fn forecast_failure_carries_message() {
        let mut upstream = MockWeatherPort::new();
        upstream.expect_geocode().returning(|_| Ok(Some(paris())));
        upstream.expect_forecast().returning(|_| {
            Err(UpstreamError::Status {
                status: 502,
                reason: "Bad Gateway".into(),
            })
        });
        let proxy = ForecastProxy::new(Arc::new(upstream));

        let err = proxy.forecast(ForecastParams::new("Paris")).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Forecast request failed: Upstream returned HTTP 502: Bad Gateway"
        );
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn geocoder_rate_limit_is_surfaced() {
        let mut upstream = MockWeatherPort::new();
        upstream
            .expect_geocode()
            .returning(|_| Err(UpstreamError::RateLimited));
        let proxy = ForecastProxy::new(Arc::new(upstream));

        let err = proxy.forecast(ForecastParams::new("Paris")).await.unwrap_err();
        assert_eq!(err, ProxyError::RateLimited);
    }
}
