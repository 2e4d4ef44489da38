//! Open-Meteo Client
//!
//! Geocoding and hourly/daily forecasts from Open-Meteo. No API key is
//! required.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::fetch_json;
use crate::application::ports::{UpstreamError, WeatherPort};
use crate::domain::weather::{
    CurrentConditions, DailyPoint, ForecastReport, HourlyPoint, Location, describe_weather_code,
};
use crate::infrastructure::metrics::Provider;

const HOURLY_FIELDS: &str =
    "temperature_2m,relative_humidity_2m,wind_speed_10m,pressure_msl,weather_code";
const DAILY_FIELDS: &str =
    "temperature_2m_max,temperature_2m_min,precipitation_probability_max";

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<Location>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    hourly: HourlySeries,
    daily: DailySeries,
}

#[derive(Debug, Deserialize)]
struct HourlySeries {
    time: Vec<String>,
    #[serde(default)]
    temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    relative_humidity_2m: Vec<Option<f64>>,
    #[serde(default)]
    wind_speed_10m: Vec<Option<f64>>,
    #[serde(default)]
    pressure_msl: Vec<Option<f64>>,
    #[serde(default)]
    weather_code: Vec<Option<u16>>,
}

#[derive(Debug, Deserialize)]
struct DailySeries {
    time: Vec<String>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_probability_max: Vec<Option<f64>>,
}

fn at<T: Copy>(series: &[Option<T>], index: usize) -> Option<T> {
    series.get(index).copied().flatten()
}

impl HourlySeries {
    fn points(&self) -> Vec<HourlyPoint> {
        self.time
            .iter()
            .enumerate()
            .map(|(i, time)| HourlyPoint {
                time: time.clone(),
                temperature: at(&self.temperature_2m, i),
                humidity: at(&self.relative_humidity_2m, i),
                wind_speed: at(&self.wind_speed_10m, i),
                pressure: at(&self.pressure_msl, i),
            })
            .collect()
    }

    /// Conditions at the first hour. Absent readings are zero.
    fn current(&self) -> Result<CurrentConditions, UpstreamError> {
        if self.time.is_empty() {
            return Err(UpstreamError::invalid_payload("forecast has no hourly data"));
        }
        Ok(CurrentConditions {
            temperature: at(&self.temperature_2m, 0).unwrap_or_default(),
            humidity: at(&self.relative_humidity_2m, 0).unwrap_or_default(),
            wind_speed: at(&self.wind_speed_10m, 0).unwrap_or_default(),
            pressure: at(&self.pressure_msl, 0).unwrap_or_default(),
            condition: at(&self.weather_code, 0)
                .map_or("unknown", describe_weather_code)
                .to_string(),
        })
    }
}

impl DailySeries {
    fn points(&self) -> Vec<DailyPoint> {
        self.time
            .iter()
            .enumerate()
            .map(|(i, time)| DailyPoint {
                time: time.clone(),
                max_temp: at(&self.temperature_2m_max, i),
                min_temp: at(&self.temperature_2m_min, i),
                precipitation_prob: at(&self.precipitation_probability_max, i),
            })
            .collect()
    }
}

// =============================================================================
// Client
// =============================================================================

/// Open-Meteo client.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    http: Client,
    forecast_url: String,
    geocoding_url: String,
}

impl OpenMeteoClient {
    /// Create a client against the forecast and geocoding endpoints.
    #[must_use]
    pub fn new(
        http: Client,
        forecast_url: impl Into<String>,
        geocoding_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            forecast_url: forecast_url.into(),
            geocoding_url: geocoding_url.into(),
        }
    }
}

#[async_trait]
impl WeatherPort for OpenMeteoClient {
    async fn geocode(&self, name: &str) -> Result<Option<Location>, UpstreamError> {
        let request = self.http.get(&self.geocoding_url).query(&[
            ("name", name),
            ("count", "1"),
            ("language", "en"),
            ("format", "json"),
        ]);
        let response: GeocodingResponse = fetch_json(Provider::OpenMeteo, request).await?;
        Ok(response.results.into_iter().next())
    }

    async fn forecast(&self, location: &Location) -> Result<ForecastReport, UpstreamError> {
        let request = self.http.get(&self.forecast_url).query(&[
            ("latitude", location.latitude.to_string()),
            ("longitude", location.longitude.to_string()),
            ("hourly", HOURLY_FIELDS.to_string()),
            ("daily", DAILY_FIELDS.to_string()),
            ("timezone", "auto".to_string()),
        ]);
        let response: ForecastResponse = fetch_json(Provider::OpenMeteo, request).await?;

        Ok(ForecastReport {
            current: response.hourly.current()?,
            hourly: response.hourly.points(),
            daily: response.daily.points(),
            location: location.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> OpenMeteoClient {
        OpenMeteoClient::new(
            Client::new(),
            format!("{}/v1/forecast", server.uri()),
            format!("{}/v1/search", server.uri()),
        )
    }

    fn paris() -> Location {
        Location {
            name: "Paris".to_string(),
            country: Some("France".to_string()),
            latitude: 48.85,
            longitude: 2.35,
        }
    }

    #[tokio::test]
    async fn geocode_returns_first_match() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(query_param("name", "Paris"))
            .and(query_param("count", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"id": 1, "name": "Paris", "country": "France", "latitude": 48.85, "longitude": 2.35}]
            })))
            .mount(&server)
            .await;

        let location = client(&server).geocode("Paris").await.unwrap();
        assert_eq!(location, Some(paris()));
    }

    #[tokio::test]
    async fn geocode_without_results_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"generationtime_ms": 0.5})))
            .mount(&server)
            .await;

        assert_eq!(client(&server).geocode("Atlantis").await.unwrap(), None);
    }

    #[tokio::test]
    async fn forecast_builds_report() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("latitude", "48.85"))
            .and(query_param("timezone", "auto"))
            .and(query_param("hourly", HOURLY_FIELDS))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "hourly": {
                    "time": ["2024-04-01T00:00", "2024-04-01T01:00"],
                    "temperature_2m": [18.5, 18.0],
                    "relative_humidity_2m": [60.0, 62.0],
                    "wind_speed_10m": [12.0, null],
                    "pressure_msl": [1013.0, 1012.5],
                    "weather_code": [2, 3]
                },
                "daily": {
                    "time": ["2024-04-01"],
                    "temperature_2m_max": [21.0],
                    "temperature_2m_min": [11.0],
                    "precipitation_probability_max": [20.0]
                }
            })))
            .mount(&server)
            .await;

        let report = client(&server).forecast(&paris()).await.unwrap();
        assert_eq!(report.current.temperature, 18.5);
        assert_eq!(report.current.condition, "partly cloudy");
        assert_eq!(report.hourly.len(), 2);
        assert_eq!(report.hourly[1].wind_speed, None);
        assert_eq!(report.daily[0].max_temp, Some(21.0));
        assert_eq!(report.location, paris());
    }

    #[tokio::test]
    async fn forecast_without_hours_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "hourly": {"time": []},
                "daily": {"time": []}
            })))
            .mount(&server)
            .await;

        let err = client(&server).forecast(&paris()).await.unwrap_err();
        assert!(matches!(err, UpstreamError::InvalidPayload { .. }));
    }
}
