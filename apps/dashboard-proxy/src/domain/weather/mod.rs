//! Weather Types
//!
//! The forecast response served to the dashboard, the per-city report the
//! store keeps, and the WMO weather code table used to describe
//! conditions.

use serde::{Deserialize, Serialize};

// =============================================================================
// Forecast Response
// =============================================================================

/// A geocoded place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Place name as resolved by the geocoder.
    pub name: String,
    /// Country, when known.
    #[serde(default)]
    pub country: Option<String>,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

/// Conditions at the first forecast hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentConditions {
    /// Temperature in °C.
    pub temperature: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
    /// Wind speed in km/h.
    pub wind_speed: f64,
    /// Surface pressure in hPa.
    pub pressure: f64,
    /// Human-readable condition.
    pub condition: String,
}

/// One hour of forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyPoint {
    /// ISO-8601 local time.
    pub time: String,
    /// Temperature in °C.
    pub temperature: Option<f64>,
    /// Relative humidity in percent.
    pub humidity: Option<f64>,
    /// Wind speed in km/h.
    pub wind_speed: Option<f64>,
    /// Surface pressure in hPa.
    pub pressure: Option<f64>,
}

/// One day of forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPoint {
    /// ISO-8601 date.
    pub time: String,
    /// Maximum temperature in °C.
    pub max_temp: Option<f64>,
    /// Minimum temperature in °C.
    pub min_temp: Option<f64>,
    /// Maximum precipitation probability in percent.
    pub precipitation_prob: Option<f64>,
}

/// Forecast for a named location as returned by `/weather/forecast`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastReport {
    /// Conditions at the first hour.
    pub current: CurrentConditions,
    /// Hourly series.
    pub hourly: Vec<HourlyPoint>,
    /// Daily series.
    pub daily: Vec<DailyPoint>,
    /// Resolved location.
    pub location: Location,
}

// =============================================================================
// Dashboard Report
// =============================================================================

/// Current weather for one city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    /// City the snapshot was requested for.
    pub city_name: String,
    /// Temperature in °C.
    pub temperature_c: f64,
    /// Relative humidity in percent.
    pub humidity_pct: f64,
    /// Wind speed in km/h.
    pub wind_speed_kmh: f64,
    /// Surface pressure in hPa.
    pub pressure_hpa: f64,
    /// Human-readable condition.
    pub condition_description: String,
}

/// Hourly and daily series kept alongside a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastSeries {
    /// Hourly series.
    pub hourly: Vec<HourlyPoint>,
    /// Daily series.
    pub daily: Vec<DailyPoint>,
}

/// A city's entry in the dashboard store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    /// Current conditions.
    pub snapshot: WeatherSnapshot,
    /// Forecast series, when fetched.
    pub forecast: Option<ForecastSeries>,
}

impl WeatherReport {
    /// Build the store entry for `city` from a forecast response.
    #[must_use]
    pub fn from_forecast(city: &str, report: ForecastReport) -> Self {
        let ForecastReport {
            current,
            hourly,
            daily,
            ..
        } = report;
        Self {
            snapshot: WeatherSnapshot {
                city_name: city.to_string(),
                temperature_c: current.temperature,
                humidity_pct: current.humidity,
                wind_speed_kmh: current.wind_speed,
                pressure_hpa: current.pressure,
                condition_description: current.condition,
            },
            forecast: Some(ForecastSeries { hourly, daily }),
        }
    }
}

// =============================================================================
// Weather Codes
// =============================================================================

/// Describe a WMO weather interpretation code.
///
/// Codes outside the table describe as `"unknown"`.
#[must_use]
pub const fn describe_weather_code(code: u16) -> &'static str {
    match code {
        0 => "clear sky",
        1 => "mainly clear",
        2 => "partly cloudy",
        3 => "overcast",
        45 => "foggy",
        48 => "depositing rime fog",
        51 => "light drizzle",
        53 => "moderate drizzle",
        55 => "dense drizzle",
        61 => "slight rain",
        63 => "moderate rain",
        65 => "heavy rain",
        71 => "slight snow fall",
        73 => "moderate snow fall",
        75 => "heavy snow fall",
        77 => "snow grains",
        80 => "slight rain showers",
        81 => "moderate rain showers",
        82 => "violent rain showers",
        85 => "slight snow showers",
        86 => "heavy snow showers",
        95 => "thunderstorm",
        96 => "thunderstorm with slight hail",
        99 => "thunderstorm with heavy hail",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0, "clear sky")]
    #[test_case(3, "overcast")]
    #[test_case(63, "moderate rain")]
    #[test_case(99, "thunderstorm with heavy hail")]
    #[test_case(4, "unknown" ; "gap in table")]
    #[test_case(1000, "unknown" ; "out of range")]
    fn weather_code_descriptions(code: u16, expected: &str) {
        assert_eq!(describe_weather_code(code), expected);
    }

    fn sample_report() -> ForecastReport {
        ForecastReport {
            current: CurrentConditions {
                temperature: 18.5,
                humidity: 60.0,
                wind_speed: 12.0,
                pressure: 1013.0,
                condition: "partly cloudy".to_string(),
            },
            hourly: vec![HourlyPoint {
                time: "2024-04-01T00:00".to_string(),
                temperature: Some(18.5),
                humidity: Some(60.0),
                wind_speed: Some(12.0),
                pressure: Some(1013.0),
            }],
            daily: vec![DailyPoint {
                time: "2024-04-01".to_string(),
                max_temp: Some(21.0),
                min_temp: Some(11.0),
                precipitation_prob: Some(20.0),
            }],
            location: Location {
                name: "Paris".to_string(),
                country: Some("France".to_string()),
                latitude: 48.85,
                longitude: 2.35,
            },
        }
    }

    #[test]
    fn report_keeps_requested_city_name() {
        let report = WeatherReport::from_forecast("paris", sample_report());
        assert_eq!(report.snapshot.city_name, "paris");
        assert_eq!(report.snapshot.condition_description, "partly cloudy");
        assert_eq!(report.forecast.unwrap().daily.len(), 1);
    }

    #[test]
    fn forecast_report_wire_shape() {
        let json = serde_json::to_value(sample_report()).unwrap();
        assert_eq!(json["current"]["windSpeed"], 12.0);
        assert_eq!(json["daily"][0]["precipitationProb"], 20.0);
        assert_eq!(json["location"]["name"], "Paris");
        assert_eq!(json["hourly"][0]["time"], "2024-04-01T00:00");
    }
}
