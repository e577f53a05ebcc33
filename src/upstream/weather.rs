//! Weather client: coordinates → one-day forecast (OpenMeteo daily API)

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::instrument;

use super::{DecodeError, Fetch, SourceKind, Upstream, UpstreamHttp, join_url, parse_json};
use crate::config::WeatherConfig;
use crate::models::{Coordinates, ForecastDay};

/// OpenMeteo daily forecast client
#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: UpstreamHttp,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    daily_units: DailyUnits,
    daily: Daily,
}

#[derive(Debug, Deserialize)]
struct DailyUnits {
    temperature_2m_max: String,
}

#[derive(Debug, Deserialize)]
struct Daily {
    time: Vec<String>,
    temperature_2m_min: Vec<f64>,
    temperature_2m_max: Vec<f64>,
}

fn first<T>(values: Vec<T>, field: &'static str) -> Result<T, DecodeError> {
    values.into_iter().next().ok_or(DecodeError::Missing {
        kind: SourceKind::Weather,
        field,
    })
}

impl WeatherClient {
    #[must_use]
    pub fn new(http: UpstreamHttp, config: &WeatherConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.clone(),
        }
    }

    /// Build the forecast URL for a coordinate pair
    #[must_use]
    pub fn request_url(&self, coordinates: &Coordinates) -> String {
        join_url(
            &self.base_url,
            &format!(
                "forecast?daily=temperature_2m_max,temperature_2m_min&forecast_days=1&latitude={}&longitude={}",
                coordinates.lat, coordinates.lon
            ),
        )
    }
}

#[async_trait]
impl Upstream for WeatherClient {
    type Input = Coordinates;
    type Output = ForecastDay;

    const KIND: SourceKind = SourceKind::Weather;

    #[instrument(skip(self), level = "debug")]
    async fn fetch(&self, coordinates: &Coordinates) -> Fetch {
        self.http.get(Self::KIND, &self.request_url(coordinates), None).await
    }

    fn decode(body: &str) -> Result<ForecastDay, DecodeError> {
        let response: ForecastResponse = parse_json(Self::KIND, body)?;
        let daily = response.daily;

        let date = first(daily.time, "daily.time[0]")?;
        if NaiveDate::parse_from_str(&date, "%Y-%m-%d").is_err() {
            return Err(DecodeError::Invalid {
                kind: Self::KIND,
                field: "daily.time[0]",
                value: date,
            });
        }

        Ok(ForecastDay {
            date,
            min_temperature: first(daily.temperature_2m_min, "daily.temperature_2m_min[0]")?,
            max_temperature: first(daily.temperature_2m_max, "daily.temperature_2m_max[0]")?,
            unit: response.daily_units.temperature_2m_max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::time::Duration;

    const BERLIN: &str = r#"{
        "latitude": 52.52,
        "longitude": 13.419998,
        "timezone": "GMT",
        "daily_units": {"time": "iso8601", "temperature_2m_min": "°C", "temperature_2m_max": "°C"},
        "daily": {
            "time": ["2024-05-01", "2024-05-02"],
            "temperature_2m_min": [13.1, 11.0],
            "temperature_2m_max": [26.3, 21.4]
        }
    }"#;

    #[test]
    fn test_request_url() {
        let config = WeatherConfig {
            base_url: "https://api.open-meteo.com/v1".to_string(),
            enabled: true,
        };
        let client = WeatherClient::new(UpstreamHttp::new(Duration::from_secs(1)).unwrap(), &config);

        assert_eq!(
            client.request_url(&Coordinates::new(52.52, 13.4)),
            "https://api.open-meteo.com/v1/forecast?daily=temperature_2m_max,temperature_2m_min&forecast_days=1&latitude=52.52&longitude=13.4"
        );
    }

    #[test]
    fn test_decode_takes_first_day() {
        let day = WeatherClient::decode(BERLIN).unwrap();
        assert_eq!(
            day,
            ForecastDay {
                date: "2024-05-01".to_string(),
                min_temperature: 13.1,
                max_temperature: 26.3,
                unit: "°C".to_string(),
            }
        );
    }

    #[rstest]
    #[case::no_days(
        r#"{"daily_units": {"temperature_2m_max": "°C"}, "daily": {"time": [], "temperature_2m_min": [], "temperature_2m_max": []}}"#,
        "daily.time[0]"
    )]
    #[case::no_min(
        r#"{"daily_units": {"temperature_2m_max": "°C"}, "daily": {"time": ["2024-05-01"], "temperature_2m_min": [], "temperature_2m_max": [20.0]}}"#,
        "daily.temperature_2m_min[0]"
    )]
    #[case::no_max(
        r#"{"daily_units": {"temperature_2m_max": "°F"}, "daily": {"time": ["2024-05-01"], "temperature_2m_min": [50.0], "temperature_2m_max": []}}"#,
        "daily.temperature_2m_max[0]"
    )]
    fn test_decode_missing_first_element(#[case] body: &str, #[case] expected: &str) {
        match WeatherClient::decode(body).unwrap_err() {
            DecodeError::Missing { kind, field } => {
                assert_eq!(kind, SourceKind::Weather);
                assert_eq!(field, expected);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_decode_rejects_non_iso_date() {
        let body = r#"{"daily_units": {"temperature_2m_max": "°C"}, "daily": {"time": ["yesterday"], "temperature_2m_min": [1.0], "temperature_2m_max": [2.0]}}"#;
        assert!(matches!(
            WeatherClient::decode(body).unwrap_err(),
            DecodeError::Invalid { .. }
        ));
    }

    #[test]
    fn test_decode_missing_units_is_malformed() {
        let body = r#"{"daily": {"time": ["2024-05-01"], "temperature_2m_min": [1.0], "temperature_2m_max": [2.0]}}"#;
        assert!(matches!(
            WeatherClient::decode(body).unwrap_err(),
            DecodeError::Malformed { .. }
        ));
    }
}
