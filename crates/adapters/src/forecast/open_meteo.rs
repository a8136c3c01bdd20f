//! Open-Meteo daily forecast adapter

use async_trait::async_trait;
use crop_advisor_domain::{ForecastError, ForecastProvider, ForecastSummary};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const DAILY_FIELDS: &str = "temperature_2m_mean,relative_humidity_2m_mean,precipitation_sum";

/// Open-Meteo supports at most 16 forecast days
const MAX_FORECAST_DAYS: u32 = 16;

#[derive(Debug, Clone)]
pub struct OpenMeteoConfig {
    pub base_url: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timeout_secs: u64,
}

impl Default for OpenMeteoConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.open-meteo.com".to_string(),
            latitude: 0.0,
            longitude: 0.0,
            timeout_secs: 15,
        }
    }
}

pub struct OpenMeteoForecast {
    client: Client,
    config: OpenMeteoConfig,
}

impl OpenMeteoForecast {
    pub fn new(config: OpenMeteoConfig) -> Result<Self, ForecastError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ForecastError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }
}

#[derive(Deserialize)]
struct ForecastResponse {
    daily: DailySeries,
}

#[derive(Deserialize)]
struct DailySeries {
    #[serde(default)]
    temperature_2m_mean: Vec<Option<f64>>,
    #[serde(default)]
    relative_humidity_2m_mean: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
}

/// Mean of the non-null values of a daily series
fn mean(series: &[Option<f64>], field: &str) -> Result<f64, ForecastError> {
    let values: Vec<f64> = series.iter().flatten().copied().collect();
    if values.is_empty() {
        return Err(ForecastError::InvalidFormat(format!(
            "daily.{} has no values",
            field
        )));
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

#[async_trait]
impl ForecastProvider for OpenMeteoForecast {
    async fn forecast(&self, horizon_days: u32) -> Result<ForecastSummary, ForecastError> {
        let days = horizon_days.clamp(1, MAX_FORECAST_DAYS);
        let url = format!("{}/v1/forecast", self.config.base_url.trim_end_matches('/'));

        tracing::debug!(
            latitude = self.config.latitude,
            longitude = self.config.longitude,
            days = days,
            "Requesting forecast"
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", self.config.latitude.to_string()),
                ("longitude", self.config.longitude.to_string()),
                ("daily", DAILY_FIELDS.to_string()),
                ("forecast_days", days.to_string()),
            ])
            .send()
            .await
            .map_err(|e| ForecastError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ForecastError::Api(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let parsed: ForecastResponse = response
            .json()
            .await
            .map_err(|e| ForecastError::InvalidFormat(e.to_string()))?;

        let daily = parsed.daily;
        Ok(ForecastSummary {
            avg_temperature: mean(&daily.temperature_2m_mean, "temperature_2m_mean")?,
            avg_humidity: mean(&daily.relative_humidity_2m_mean, "relative_humidity_2m_mean")?,
            avg_rainfall: mean(&daily.precipitation_sum, "precipitation_sum")?,
            horizon_days: days,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base_url: String) -> OpenMeteoForecast {
        OpenMeteoForecast::new(OpenMeteoConfig {
            base_url,
            latitude: 12.97,
            longitude: 77.59,
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_forecast_averages_daily_series() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("forecast_days", "3"))
            .and(query_param("daily", DAILY_FIELDS))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "daily": {
                    "time": ["2026-10-19", "2026-10-20", "2026-10-21"],
                    "temperature_2m_mean": [24.0, 26.0, 25.0],
                    "relative_humidity_2m_mean": [80.0, 70.0, null],
                    "precipitation_sum": [0.0, 3.0, 6.0]
                }
            })))
            .mount(&mock_server)
            .await;

        let summary = provider(mock_server.uri()).forecast(3).await.unwrap();

        assert_eq!(summary.avg_temperature, 25.0);
        assert_eq!(summary.avg_humidity, 75.0);
        assert_eq!(summary.avg_rainfall, 3.0);
        assert_eq!(summary.horizon_days, 3);
    }

    #[tokio::test]
    async fn test_horizon_is_clamped() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("forecast_days", "16"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "daily": {
                    "temperature_2m_mean": [20.0],
                    "relative_humidity_2m_mean": [60.0],
                    "precipitation_sum": [1.0]
                }
            })))
            .mount(&mock_server)
            .await;

        let summary = provider(mock_server.uri()).forecast(30).await.unwrap();
        assert_eq!(summary.horizon_days, 16);
    }

    #[tokio::test]
    async fn test_server_error_is_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad latitude"))
            .mount(&mock_server)
            .await;

        let result = provider(mock_server.uri()).forecast(7).await;
        assert!(matches!(result, Err(ForecastError::Api(msg)) if msg.contains("bad latitude")));
    }

    #[tokio::test]
    async fn test_empty_series_is_invalid_format() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "daily": {
                    "temperature_2m_mean": [null],
                    "relative_humidity_2m_mean": [60.0],
                    "precipitation_sum": [1.0]
                }
            })))
            .mount(&mock_server)
            .await;

        let result = provider(mock_server.uri()).forecast(1).await;
        assert!(matches!(result, Err(ForecastError::InvalidFormat(_))));
    }
}
