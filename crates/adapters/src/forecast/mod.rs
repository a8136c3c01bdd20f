//! Weather forecast adapters

pub mod open_meteo;

pub use open_meteo::{OpenMeteoConfig, OpenMeteoForecast};

use async_trait::async_trait;
use crop_advisor_domain::{ForecastError, ForecastProvider, ForecastSummary};

/// Forecast provider that always returns the same averages.
///
/// Useful offline and when the caller already knows the seasonal weather.
#[derive(Debug, Clone, Copy)]
pub struct FixedForecast {
    pub avg_temperature: f64,
    pub avg_humidity: f64,
    pub avg_rainfall: f64,
}

impl FixedForecast {
    pub fn new(avg_temperature: f64, avg_humidity: f64, avg_rainfall: f64) -> Self {
        Self {
            avg_temperature,
            avg_humidity,
            avg_rainfall,
        }
    }
}

#[async_trait]
impl ForecastProvider for FixedForecast {
    async fn forecast(&self, horizon_days: u32) -> Result<ForecastSummary, ForecastError> {
        Ok(ForecastSummary {
            avg_temperature: self.avg_temperature,
            avg_humidity: self.avg_humidity,
            avg_rainfall: self.avg_rainfall,
            horizon_days,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_forecast_echoes_horizon() {
        let provider = FixedForecast::new(25.0, 80.0, 5.0);
        let summary = provider.forecast(7).await.unwrap();

        assert_eq!(summary.avg_temperature, 25.0);
        assert_eq!(summary.avg_humidity, 80.0);
        assert_eq!(summary.avg_rainfall, 5.0);
        assert_eq!(summary.horizon_days, 7);
    }
}
