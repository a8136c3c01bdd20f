//! Configuration loading and management

use anyhow::{Context, Result};
use crop_advisor_adapters::classifier::ClassifierSettings;
use crop_advisor_domain::{
    policy::AlertPolicy,
    usecases::{AmendmentThresholds, RankConfig, RecommendConfig},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub reference: ReferenceConfig,

    #[serde(default)]
    pub ranking: RankingConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub forecast: ForecastConfig,

    #[serde(default)]
    pub amendment: AmendmentThresholds,

    #[serde(default)]
    pub alerts: AlertPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceConfig {
    /// Reference tables file; the built-in tables are used when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default = "default_confidence_floor")]
    pub confidence_floor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Per-attempt timeout
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Bound on a whole prediction including retries; derived from the
    /// attempt timeout, retries and backoff when unset
    #[serde(default)]
    pub total_timeout_secs: Option<u64>,

    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    #[serde(default)]
    pub centroid: CentroidConfig,

    #[serde(default)]
    pub command: CommandConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CentroidConfig {
    /// JSON model file; centroids are derived from the reference tables when unset
    #[serde(default)]
    pub model_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandConfig {
    #[serde(default)]
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    #[serde(default = "default_forecast_provider")]
    pub provider: String,

    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,

    /// Added to forecast rainfall before it is used as a classifier feature
    #[serde(default = "default_rainfall_offset")]
    pub rainfall_offset_mm: f64,

    #[serde(default)]
    pub fixed: FixedForecastConfig,

    #[serde(default)]
    pub open_meteo: OpenMeteoConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedForecastConfig {
    #[serde(default = "default_avg_temperature")]
    pub avg_temperature: f64,

    #[serde(default = "default_avg_humidity")]
    pub avg_humidity: f64,

    #[serde(default)]
    pub avg_rainfall: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenMeteoConfig {
    #[serde(default = "default_open_meteo_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub latitude: f64,

    #[serde(default)]
    pub longitude: f64,

    #[serde(default = "default_forecast_timeout")]
    pub timeout_secs: u64,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_currency_symbol() -> String {
    "₹".to_string()
}

fn default_top_k() -> usize {
    10
}

fn default_confidence_floor() -> f64 {
    0.01
}

fn default_provider() -> String {
    "centroid".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_retries() -> u32 {
    2
}

fn default_max_concurrent() -> usize {
    4
}

fn default_forecast_provider() -> String {
    "fixed".to_string()
}

fn default_horizon_days() -> u32 {
    7
}

fn default_rainfall_offset() -> f64 {
    150.0
}

fn default_avg_temperature() -> f64 {
    25.0
}

fn default_avg_humidity() -> f64 {
    70.0
}

fn default_open_meteo_base_url() -> String {
    "https://api.open-meteo.com".to_string()
}

fn default_forecast_timeout() -> u64 {
    15
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            currency_symbol: default_currency_symbol(),
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            confidence_floor: default_confidence_floor(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            timeout_secs: default_timeout(),
            retries: default_retries(),
            total_timeout_secs: None,
            max_concurrent: default_max_concurrent(),
            centroid: CentroidConfig::default(),
            command: CommandConfig::default(),
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            provider: default_forecast_provider(),
            horizon_days: default_horizon_days(),
            rainfall_offset_mm: default_rainfall_offset(),
            fixed: FixedForecastConfig::default(),
            open_meteo: OpenMeteoConfig::default(),
        }
    }
}

impl Default for FixedForecastConfig {
    fn default() -> Self {
        Self {
            avg_temperature: default_avg_temperature(),
            avg_humidity: default_avg_humidity(),
            avg_rainfall: 0.0,
        }
    }
}

impl Default for OpenMeteoConfig {
    fn default() -> Self {
        Self {
            base_url: default_open_meteo_base_url(),
            latitude: 0.0,
            longitude: 0.0,
            timeout_secs: default_forecast_timeout(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./config.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            // User specified a path that doesn't exist
            anyhow::bail!("Config file not found: {}", path.display());
        }

        // Add environment variable overrides
        builder = builder.add_source(
            config::Environment::with_prefix("CROP_ADVISOR")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Check values the type system cannot
    pub fn validate(&self) -> Result<()> {
        self.rank_config()
            .validate()
            .context("Invalid [ranking] configuration")?;
        Ok(())
    }

    pub fn rank_config(&self) -> RankConfig {
        RankConfig {
            top_k: self.ranking.top_k,
            confidence_floor: self.ranking.confidence_floor,
        }
    }

    /// Settings for the active classifier; the command provider may override the attempt timeout
    pub fn classifier_settings(&self) -> ClassifierSettings {
        let timeout_secs = match self.classifier.provider.as_str() {
            "command" => self
                .classifier
                .command
                .timeout_secs
                .unwrap_or(self.classifier.timeout_secs),
            _ => self.classifier.timeout_secs,
        };
        ClassifierSettings {
            timeout_secs,
            retries: self.classifier.retries,
        }
    }

    pub fn recommend_config(&self) -> RecommendConfig {
        let classifier_timeout = match self.classifier.total_timeout_secs {
            Some(secs) => Duration::from_secs(secs),
            None => self.classifier_settings().total_budget(),
        };
        RecommendConfig {
            classifier_timeout,
            max_concurrent: self.classifier.max_concurrent,
        }
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# crop-advisor configuration

[general]
log_level = "info"
currency_symbol = "₹"

[reference]
# Economic reference tables; the built-in tables are used when unset.
# Run 'crop-advisor crops export' to get a copy to edit.
# path = "./reference_tables.toml"

[ranking]
top_k = 10
confidence_floor = 0.01

[classifier]
provider = "centroid"  # centroid, command, stub
timeout_secs = 30        # per attempt
retries = 2
# total_timeout_secs = 93  # whole prediction; derived from the above when unset
max_concurrent = 4

[classifier.centroid]
# JSON model file; centroids come from the reference optimal conditions when unset
# model_path = "./model.json"

[classifier.command]
# External predictor reading {"features": [...]} on stdin and printing
# {"class_ids": [...], "probabilities": [...]} on stdout
command = "python3"
args = ["predict.py"]
# timeout_secs = 30

[forecast]
provider = "fixed"  # fixed, open_meteo
horizon_days = 7
rainfall_offset_mm = 150.0

[forecast.fixed]
avg_temperature = 25.0
avg_humidity = 70.0
avg_rainfall = 0.0

[forecast.open_meteo]
base_url = "https://api.open-meteo.com"
latitude = 12.97
longitude = 77.59
timeout_secs = 15

[amendment]
nitrogen = 10.0
phosphorus = 5.0
potassium = 5.0
rainfall = 50.0
ph = 0.5
humidity = 10.0
temperature = 2.0

[alerts]
min_ph = 6.0
max_ph = 7.5
min_nitrogen = 20.0
"#
        .to_string()
    }
}
