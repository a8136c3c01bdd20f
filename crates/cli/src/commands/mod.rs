//! Subcommands and the wiring they share

pub mod alerts;
pub mod amend;
pub mod batch;
pub mod config;
pub mod crops;
pub mod doctor;
pub mod rank;

use anyhow::{Context, Result, bail};
use crop_advisor_adapters::{
    classifier::{CentroidClassifier, CentroidModel, CommandClassifier, StubClassifier},
    forecast::{FixedForecast, OpenMeteoConfig as AdapterOpenMeteoConfig, OpenMeteoForecast},
    reference::{BuiltinReferenceRepo, TomlReferenceRepo},
};
use crop_advisor_domain::{
    Classifier, EconomicReferenceStore, FeatureVector, ForecastProvider, ReferenceRepo,
    SoilSample,
};
use serde::de::DeserializeOwned;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use crate::args::FeatureArgs;
use crate::config::AppConfig;

/// Load the reference tables: explicit override, then config, then built-in
pub(crate) fn load_store(
    config: &AppConfig,
    override_path: Option<&Path>,
) -> Result<Arc<EconomicReferenceStore>> {
    let path = override_path.or(config.reference.path.as_deref());

    let store = match path {
        Some(path) => TomlReferenceRepo::new(path)
            .load()
            .with_context(|| format!("Failed to load reference tables: {}", path.display()))?,
        None => BuiltinReferenceRepo
            .load()
            .context("Failed to load built-in reference tables")?,
    };

    tracing::info!(
        source = %path.map(|p| p.display().to_string()).unwrap_or_else(|| "builtin".to_string()),
        crops = store.len(),
        fingerprint = %store.fingerprint(),
        "Reference tables loaded"
    );

    Ok(Arc::new(store))
}

pub(crate) fn build_classifier(
    config: &AppConfig,
    store: &EconomicReferenceStore,
) -> Result<Box<dyn Classifier>> {
    match config.classifier.provider.as_str() {
        "centroid" => {
            let model = match config.classifier.centroid.model_path {
                Some(ref path) => CentroidModel::load(path)
                    .context("Failed to load centroid model")?,
                None => CentroidModel::from_reference(store)
                    .context("Failed to derive centroid model from reference tables")?,
            };
            Ok(Box::new(CentroidClassifier::new(model)))
        }
        "command" => {
            let command = config.classifier.command.command.trim();
            if command.is_empty() {
                bail!("classifier.command.command is required for the command provider");
            }
            Ok(Box::new(CommandClassifier::new(
                command.to_string(),
                config.classifier.command.args.clone(),
                config.classifier_settings(),
            )))
        }
        "stub" => Ok(Box::new(StubClassifier::empty())),
        other => bail!("Unknown classifier provider: {}", other),
    }
}

pub(crate) fn build_forecast(config: &AppConfig) -> Result<Box<dyn ForecastProvider>> {
    match config.forecast.provider.as_str() {
        "fixed" => {
            let fixed = &config.forecast.fixed;
            Ok(Box::new(FixedForecast::new(
                fixed.avg_temperature,
                fixed.avg_humidity,
                fixed.avg_rainfall,
            )))
        }
        "open_meteo" => {
            let open_meteo = &config.forecast.open_meteo;
            let provider = OpenMeteoForecast::new(AdapterOpenMeteoConfig {
                base_url: open_meteo.base_url.clone(),
                latitude: open_meteo.latitude,
                longitude: open_meteo.longitude,
                timeout_secs: open_meteo.timeout_secs,
            })
            .context("Failed to configure Open-Meteo provider")?;
            Ok(Box::new(provider))
        }
        other => bail!("Unknown forecast provider: {}", other),
    }
}

/// Turn feature flags into a validated feature vector, asking the forecast
/// provider for weather when only soil values were given
pub(crate) async fn resolve_features(args: &FeatureArgs, config: &AppConfig) -> Result<FeatureVector> {
    if let Some(ref values) = args.features {
        return FeatureVector::try_from_slice(values).context("Invalid --features");
    }

    let soil = match args.soil {
        Some(ref path) => Some(read_json::<SoilSample>(path).context("Failed to read soil sample")?),
        None => soil_from_flags(args.nitrogen, args.phosphorus, args.potassium, args.ph),
    };

    let weather = (args.rainfall, args.humidity, args.temperature);
    match (soil, weather) {
        (Some(soil), (Some(rainfall), Some(humidity), Some(temperature))) => {
            FeatureVector::try_from_slice(&[
                soil.nitrogen,
                soil.phosphorus,
                soil.potassium,
                rainfall,
                soil.ph,
                humidity,
                temperature,
            ])
            .context("Invalid features")
        }
        (Some(soil), (None, None, None)) => {
            let provider = build_forecast(config)?;
            let forecast = provider
                .forecast(config.forecast.horizon_days)
                .await
                .context("Failed to fetch weather forecast")?;

            tracing::info!(
                avg_temperature = forecast.avg_temperature,
                avg_humidity = forecast.avg_humidity,
                avg_rainfall = forecast.avg_rainfall,
                horizon_days = forecast.horizon_days,
                "Using forecast for weather features"
            );

            FeatureVector::from_soil_and_forecast(
                &soil,
                &forecast,
                config.forecast.rainfall_offset_mm,
            )
            .context("Invalid features")
        }
        (Some(_), _) => {
            bail!("Pass all of --rainfall, --humidity and --temperature, or none to use the forecast")
        }
        (None, _) => {
            bail!("Missing soil values: pass --nitrogen, --phosphorus, --potassium and --ph, --soil, or --features")
        }
    }
}

pub(crate) fn soil_from_flags(
    nitrogen: Option<f64>,
    phosphorus: Option<f64>,
    potassium: Option<f64>,
    ph: Option<f64>,
) -> Option<SoilSample> {
    Some(SoilSample {
        nitrogen: nitrogen?,
        phosphorus: phosphorus?,
        potassium: potassium?,
        ph: ph?,
    })
}

/// Read JSON from a file, or stdin when the path is `-`
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = if path.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read from stdin")?;
        text
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?
    };

    serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in {}", path.display()))
}
