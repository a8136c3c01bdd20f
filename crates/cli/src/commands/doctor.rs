//! Doctor command - validate configuration and show status

use anyhow::Result;
use crop_advisor_domain::{EconomicReferenceStore, FeatureVector};
use serde::Serialize;
use std::path::PathBuf;

use super::{build_classifier, build_forecast, load_store};
use crate::args::DoctorArgs;
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    reference: CheckResult,
    classifier: CheckResult,
    forecast: CheckResult,
    overall: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: String,
    message: String,
    details: Option<serde_json::Value>,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: "warn".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn skipped() -> Self {
        Self {
            status: "skipped".to_string(),
            message: "Not requested".to_string(),
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn is_ok(&self) -> bool {
        self.status == "ok" || self.status == "skipped"
    }

    fn is_error(&self) -> bool {
        self.status == "error"
    }
}

pub async fn execute(args: DoctorArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut report = DoctorReport {
        config: CheckResult::error("Not checked"),
        reference: CheckResult::error("Not checked"),
        classifier: CheckResult::error("Not checked"),
        forecast: CheckResult::error("Not checked"),
        overall: "error".to_string(),
    };

    let wants = |component: &str| args.check.as_deref().is_none_or(|c| c == component);

    // Check config
    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(c) => {
            report.config = CheckResult::ok("Configuration loaded successfully");
            Some(c)
        }
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {:#}", e));
            None
        }
    };

    if let Some(ref config) = config {
        let store = match load_store(config, None) {
            Ok(store) => {
                report.reference = check_reference(&store);
                Some(store)
            }
            Err(e) => {
                report.reference = CheckResult::error(format!("{:#}", e));
                None
            }
        };

        report.classifier = if !wants("classifier") {
            CheckResult::skipped()
        } else {
            match store {
                Some(ref store) => check_classifier(config, store).await,
                None => CheckResult::error("Reference tables unavailable"),
            }
        };

        report.forecast = if wants("forecast") {
            check_forecast(config).await
        } else {
            CheckResult::skipped()
        };

        if !wants("reference") && report.reference.is_ok() {
            report.reference = CheckResult::skipped();
        }
    }

    // Determine overall status
    let checks = [
        &report.config,
        &report.reference,
        &report.classifier,
        &report.forecast,
    ];

    let has_error = checks.iter().any(|c| c.is_error());
    let all_ok = checks.iter().all(|c| c.is_ok());

    report.overall = if has_error {
        "error".to_string()
    } else if all_ok {
        "ok".to_string()
    } else {
        "warn".to_string()
    };

    // Output report
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == "error" {
        std::process::exit(1);
    }

    Ok(())
}

fn check_reference(store: &EconomicReferenceStore) -> CheckResult {
    if store.is_empty() {
        return CheckResult::error("Reference tables contain no crops");
    }

    let unmapped: Vec<&str> = store
        .list_crops()
        .into_iter()
        .filter(|crop| !store.class_mappings().any(|(_, mapped)| mapped == *crop))
        .collect();

    let result = if unmapped.is_empty() {
        CheckResult::ok(format!("{} crops loaded", store.len()))
    } else {
        CheckResult::warn(format!(
            "{} crops loaded, {} never predicted by the classifier: {}",
            store.len(),
            unmapped.len(),
            unmapped.join(", ")
        ))
    };

    result.with_details(serde_json::json!({
        "crops": store.len(),
        "classes": store.class_mappings().count(),
        "fingerprint": store.fingerprint(),
    }))
}

async fn check_classifier(config: &AppConfig, store: &EconomicReferenceStore) -> CheckResult {
    let provider = &config.classifier.provider;

    let classifier = match build_classifier(config, store) {
        Ok(c) => c,
        Err(e) => return CheckResult::error(format!("Provider: {}, {:#}", provider, e)),
    };

    if provider == "stub" {
        return CheckResult::warn("Provider: stub (every crop keeps the floor confidence)");
    }

    if provider == "command" && !command_exists(&config.classifier.command.command) {
        return CheckResult::warn(format!(
            "Provider: command, command not found on PATH: {}",
            config.classifier.command.command
        ));
    }

    // Probe with the first crop's optimal conditions
    let Some(probe) = store
        .crops()
        .first()
        .and_then(|c| FeatureVector::try_from_slice(&c.optimal_conditions).ok())
    else {
        return CheckResult::warn(format!("Provider: {}, no probe input available", provider));
    };

    match classifier.predict_probabilities(&probe).await {
        Ok(output) => {
            let unmapped = output
                .class_ids
                .iter()
                .filter(|id| store.resolve_class_index(**id).is_err())
                .count();
            let result = if unmapped == 0 {
                CheckResult::ok(format!(
                    "Provider: {}, {} classes",
                    provider,
                    output.class_ids.len()
                ))
            } else {
                CheckResult::warn(format!(
                    "Provider: {}, {} of {} classes have no crop mapping",
                    provider,
                    unmapped,
                    output.class_ids.len()
                ))
            };
            result.with_details(serde_json::json!({ "top_class": output.top_class() }))
        }
        Err(e) => CheckResult::error(format!("Provider: {}, probe failed: {}", provider, e)),
    }
}

async fn check_forecast(config: &AppConfig) -> CheckResult {
    let provider = &config.forecast.provider;

    let forecast = match build_forecast(config) {
        Ok(f) => f,
        Err(e) => return CheckResult::error(format!("{:#}", e)),
    };

    match forecast.forecast(config.forecast.horizon_days).await {
        Ok(summary) => CheckResult::ok(format!(
            "Provider: {}, {:.1}°C, {:.1}% humidity, {:.1}mm rainfall over {} days",
            provider,
            summary.avg_temperature,
            summary.avg_humidity,
            summary.avg_rainfall,
            summary.horizon_days
        )),
        Err(e) => CheckResult::warn(format!("Provider: {}, {}", provider, e)),
    }
}

fn command_exists(command: &str) -> bool {
    let path = std::path::Path::new(command);
    if path.components().count() > 1 {
        return path.is_file();
    }

    let Some(paths) = std::env::var_os("PATH") else {
        return false;
    };

    std::env::split_paths(&paths).any(|dir| dir.join(command).is_file())
}

fn print_report(report: &DoctorReport) {
    println!("crop-advisor Doctor Report");
    println!("==========================");
    println!();

    print_check("Config", &report.config);
    print_check("Reference", &report.reference);
    print_check("Classifier", &report.classifier);
    print_check("Forecast", &report.forecast);

    println!();
    let symbol = match report.overall.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} Overall: {}", symbol, report.overall.to_uppercase());
}

fn print_check(name: &str, result: &CheckResult) {
    let symbol = match result.status.as_str() {
        "ok" => "✓",
        "skipped" => "-",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} {}: {}", symbol, name, result.message);
}
