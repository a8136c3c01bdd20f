//! Crops command - inspect and validate the economic reference tables

use anyhow::{Context, Result};
use crop_advisor_adapters::reference::BuiltinReferenceRepo;
use crop_advisor_domain::{Factor, YieldBasis};
use std::path::PathBuf;

use super::load_store;
use crate::args::{CropsArgs, CropsCommands};
use crate::config::AppConfig;
use crate::output::{display_name, format_currency};

pub async fn execute(args: CropsArgs, config_path: Option<PathBuf>) -> Result<()> {
    match args.command {
        CropsCommands::List { reference, json } => list_crops(reference, json, config_path),
        CropsCommands::Show {
            name,
            reference,
            json,
        } => show_crop(&name, reference, json, config_path),
        CropsCommands::Validate { reference } => validate_tables(reference, config_path),
        CropsCommands::Export => {
            print!("{}", BuiltinReferenceRepo::source());
            Ok(())
        }
    }
}

fn list_crops(reference: Option<PathBuf>, json: bool, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let store = load_store(&config, reference.as_deref())?;

    if json {
        let output = serde_json::json!({
            "count": store.len(),
            "fingerprint": store.fingerprint(),
            "crops": store.crops(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Crops ({} found)", store.len());
        println!("================");
        println!();
        for crop in store.crops() {
            println!(
                "{:<14} yield {:>10.2}  price {:>12}  period {:>4.1} months",
                crop.name,
                crop.average_yield,
                format_currency(crop.market_price, &config.general.currency_symbol),
                crop.growing_period
            );
        }
    }

    Ok(())
}

fn show_crop(
    name: &str,
    reference: Option<PathBuf>,
    json: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let store = load_store(&config, reference.as_deref())?;
    let crop = store.get(&name.trim().to_lowercase())?;
    let currency = &config.general.currency_symbol;

    if json {
        println!("{}", serde_json::to_string_pretty(crop)?);
        return Ok(());
    }

    println!("{}", display_name(&crop.name));
    println!("  Average yield: {:.2}", crop.average_yield);
    println!("  Market price: {}", format_currency(crop.market_price, currency));
    println!("  Seed cost: {}", format_currency(crop.seed_cost, currency));
    println!(
        "  Maintenance cost: {}",
        format_currency(crop.maintenance_cost, currency)
    );
    println!("  Growing period: {:.1} months", crop.growing_period);
    if crop.yield_basis == YieldBasis::WholeField {
        println!("  Yield basis: whole field (no area multiplier)");
    }
    println!("  Optimal conditions:");
    for factor in Factor::ALL {
        println!(
            "    {:<12} {:.2}",
            factor.label(),
            crop.optimal_conditions[factor.index()]
        );
    }

    Ok(())
}

fn validate_tables(reference: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let store = load_store(&config, reference.as_deref()).context("Validation failed")?;

    println!(
        "✓ Reference tables are valid ({} crops, {} classes, fingerprint {})",
        store.len(),
        store.class_mappings().count(),
        store.fingerprint()
    );

    Ok(())
}
