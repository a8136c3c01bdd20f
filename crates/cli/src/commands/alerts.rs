//! Alerts command - soil alerts for a sample and field plan

use anyhow::{Context, Result, bail};
use crop_advisor_domain::{FieldPlan, SoilSample};
use std::path::PathBuf;

use super::{read_json, soil_from_flags};
use crate::args::AlertsArgs;
use crate::config::AppConfig;

pub async fn execute(args: AlertsArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    let soil: SoilSample = match args.soil {
        Some(ref path) => read_json(path).context("Failed to read soil sample")?,
        None => match soil_from_flags(args.nitrogen, args.phosphorus, args.potassium, args.ph) {
            Some(soil) => soil,
            None => bail!("Pass --nitrogen, --phosphorus, --potassium and --ph, or --soil"),
        },
    };

    let plan: Option<FieldPlan> = match args.plan {
        Some(ref path) => Some(read_json(path).context("Failed to read field plan")?),
        None => None,
    };

    let alerts = config.alerts.evaluate(&soil, plan.as_ref());

    if args.json {
        let json = serde_json::to_string_pretty(&alerts).context("Failed to serialize output")?;
        println!("{}", json);
    } else if alerts.is_empty() {
        println!("No alerts. Soil conditions are within the configured limits.");
    } else {
        println!("Soil Alerts ({})", alerts.len());
        println!("===============");
        println!();
        for alert in &alerts {
            println!("⚠ {}", alert.title);
            println!("  {}", alert.message);
        }
    }

    Ok(())
}
