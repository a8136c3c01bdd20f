//! Amend command - soil amendment report for a chosen crop

use anyhow::{Context, Result};
use crop_advisor_domain::usecases::AmendmentAdvisor;
use std::path::PathBuf;

use super::{load_store, resolve_features};
use crate::args::AmendArgs;
use crate::config::AppConfig;
use crate::output::print_amendment;

pub async fn execute(args: AmendArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    if !(args.area_sqft.is_finite() && args.area_sqft > 0.0) {
        anyhow::bail!("--area-sqft must be a positive number");
    }

    let features = resolve_features(&args.features, &config).await?;
    let store = load_store(&config, args.reference.as_deref())?;

    let advisor = AmendmentAdvisor::new(store, config.amendment.clone());
    let report = advisor
        .advise(&args.crop, &features, args.area_sqft)
        .with_context(|| format!("Cannot assess crop {}", args.crop))?;

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize output")?;
        println!("{}", json);
    } else {
        print_amendment(&report);
    }

    Ok(())
}
