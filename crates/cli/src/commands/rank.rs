//! Rank command - profitability ranking for one plot

use anyhow::{Context, Result};
use crop_advisor_domain::usecases::{RankingEngine, RecommendError, RecommendUseCase};
use std::path::PathBuf;

use super::{build_classifier, load_store, resolve_features};
use crate::args::RankArgs;
use crate::config::AppConfig;
use crate::output::print_ranking;

pub async fn execute(args: RankArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    let features = resolve_features(&args.features, &config).await?;
    let store = load_store(&config, args.reference.as_deref())?;
    let classifier = build_classifier(&config, &store)?;

    let engine = RankingEngine::new(store, config.rank_config());
    let usecase = RecommendUseCase::new(classifier, engine, config.recommend_config());

    let outcome = usecase
        .recommend(&features.to_array(), args.top_k)
        .await
        .map_err(|e| {
            let context = failure_context(&e);
            anyhow::Error::new(e).context(context)
        })?;

    if !outcome.dropped_class_ids.is_empty() {
        eprintln!(
            "warning: classifier returned classes with no crop mapping: {:?}",
            outcome.dropped_class_ids
        );
    }

    if args.json {
        let json = serde_json::to_string_pretty(&outcome).context("Failed to serialize output")?;
        println!("{}", json);
    } else {
        println!("Most Profitable Crops");
        println!("=====================");
        println!();
        print_ranking(&outcome.results, &config.general.currency_symbol);
    }

    Ok(())
}

/// Separate "no usable prediction" from "the ranking itself failed"
fn failure_context(error: &RecommendError) -> &'static str {
    match error {
        RecommendError::Input(_) => "Invalid plot features",
        RecommendError::Classifier(_) | RecommendError::Timeout(_) => {
            "Could not obtain a crop prediction"
        }
        RecommendError::Rank(_) => "Ranking failed",
    }
}
