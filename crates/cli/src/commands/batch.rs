//! Batch command - rank several plots concurrently

use anyhow::{Context, Result};
use crop_advisor_domain::{
    PlotRecommendation, PlotRequest,
    usecases::{RankingEngine, RecommendUseCase},
};
use std::path::PathBuf;

use super::{build_classifier, load_store, read_json};
use crate::args::BatchArgs;
use crate::config::AppConfig;

pub async fn execute(args: BatchArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    let plots: Vec<PlotRequest> = read_json(&args.input).context("Failed to read plots")?;
    let store = load_store(&config, args.reference.as_deref())?;
    let classifier = build_classifier(&config, &store)?;

    let mut recommend_config = config.recommend_config();
    if let Some(max_concurrent) = args.max_concurrent {
        recommend_config.max_concurrent = max_concurrent;
    }

    let engine = RankingEngine::new(store, config.rank_config());
    let usecase = RecommendUseCase::new(classifier, engine, recommend_config);

    let results = usecase.recommend_batch(plots).await;

    let failed = results
        .iter()
        .filter(|r| matches!(r, PlotRecommendation::Failed { .. }))
        .count();
    tracing::info!(plots = results.len(), failed, "Batch complete");

    let json = serde_json::to_string_pretty(&results).context("Failed to serialize output")?;
    println!("{}", json);

    Ok(())
}
