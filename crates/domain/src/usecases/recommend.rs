//! Recommendation use case - classifier call followed by profitability ranking

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use std::time::Duration;

use crate::{
    model::{FeatureVector, PlotRecommendation, PlotRequest, RankingOutcome},
    ports::{Classifier, ClassifyError, RankError},
    usecases::rank::RankingEngine,
};

/// Configuration for the recommend use case
#[derive(Debug, Clone)]
pub struct RecommendConfig {
    /// Upper bound on a single classifier call
    pub classifier_timeout: Duration,
    /// Maximum plots ranked concurrently in a batch
    pub max_concurrent: usize,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            classifier_timeout: Duration::from_secs(30),
            max_concurrent: 4,
        }
    }
}

/// Errors from the recommend use case.
///
/// `Input`, `Classifier` and `Timeout` mean no valid prediction input could be
/// obtained; `Rank` means the ranking computation itself failed.
#[derive(Debug, thiserror::Error)]
pub enum RecommendError {
    #[error("Invalid input: {0}")]
    Input(String),
    #[error("Classifier failed: {0}")]
    Classifier(#[source] ClassifyError),
    #[error("Classifier timed out after {0:?}")]
    Timeout(Duration),
    #[error("Ranking failed: {0}")]
    Rank(#[source] RankError),
}

/// Use case combining a classifier with the ranking engine
pub struct RecommendUseCase<C> {
    classifier: C,
    engine: RankingEngine,
    config: RecommendConfig,
}

impl<C: Classifier> RecommendUseCase<C> {
    pub fn new(classifier: C, engine: RankingEngine, config: RecommendConfig) -> Self {
        Self {
            classifier,
            engine,
            config,
        }
    }

    pub fn engine(&self) -> &RankingEngine {
        &self.engine
    }

    /// Predict probabilities for the features and rank crops
    pub async fn recommend(
        &self,
        features: &[f64],
        top_k: Option<usize>,
    ) -> Result<RankingOutcome, RecommendError> {
        let features = FeatureVector::try_from_slice(features).map_err(|e| match e {
            RankError::InvalidInput(msg) => RecommendError::Input(msg),
            other => RecommendError::Rank(other),
        })?;

        tracing::info!(
            features = ?features.to_array(),
            top_k = top_k.unwrap_or(self.engine.config().top_k),
            "Requesting crop recommendation"
        );

        let output = match tokio::time::timeout(
            self.config.classifier_timeout,
            self.classifier.predict_probabilities(&features),
        )
        .await
        {
            Ok(Ok(output)) => output,
            Ok(Err(ClassifyError::Timeout)) => {
                return Err(RecommendError::Timeout(self.config.classifier_timeout));
            }
            Ok(Err(e)) => return Err(RecommendError::Classifier(e)),
            Err(_) => return Err(RecommendError::Timeout(self.config.classifier_timeout)),
        };

        tracing::debug!(
            classes = output.class_ids.len(),
            top_class = ?output.top_class(),
            "Classifier returned probabilities"
        );

        self.engine
            .rank(&features, &output, top_k)
            .map_err(RecommendError::Rank)
    }

    /// Rank several independent plots with bounded concurrency.
    ///
    /// Results are returned in request order; a failing plot does not stop
    /// the others.
    pub async fn recommend_batch(&self, plots: Vec<PlotRequest>) -> Vec<PlotRecommendation> {
        let total = plots.len();
        let max_concurrent = self.config.max_concurrent.max(1);
        let mut slots: Vec<Option<PlotRecommendation>> = vec![None; total];
        let mut tasks: FuturesUnordered<BoxFuture<'_, (usize, PlotRecommendation)>> =
            FuturesUnordered::new();
        let mut plots_iter = plots.into_iter().enumerate();

        tracing::info!(plots = total, max_concurrent, "Ranking batch");

        loop {
            while tasks.len() < max_concurrent {
                let Some((pos, plot)) = plots_iter.next() else {
                    break;
                };
                tasks.push(Box::pin(async move {
                    let result = match self.recommend(&plot.features, plot.top_k).await {
                        Ok(outcome) => PlotRecommendation::Ranked {
                            id: plot.id,
                            outcome,
                        },
                        Err(e) => {
                            tracing::warn!(plot = %plot.id, error = %e, "Plot recommendation failed");
                            PlotRecommendation::Failed {
                                id: plot.id,
                                error: e.to_string(),
                            }
                        }
                    };
                    (pos, result)
                }));
            }

            match tasks.next().await {
                Some((pos, result)) => slots[pos] = Some(result),
                None => break,
            }
        }

        slots.into_iter().flatten().collect()
    }
}
