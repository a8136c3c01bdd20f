//! Profitability ranking engine
//!
//! Blends classifier confidence with the per-crop economic model and returns
//! the crops with the highest confidence-adjusted monthly profit.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    model::{ClassifierOutput, FeatureVector, Nutrient, RankedCropResult, RankingOutcome},
    ports::RankError,
    reference::EconomicReferenceStore,
};

/// Lowest confidence floor the engine accepts; no crop may rank at zero confidence
pub const MIN_CONFIDENCE_FLOOR: f64 = 0.01;

/// Configuration for the ranking engine
#[derive(Debug, Clone)]
pub struct RankConfig {
    /// Number of crops returned when the caller does not override it
    pub top_k: usize,
    /// Minimum confidence assigned to every crop
    pub confidence_floor: f64,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            confidence_floor: MIN_CONFIDENCE_FLOOR,
        }
    }
}

impl RankConfig {
    /// Reject floors that are not finite or fall below [`MIN_CONFIDENCE_FLOOR`]
    pub fn validate(&self) -> Result<(), RankError> {
        if !self.confidence_floor.is_finite() || self.confidence_floor < MIN_CONFIDENCE_FLOOR {
            return Err(RankError::InvalidInput(format!(
                "confidence_floor must be a finite value >= {}, got {}",
                MIN_CONFIDENCE_FLOOR, self.confidence_floor
            )));
        }
        Ok(())
    }
}

/// Ranks crops by adjusted monthly profit
pub struct RankingEngine {
    store: Arc<EconomicReferenceStore>,
    config: RankConfig,
}

impl RankingEngine {
    pub fn new(store: Arc<EconomicReferenceStore>, config: RankConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &EconomicReferenceStore {
        &self.store
    }

    pub fn config(&self) -> &RankConfig {
        &self.config
    }

    /// Rank every known crop and return the top `top_k` (or the configured default).
    ///
    /// Classifier classes without a crop mapping are skipped and reported in
    /// `dropped_class_ids`.
    pub fn rank_crops(
        &self,
        features: &[f64],
        output: &ClassifierOutput,
        top_k: Option<usize>,
    ) -> Result<RankingOutcome, RankError> {
        let features = FeatureVector::try_from_slice(features)?;
        self.rank(&features, output, top_k)
    }

    /// Same as [`rank_crops`](Self::rank_crops) for an already validated vector
    pub fn rank(
        &self,
        features: &FeatureVector,
        output: &ClassifierOutput,
        top_k: Option<usize>,
    ) -> Result<RankingOutcome, RankError> {
        self.config.validate()?;
        validate_output(output)?;

        if self.store.is_empty() {
            return Err(RankError::EmptyReferenceStore);
        }

        let floor = self.config.confidence_floor;
        let mut confidences: HashMap<&str, f64> = self
            .store
            .list_crops()
            .into_iter()
            .map(|name| (name, floor))
            .collect();

        let mut dropped_class_ids = Vec::new();
        for (class_id, probability) in output.entries() {
            match self.store.resolve_class_index(class_id) {
                Ok(name) => {
                    if let Some(confidence) = confidences.get_mut(name) {
                        *confidence = probability.max(floor);
                    }
                }
                Err(_) => dropped_class_ids.push(class_id),
            }
        }

        if !dropped_class_ids.is_empty() {
            tracing::warn!(
                dropped = ?dropped_class_ids,
                fingerprint = %self.store.fingerprint(),
                "Classifier emitted class ids with no crop mapping; their probability was dropped"
            );
        }

        let fertilizer_cost: f64 = Nutrient::ALL
            .iter()
            .map(|&n| features.nutrient(n) * self.store.fertilizer_unit_cost(n))
            .sum();

        let mut results: Vec<RankedCropResult> = self
            .store
            .crops()
            .iter()
            .map(|crop| {
                let revenue = crop.average_yield
                    * crop.market_price
                    * self.store.revenue_multiplier(crop);
                let costs = crop.seed_cost + crop.maintenance_cost + fertilizer_cost;
                let basic_profit = revenue - costs;
                let monthly_profit = basic_profit / crop.growing_period;
                let roi = if costs > 0.0 {
                    basic_profit / costs * 100.0
                } else {
                    0.0
                };
                let monthly_roi = roi / crop.growing_period;
                let confidence = confidences
                    .get(crop.name.as_str())
                    .copied()
                    .unwrap_or(floor);

                RankedCropResult {
                    crop: crop.name.clone(),
                    confidence,
                    revenue,
                    costs,
                    basic_profit,
                    monthly_profit,
                    adjusted_profit: monthly_profit * confidence,
                    roi,
                    monthly_roi,
                    adjusted_roi: monthly_roi * confidence,
                    growing_period: crop.growing_period,
                }
            })
            .collect();

        results.sort_by(compare_results);
        results.truncate(top_k.unwrap_or(self.config.top_k));

        tracing::debug!(
            returned = results.len(),
            fertilizer_cost,
            top = ?results.first().map(|r| &r.crop),
            "Ranked crops"
        );

        Ok(RankingOutcome {
            results,
            dropped_class_ids,
        })
    }
}

/// Adjusted profit descending, then crop name ascending
fn compare_results(a: &RankedCropResult, b: &RankedCropResult) -> Ordering {
    b.adjusted_profit
        .total_cmp(&a.adjusted_profit)
        .then_with(|| a.crop.cmp(&b.crop))
}

fn validate_output(output: &ClassifierOutput) -> Result<(), RankError> {
    if output.class_ids.len() != output.probabilities.len() {
        return Err(RankError::InvalidInput(format!(
            "classifier returned {} class ids but {} probabilities",
            output.class_ids.len(),
            output.probabilities.len()
        )));
    }
    if let Some((class_id, p)) = output.entries().find(|(_, p)| !p.is_finite()) {
        return Err(RankError::InvalidInput(format!(
            "probability for class {} is not finite: {}",
            class_id, p
        )));
    }
    Ok(())
}
