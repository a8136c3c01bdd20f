//! Domain models and value objects

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ports::RankError;

/// Soil nutrient charged through fertilizer unit costs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Nutrient {
    N,
    P,
    K,
}

impl Nutrient {
    pub const ALL: [Nutrient; 3] = [Nutrient::N, Nutrient::P, Nutrient::K];

    pub fn symbol(&self) -> &'static str {
        match self {
            Nutrient::N => "N",
            Nutrient::P => "P",
            Nutrient::K => "K",
        }
    }
}

impl fmt::Display for Nutrient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Nutrient {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "N" | "n" => Ok(Nutrient::N),
            "P" | "p" => Ok(Nutrient::P),
            "K" | "k" => Ok(Nutrient::K),
            other => Err(format!("unknown nutrient '{}': expected N, P or K", other)),
        }
    }
}

/// One of the seven classifier input features, in vector order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    Nitrogen,
    Phosphorus,
    Potassium,
    Rainfall,
    Ph,
    Humidity,
    Temperature,
}

impl Factor {
    pub const ALL: [Factor; 7] = [
        Factor::Nitrogen,
        Factor::Phosphorus,
        Factor::Potassium,
        Factor::Rainfall,
        Factor::Ph,
        Factor::Humidity,
        Factor::Temperature,
    ];

    /// Position of this factor in a feature vector
    pub fn index(&self) -> usize {
        match self {
            Factor::Nitrogen => 0,
            Factor::Phosphorus => 1,
            Factor::Potassium => 2,
            Factor::Rainfall => 3,
            Factor::Ph => 4,
            Factor::Humidity => 5,
            Factor::Temperature => 6,
        }
    }

    /// Short label used in reports (N, P, K, rainfall, ph, humidity, temperature)
    pub fn label(&self) -> &'static str {
        match self {
            Factor::Nitrogen => "N",
            Factor::Phosphorus => "P",
            Factor::Potassium => "K",
            Factor::Rainfall => "rainfall",
            Factor::Ph => "ph",
            Factor::Humidity => "humidity",
            Factor::Temperature => "temperature",
        }
    }
}

/// Classifier input: `[N, P, K, rainfall, pH, humidity, temperature]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    pub rainfall: f64,
    pub ph: f64,
    pub humidity: f64,
    pub temperature: f64,
}

impl FeatureVector {
    pub const LEN: usize = 7;

    /// Build from a raw slice, requiring exactly seven finite values
    pub fn try_from_slice(values: &[f64]) -> Result<Self, RankError> {
        if values.len() != Self::LEN {
            return Err(RankError::InvalidInput(format!(
                "expected {} features, got {}",
                Self::LEN,
                values.len()
            )));
        }
        if let Some((idx, value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(RankError::InvalidInput(format!(
                "feature {} ({}) is not finite: {}",
                idx,
                Factor::ALL[idx].label(),
                value
            )));
        }

        Ok(Self {
            nitrogen: values[0],
            phosphorus: values[1],
            potassium: values[2],
            rainfall: values[3],
            ph: values[4],
            humidity: values[5],
            temperature: values[6],
        })
    }

    /// Assemble a feature vector from a soil sample and a forecast summary.
    ///
    /// `rainfall_offset_mm` is added to the forecast rainfall before it is
    /// handed to the classifier.
    pub fn from_soil_and_forecast(
        soil: &SoilSample,
        forecast: &ForecastSummary,
        rainfall_offset_mm: f64,
    ) -> Result<Self, RankError> {
        Self::try_from_slice(&[
            soil.nitrogen,
            soil.phosphorus,
            soil.potassium,
            forecast.avg_rainfall + rainfall_offset_mm,
            soil.ph,
            forecast.avg_humidity,
            forecast.avg_temperature,
        ])
    }

    pub fn to_array(&self) -> [f64; Self::LEN] {
        [
            self.nitrogen,
            self.phosphorus,
            self.potassium,
            self.rainfall,
            self.ph,
            self.humidity,
            self.temperature,
        ]
    }

    pub fn get(&self, factor: Factor) -> f64 {
        self.to_array()[factor.index()]
    }

    /// Quantity of a fertilizer nutrient in this input
    pub fn nutrient(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::N => self.nitrogen,
            Nutrient::P => self.phosphorus,
            Nutrient::K => self.potassium,
        }
    }
}

/// Whether a crop's average yield is a per-area density or already a field total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YieldBasis {
    /// Yield is scaled by the reference area multiplier
    #[default]
    PerArea,
    /// Yield is already a whole-field quantity; no area scaling
    WholeField,
}

/// Economic constants for a single crop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropEconomics {
    /// Lower-case crop identifier
    pub name: String,
    /// Yield per unit area (units differ between crops)
    pub average_yield: f64,
    /// Currency per yield unit
    pub market_price: f64,
    pub seed_cost: f64,
    pub maintenance_cost: f64,
    /// Months per cultivation cycle
    pub growing_period: f64,
    /// Mean conditions `[N, P, K, rainfall, pH, humidity, temperature]`
    pub optimal_conditions: [f64; FeatureVector::LEN],
    #[serde(default)]
    pub yield_basis: YieldBasis,
}

/// Probability distribution emitted by an external classifier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassifierOutput {
    /// Classifier class identifiers, aligned with `probabilities`
    pub class_ids: Vec<u32>,
    pub probabilities: Vec<f64>,
}

impl ClassifierOutput {
    pub fn new(class_ids: Vec<u32>, probabilities: Vec<f64>) -> Self {
        Self {
            class_ids,
            probabilities,
        }
    }

    /// Iterate `(class_id, probability)` pairs
    pub fn entries(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.class_ids
            .iter()
            .copied()
            .zip(self.probabilities.iter().copied())
    }

    /// Class with the highest probability, if any
    pub fn top_class(&self) -> Option<(u32, f64)> {
        self.entries()
            .max_by(|a, b| a.1.total_cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
    }
}

/// Profitability figures for one crop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCropResult {
    pub crop: String,
    /// Classifier confidence, floored
    pub confidence: f64,
    pub revenue: f64,
    pub costs: f64,
    pub basic_profit: f64,
    pub monthly_profit: f64,
    pub adjusted_profit: f64,
    /// Percent; 0 when costs are not positive
    pub roi: f64,
    pub monthly_roi: f64,
    pub adjusted_roi: f64,
    pub growing_period: f64,
}

/// Output of a ranking call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingOutcome {
    /// Top crops by adjusted profit
    pub results: Vec<RankedCropResult>,
    /// Classifier class ids with no crop mapping; their mass was dropped
    pub dropped_class_ids: Vec<u32>,
}

/// Measured soil parameters for a plot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoilSample {
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    pub ph: f64,
}

/// Averaged weather forecast over a horizon
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub avg_temperature: f64,
    pub avg_humidity: f64,
    pub avg_rainfall: f64,
    pub horizon_days: u32,
}

/// A single ranking request in a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotRequest {
    /// Caller-chosen identifier echoed back in the result
    pub id: String,
    pub features: Vec<f64>,
    #[serde(default)]
    pub top_k: Option<usize>,
}

/// Per-plot result of a batch recommendation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlotRecommendation {
    Ranked {
        id: String,
        outcome: RankingOutcome,
    },
    Failed {
        id: String,
        error: String,
    },
}

impl PlotRecommendation {
    pub fn id(&self) -> &str {
        match self {
            PlotRecommendation::Ranked { id, .. } | PlotRecommendation::Failed { id, .. } => id,
        }
    }
}

/// Land allocation used for overcrowding checks
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldPlan {
    pub total_acres: f64,
    #[serde(default)]
    pub allocations: Vec<CropAllocation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropAllocation {
    pub crop: String,
    pub acres: f64,
}

impl FieldPlan {
    pub fn allocated_acres(&self) -> f64 {
        self.allocations.iter().map(|a| a.acres).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_vector_rejects_wrong_length() {
        let result = FeatureVector::try_from_slice(&[1.0, 2.0, 3.0]);
        assert!(matches!(result, Err(RankError::InvalidInput(_))));
    }

    #[test]
    fn test_feature_vector_rejects_non_finite() {
        let result = FeatureVector::try_from_slice(&[1.0, 2.0, 3.0, f64::NAN, 6.5, 80.0, 25.0]);
        assert!(matches!(result, Err(RankError::InvalidInput(msg)) if msg.contains("rainfall")));
    }

    #[test]
    fn test_feature_vector_from_soil_and_forecast_applies_offset() {
        let soil = SoilSample {
            nitrogen: 90.0,
            phosphorus: 40.0,
            potassium: 43.0,
            ph: 6.5,
        };
        let forecast = ForecastSummary {
            avg_temperature: 25.0,
            avg_humidity: 82.0,
            avg_rainfall: 52.0,
            horizon_days: 90,
        };

        let features = FeatureVector::from_soil_and_forecast(&soil, &forecast, 150.0).unwrap();
        assert_eq!(
            features.to_array(),
            [90.0, 40.0, 43.0, 202.0, 6.5, 82.0, 25.0]
        );
        assert_eq!(features.get(Factor::Ph), 6.5);
        assert_eq!(features.nutrient(Nutrient::K), 43.0);
    }

    #[test]
    fn test_top_class_picks_highest_probability() {
        let output = ClassifierOutput::new(vec![3, 7, 9], vec![0.2, 0.7, 0.1]);
        assert_eq!(output.top_class(), Some((7, 0.7)));
    }
}
