//! Soil amendment advice
//!
//! Compares current conditions against a crop's optimal conditions and flags
//! each factor whose deviation exceeds its threshold.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    model::{Factor, FeatureVector},
    ports::ReferenceError,
    reference::EconomicReferenceStore,
};

/// Square feet to square metres
const SQFT_TO_M2: f64 = 0.0929;

/// Allowed absolute deviation from optimal, per factor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AmendmentThresholds {
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    /// Millimetres
    pub rainfall: f64,
    pub ph: f64,
    /// Percent
    pub humidity: f64,
    /// Degrees Celsius
    pub temperature: f64,
}

impl Default for AmendmentThresholds {
    fn default() -> Self {
        Self {
            nitrogen: 10.0,
            phosphorus: 5.0,
            potassium: 5.0,
            rainfall: 50.0,
            ph: 0.5,
            humidity: 10.0,
            temperature: 2.0,
        }
    }
}

impl AmendmentThresholds {
    pub fn for_factor(&self, factor: Factor) -> f64 {
        match factor {
            Factor::Nitrogen => self.nitrogen,
            Factor::Phosphorus => self.phosphorus,
            Factor::Potassium => self.potassium,
            Factor::Rainfall => self.rainfall,
            Factor::Ph => self.ph,
            Factor::Humidity => self.humidity,
            Factor::Temperature => self.temperature,
        }
    }
}

/// How a current value relates to the crop's optimum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorStatus {
    WithinRange,
    /// Current value is below optimal by more than the threshold
    Deficient,
    /// Current value is above optimal by more than the threshold
    Excess,
}

/// Assessment of one factor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorAssessment {
    pub factor: Factor,
    pub current: f64,
    pub optimal: f64,
    /// `optimal - current`
    pub diff: f64,
    pub status: FactorStatus,
    /// Supplemental irrigation for a rainfall deficit, in litres
    #[serde(skip_serializing_if = "Option::is_none")]
    pub irrigation_litres: Option<f64>,
}

/// Overall suitability grade derived from the number of significant deviations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallAssessment {
    Excellent,
    Favorable,
    Moderate,
    Challenging,
}

impl OverallAssessment {
    pub fn from_deviations(significant: usize) -> Self {
        match significant {
            0 => OverallAssessment::Excellent,
            1..=2 => OverallAssessment::Favorable,
            3..=4 => OverallAssessment::Moderate,
            _ => OverallAssessment::Challenging,
        }
    }
}

/// Full amendment report for one crop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmendmentReport {
    pub crop: String,
    pub area_sqft: f64,
    /// Assessments in feature order (N, P, K, rainfall, pH, humidity, temperature)
    pub factors: Vec<FactorAssessment>,
    pub significant_deviations: usize,
    pub overall: OverallAssessment,
}

impl AmendmentReport {
    pub fn factor(&self, factor: Factor) -> Option<&FactorAssessment> {
        self.factors.iter().find(|f| f.factor == factor)
    }
}

/// Litres of water needed to cover a rainfall deficit over an area
pub fn water_amount(area_sqft: f64, rainfall_deficit_mm: f64) -> f64 {
    rainfall_deficit_mm * area_sqft * SQFT_TO_M2
}

/// Produces soil amendment reports from the reference optimal conditions
pub struct AmendmentAdvisor {
    store: Arc<EconomicReferenceStore>,
    thresholds: AmendmentThresholds,
}

impl AmendmentAdvisor {
    pub fn new(store: Arc<EconomicReferenceStore>, thresholds: AmendmentThresholds) -> Self {
        Self { store, thresholds }
    }

    /// Assess current conditions for `crop` (case-insensitive)
    pub fn advise(
        &self,
        crop: &str,
        current: &FeatureVector,
        area_sqft: f64,
    ) -> Result<AmendmentReport, ReferenceError> {
        let name = crop.trim().to_lowercase();
        let economics = self.store.get(&name)?;

        let factors: Vec<FactorAssessment> = Factor::ALL
            .iter()
            .map(|&factor| {
                let current_value = current.get(factor);
                let optimal = economics.optimal_conditions[factor.index()];
                let diff = optimal - current_value;
                let status = if diff.abs() > self.thresholds.for_factor(factor) {
                    if diff > 0.0 {
                        FactorStatus::Deficient
                    } else {
                        FactorStatus::Excess
                    }
                } else {
                    FactorStatus::WithinRange
                };
                let irrigation_litres = (factor == Factor::Rainfall
                    && status == FactorStatus::Deficient)
                    .then(|| water_amount(area_sqft, diff).abs());

                FactorAssessment {
                    factor,
                    current: current_value,
                    optimal,
                    diff,
                    status,
                    irrigation_litres,
                }
            })
            .collect();

        let significant_deviations = factors
            .iter()
            .filter(|f| f.status != FactorStatus::WithinRange)
            .count();
        let overall = OverallAssessment::from_deviations(significant_deviations);

        tracing::debug!(
            crop = %name,
            significant_deviations,
            ?overall,
            "Assessed soil amendments"
        );

        Ok(AmendmentReport {
            crop: name,
            area_sqft,
            factors,
            significant_deviations,
            overall,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CropEconomics, Nutrient, YieldBasis};
    use crate::reference::{DEFAULT_AREA_MULTIPLIER, ReferenceTables};
    use approx::assert_relative_eq;
    use std::collections::BTreeMap;

    const RICE_OPTIMAL: [f64; 7] = [78.89, 47.58, 38.97, 236.18, 6.42, 82.27, 23.68];

    fn advisor() -> AmendmentAdvisor {
        let tables = ReferenceTables {
            area_multiplier: DEFAULT_AREA_MULTIPLIER,
            fertilizer_costs: BTreeMap::from([
                (Nutrient::N, 20.0),
                (Nutrient::P, 30.0),
                (Nutrient::K, 25.0),
            ]),
            crops: vec![CropEconomics {
                name: "rice".to_string(),
                average_yield: 4.0,
                market_price: 20.0,
                seed_cost: 5000.0,
                maintenance_cost: 15000.0,
                growing_period: 4.0,
                optimal_conditions: RICE_OPTIMAL,
                yield_basis: YieldBasis::PerArea,
            }],
            classes: vec![],
        };
        AmendmentAdvisor::new(
            Arc::new(EconomicReferenceStore::from_tables(tables).unwrap()),
            AmendmentThresholds::default(),
        )
    }

    #[test]
    fn test_optimal_conditions_are_excellent() {
        let current = FeatureVector::try_from_slice(&RICE_OPTIMAL).unwrap();
        let report = advisor().advise("Rice", &current, 1000.0).unwrap();

        assert_eq!(report.crop, "rice");
        assert_eq!(report.significant_deviations, 0);
        assert_eq!(report.overall, OverallAssessment::Excellent);
        assert!(report.factors.iter().all(|f| f.status == FactorStatus::WithinRange));
    }

    #[test]
    fn test_flags_deficient_and_excess_factors() {
        // N low, pH high, rainfall short by 136.18 mm
        let current =
            FeatureVector::try_from_slice(&[50.0, 47.58, 38.97, 100.0, 7.5, 82.27, 23.68]).unwrap();
        let report = advisor().advise("rice", &current, 1000.0).unwrap();

        assert_eq!(
            report.factor(Factor::Nitrogen).unwrap().status,
            FactorStatus::Deficient
        );
        assert_eq!(report.factor(Factor::Ph).unwrap().status, FactorStatus::Excess);

        let rainfall = report.factor(Factor::Rainfall).unwrap();
        assert_eq!(rainfall.status, FactorStatus::Deficient);
        assert_relative_eq!(
            rainfall.irrigation_litres.unwrap(),
            136.18 * 1000.0 * 0.0929,
            max_relative = 1e-9
        );

        assert_eq!(report.significant_deviations, 3);
        assert_eq!(report.overall, OverallAssessment::Moderate);
    }

    #[test]
    fn test_deviation_equal_to_threshold_is_within_range() {
        let mut values = RICE_OPTIMAL;
        values[6] = 20.0;
        let current = FeatureVector::try_from_slice(&values).unwrap();
        let advisor = AmendmentAdvisor::new(
            Arc::clone(&advisor().store),
            AmendmentThresholds {
                temperature: RICE_OPTIMAL[6] - 20.0,
                ..Default::default()
            },
        );

        let report = advisor.advise("rice", &current, 0.0).unwrap();

        let temperature = report.factor(Factor::Temperature).unwrap();
        assert_eq!(temperature.status, FactorStatus::WithinRange);
        assert_eq!(report.overall, OverallAssessment::Excellent);
    }

    #[test]
    fn test_overall_grades() {
        assert_eq!(OverallAssessment::from_deviations(0), OverallAssessment::Excellent);
        assert_eq!(OverallAssessment::from_deviations(2), OverallAssessment::Favorable);
        assert_eq!(OverallAssessment::from_deviations(4), OverallAssessment::Moderate);
        assert_eq!(OverallAssessment::from_deviations(5), OverallAssessment::Challenging);
    }

    #[test]
    fn test_unknown_crop() {
        let current = FeatureVector::try_from_slice(&RICE_OPTIMAL).unwrap();
        let result = advisor().advise("wheat", &current, 100.0);
        assert!(matches!(result, Err(ReferenceError::UnknownCrop(_))));
    }

    #[test]
    fn test_water_amount() {
        assert_relative_eq!(water_amount(100.0, 10.0), 92.9, max_relative = 1e-12);
    }
}
