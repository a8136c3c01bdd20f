//! Soil alert policy

use serde::{Deserialize, Serialize};

use crate::model::{FieldPlan, SoilSample};

/// Alert thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertPolicy {
    /// pH below this raises a low pH alert
    pub min_ph: f64,
    /// pH above this raises a high pH alert
    pub max_ph: f64,
    /// Nitrogen below this raises a low nitrogen alert
    pub min_nitrogen: f64,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            min_ph: 6.0,
            max_ph: 7.5,
            min_nitrogen: 20.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    LowPh,
    HighPh,
    LowNitrogen,
    Overcrowding,
}

/// An actionable warning about a plot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoilAlert {
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
}

impl AlertPolicy {
    /// Evaluate a soil sample and an optional land allocation plan
    pub fn evaluate(&self, soil: &SoilSample, plan: Option<&FieldPlan>) -> Vec<SoilAlert> {
        let mut alerts = Vec::new();

        if soil.ph < self.min_ph {
            alerts.push(SoilAlert {
                kind: AlertKind::LowPh,
                title: "Low pH Alert".to_string(),
                message: format!(
                    "Soil pH is {:.1}, which is below optimal range. Consider liming.",
                    soil.ph
                ),
            });
        } else if soil.ph > self.max_ph {
            alerts.push(SoilAlert {
                kind: AlertKind::HighPh,
                title: "High pH Alert".to_string(),
                message: format!(
                    "Soil pH is {:.1}, which is above optimal range. Consider adding sulfur.",
                    soil.ph
                ),
            });
        }

        if soil.nitrogen < self.min_nitrogen {
            alerts.push(SoilAlert {
                kind: AlertKind::LowNitrogen,
                title: "Low Nitrogen".to_string(),
                message: "Nitrogen levels are below optimal. Consider adding nitrogen-rich fertilizer."
                    .to_string(),
            });
        }

        if let Some(plan) = plan {
            let allocated = plan.allocated_acres();
            if allocated > plan.total_acres {
                alerts.push(SoilAlert {
                    kind: AlertKind::Overcrowding,
                    title: "Overcrowding Alert".to_string(),
                    message: format!(
                        "Total crop area ({:.1} acres) exceeds available land ({:.1} acres). Review crop spacing.",
                        allocated, plan.total_acres
                    ),
                });
            }
        }

        alerts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CropAllocation;

    fn soil(nitrogen: f64, ph: f64) -> SoilSample {
        SoilSample {
            nitrogen,
            phosphorus: 40.0,
            potassium: 40.0,
            ph,
        }
    }

    fn kinds(alerts: &[SoilAlert]) -> Vec<AlertKind> {
        alerts.iter().map(|a| a.kind).collect()
    }

    #[test]
    fn test_healthy_soil_has_no_alerts() {
        let alerts = AlertPolicy::default().evaluate(&soil(60.0, 6.5), None);
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_low_ph_and_low_nitrogen() {
        let alerts = AlertPolicy::default().evaluate(&soil(10.0, 5.2), None);
        assert_eq!(kinds(&alerts), vec![AlertKind::LowPh, AlertKind::LowNitrogen]);
        assert!(alerts[0].message.contains("5.2"));
    }

    #[test]
    fn test_high_ph() {
        let alerts = AlertPolicy::default().evaluate(&soil(60.0, 8.1), None);
        assert_eq!(kinds(&alerts), vec![AlertKind::HighPh]);
    }

    #[test]
    fn test_boundaries_do_not_alert() {
        let alerts = AlertPolicy::default().evaluate(&soil(20.0, 6.0), None);
        assert!(alerts.is_empty());
        let alerts = AlertPolicy::default().evaluate(&soil(20.0, 7.5), None);
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_overcrowding() {
        let plan = FieldPlan {
            total_acres: 5.0,
            allocations: vec![
                CropAllocation {
                    crop: "rice".to_string(),
                    acres: 3.0,
                },
                CropAllocation {
                    crop: "maize".to_string(),
                    acres: 2.5,
                },
            ],
        };

        let alerts = AlertPolicy::default().evaluate(&soil(60.0, 6.5), Some(&plan));
        assert_eq!(kinds(&alerts), vec![AlertKind::Overcrowding]);
    }
}
