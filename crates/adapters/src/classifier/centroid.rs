//! Nearest-centroid classifier loaded from a JSON model file
//!
//! Model file format:
//!
//! ```json
//! {
//!   "class_ids": [0, 1],
//!   "centroids": [[...7 values...], [...7 values...]],
//!   "scale": [...7 values...],
//!   "temperature": 1.0
//! }
//! ```
//!
//! Each feature is divided by its `scale` before the Euclidean distance to
//! every centroid is taken. Probabilities are a softmax over
//! `-distance / temperature`.

use async_trait::async_trait;
use crop_advisor_domain::{
    Classifier, ClassifierOutput, ClassifyError, EconomicReferenceStore, FeatureVector,
    ModelLoadError,
};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct CentroidModel {
    pub class_ids: Vec<u32>,
    pub centroids: Vec<[f64; FeatureVector::LEN]>,
    #[serde(default = "default_scale")]
    pub scale: [f64; FeatureVector::LEN],
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

/// Feature scale used when centroids come from the reference optimal conditions
pub const REFERENCE_SCALE: [f64; FeatureVector::LEN] = [10.0, 5.0, 5.0, 50.0, 0.5, 10.0, 2.0];

fn default_scale() -> [f64; FeatureVector::LEN] {
    [1.0; FeatureVector::LEN]
}

fn default_temperature() -> f64 {
    1.0
}

impl CentroidModel {
    /// Read and validate a model file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelLoadError> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let content = std::fs::read_to_string(path).map_err(|source| ModelLoadError::Io {
            path: path_str.clone(),
            source,
        })?;

        let model: CentroidModel =
            serde_json::from_str(&content).map_err(|e| ModelLoadError::Malformed {
                path: path_str.clone(),
                message: e.to_string(),
            })?;

        model
            .validate()
            .map_err(|message| ModelLoadError::Malformed {
                path: path_str.clone(),
                message,
            })?;

        tracing::debug!(path = %path_str, classes = model.class_ids.len(), "Loaded centroid model");
        Ok(model)
    }

    /// Build a model whose centroids are the optimal conditions of each mapped crop.
    ///
    /// Class ids keep the reference class map, so the output resolves back to
    /// the same crops during ranking.
    pub fn from_reference(store: &EconomicReferenceStore) -> Result<Self, ModelLoadError> {
        let mut class_ids = Vec::new();
        let mut centroids = Vec::new();
        for (id, crop) in store.class_mappings() {
            let economics = store.get(crop).map_err(|e| ModelLoadError::Malformed {
                path: "reference".to_string(),
                message: e.to_string(),
            })?;
            class_ids.push(id);
            centroids.push(economics.optimal_conditions);
        }

        let model = Self {
            class_ids,
            centroids,
            scale: REFERENCE_SCALE,
            temperature: default_temperature(),
        };
        model
            .validate()
            .map_err(|message| ModelLoadError::Malformed {
                path: "reference".to_string(),
                message,
            })?;

        Ok(model)
    }

    fn validate(&self) -> Result<(), String> {
        if self.class_ids.is_empty() {
            return Err("model has no classes".to_string());
        }
        if self.class_ids.len() != self.centroids.len() {
            return Err(format!(
                "class_ids ({}) and centroids ({}) differ in length",
                self.class_ids.len(),
                self.centroids.len()
            ));
        }
        if !(self.temperature.is_finite() && self.temperature > 0.0) {
            return Err(format!("temperature must be positive, got {}", self.temperature));
        }
        if self.scale.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
            return Err("scale values must be positive".to_string());
        }
        if self.centroids.iter().flatten().any(|v| !v.is_finite()) {
            return Err("centroids contain non-finite values".to_string());
        }
        Ok(())
    }

    /// Class probabilities for one input, aligned with `class_ids`
    pub fn predict(&self, features: &FeatureVector) -> ClassifierOutput {
        let input = features.to_array();

        let logits: Vec<f64> = self
            .centroids
            .iter()
            .map(|centroid| {
                let distance = input
                    .iter()
                    .zip(centroid)
                    .zip(&self.scale)
                    .map(|((x, c), s)| ((x - c) / s).powi(2))
                    .sum::<f64>()
                    .sqrt();
                -distance / self.temperature
            })
            .collect();

        // Shift by the max logit so exp() cannot overflow
        let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let weights: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
        let total: f64 = weights.iter().sum();

        ClassifierOutput::new(
            self.class_ids.clone(),
            weights.iter().map(|w| w / total).collect(),
        )
    }
}

/// Classifier port over an in-memory [`CentroidModel`]
pub struct CentroidClassifier {
    model: CentroidModel,
}

impl CentroidClassifier {
    pub fn new(model: CentroidModel) -> Self {
        Self { model }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ModelLoadError> {
        Ok(Self::new(CentroidModel::load(path)?))
    }

    pub fn model(&self) -> &CentroidModel {
        &self.model
    }
}

#[async_trait]
impl Classifier for CentroidClassifier {
    async fn predict_probabilities(
        &self,
        features: &FeatureVector,
    ) -> Result<ClassifierOutput, ClassifyError> {
        Ok(self.model.predict(features))
    }
}
