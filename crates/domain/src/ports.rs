//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{ClassifierOutput, FeatureVector, ForecastSummary};
use crate::reference::EconomicReferenceStore;

/// Error type for reference table lookups and validation
#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("Unknown crop: {0}")]
    UnknownCrop(String),
    #[error("Unknown classifier class id: {0}")]
    UnknownClass(u32),
    #[error("Duplicate crop '{0}' in reference tables")]
    DuplicateCrop(String),
    #[error("Invalid crop name '{0}': must match [a-z0-9_]+")]
    InvalidName(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error in {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },
}

/// Error type for the ranking engine
#[derive(Debug, Error)]
pub enum RankError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("No crops registered in the reference store")]
    EmptyReferenceStore,
}

/// Error type for loading a classifier model artifact
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("Failed to read model file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed model file {path}: {message}")]
    Malformed { path: String, message: String },
}

/// Error type for classifier operations
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("Classifier error: {0}")]
    Api(String),
    #[error("Invalid response format: {0}")]
    InvalidFormat(String),
    #[error("Timeout")]
    Timeout,
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Port for the pre-trained crop classifier
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Predict a probability per known class for the given features
    async fn predict_probabilities(
        &self,
        features: &FeatureVector,
    ) -> Result<ClassifierOutput, ClassifyError>;
}

#[async_trait]
impl<T: Classifier + ?Sized> Classifier for &T {
    async fn predict_probabilities(
        &self,
        features: &FeatureVector,
    ) -> Result<ClassifierOutput, ClassifyError> {
        (**self).predict_probabilities(features).await
    }
}

#[async_trait]
impl<T: Classifier + ?Sized> Classifier for Box<T> {
    async fn predict_probabilities(
        &self,
        features: &FeatureVector,
    ) -> Result<ClassifierOutput, ClassifyError> {
        (**self).predict_probabilities(features).await
    }
}

/// Error type for forecast providers
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("API error: {0}")]
    Api(String),
    #[error("Invalid response format: {0}")]
    InvalidFormat(String),
    #[error("Network error: {0}")]
    Network(String),
}

/// Port for averaged weather forecasts
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    /// Average temperature, humidity and rainfall over the next `horizon_days`
    async fn forecast(&self, horizon_days: u32) -> Result<ForecastSummary, ForecastError>;
}

/// Port for loading the economic reference tables
pub trait ReferenceRepo: Send + Sync {
    fn load(&self) -> Result<EconomicReferenceStore, ReferenceError>;
}
