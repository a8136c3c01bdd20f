//! Stub classifier for testing and offline mode

use async_trait::async_trait;
use crop_advisor_domain::{Classifier, ClassifierOutput, ClassifyError, FeatureVector};

/// Stub classifier that returns configurable responses
pub struct StubClassifier {
    response: Option<ClassifierOutput>,
    error: Option<ClassifyError>,
}

impl StubClassifier {
    /// A stub that returns an empty distribution, so every crop keeps the floor confidence
    pub fn empty() -> Self {
        Self {
            response: Some(ClassifierOutput::default()),
            error: None,
        }
    }

    /// A stub that returns a specific distribution
    pub fn with_response(response: ClassifierOutput) -> Self {
        Self {
            response: Some(response),
            error: None,
        }
    }

    /// A stub that always returns an error
    pub fn with_error(error: ClassifyError) -> Self {
        Self {
            response: None,
            error: Some(error),
        }
    }
}

impl Default for StubClassifier {
    fn default() -> Self {
        Self::empty()
    }
}

#[async_trait]
impl Classifier for StubClassifier {
    async fn predict_probabilities(
        &self,
        _features: &FeatureVector,
    ) -> Result<ClassifierOutput, ClassifyError> {
        if let Some(ref error) = self.error {
            return Err(match error {
                ClassifyError::Api(msg) => ClassifyError::Api(msg.clone()),
                ClassifyError::InvalidFormat(msg) => ClassifyError::InvalidFormat(msg.clone()),
                ClassifyError::Timeout => ClassifyError::Timeout,
                ClassifyError::Config(msg) => ClassifyError::Config(msg.clone()),
            });
        }

        Ok(self.response.clone().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features() -> FeatureVector {
        FeatureVector::try_from_slice(&[90.0, 40.0, 43.0, 202.0, 6.5, 82.0, 25.0]).unwrap()
    }

    #[tokio::test]
    async fn test_empty_stub() {
        let output = StubClassifier::empty()
            .predict_probabilities(&features())
            .await
            .unwrap();
        assert!(output.class_ids.is_empty());
    }

    #[tokio::test]
    async fn test_configured_response() {
        let expected = ClassifierOutput::new(vec![20, 11], vec![0.87, 0.10]);
        let output = StubClassifier::with_response(expected.clone())
            .predict_probabilities(&features())
            .await
            .unwrap();
        assert_eq!(output, expected);
    }

    #[tokio::test]
    async fn test_error_stub() {
        let result = StubClassifier::with_error(ClassifyError::Timeout)
            .predict_probabilities(&features())
            .await;
        assert!(matches!(result, Err(ClassifyError::Timeout)));
    }
}
