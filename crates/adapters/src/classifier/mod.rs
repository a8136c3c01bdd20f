//! Crop classifier adapters

pub mod centroid;
pub mod command;
pub mod stub;

pub use centroid::{CentroidClassifier, CentroidModel};
pub use command::CommandClassifier;
pub use stub::StubClassifier;

use crop_advisor_domain::ClassifierOutput;
use serde::Deserialize;
use std::time::Duration;

/// Shared settings for classifier adapters that call out to another process
#[derive(Debug, Clone)]
pub struct ClassifierSettings {
    /// Per-attempt timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries on failure
    pub retries: u32,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            retries: 2,
        }
    }
}

impl ClassifierSettings {
    /// Delay before retry `attempt` (1-based): 1s, 2s, 4s, ...
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(500 * 2_u64.pow(attempt))
    }

    /// Worst-case wall time of one prediction: every attempt timing out plus
    /// every backoff sleep
    pub fn total_budget(&self) -> Duration {
        let attempts = Duration::from_secs(self.timeout_secs) * (self.retries + 1);
        (1..=self.retries).fold(attempts, |total, attempt| total + self.backoff(attempt))
    }
}

#[derive(Deserialize)]
struct PredictionResponse {
    #[serde(alias = "classes")]
    class_ids: Vec<u32>,
    #[serde(alias = "probas")]
    probabilities: Vec<f64>,
}

/// Parse a predictor response.
///
/// Accepts `{"class_ids": [...], "probabilities": [...]}`; `classes` and
/// `probas` are accepted as aliases.
pub fn parse_prediction_response(response: &str) -> Result<ClassifierOutput, String> {
    let trimmed = response.trim();
    let parsed: PredictionResponse =
        serde_json::from_str(trimmed).map_err(|e| format!("Failed to parse JSON: {}", e))?;

    if parsed.class_ids.len() != parsed.probabilities.len() {
        return Err(format!(
            "class_ids ({}) and probabilities ({}) differ in length",
            parsed.class_ids.len(),
            parsed.probabilities.len()
        ));
    }

    Ok(ClassifierOutput::new(parsed.class_ids, parsed.probabilities))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prediction_response() {
        let output =
            parse_prediction_response(r#"{"class_ids": [20, 11], "probabilities": [0.87, 0.1]}"#)
                .unwrap();
        assert_eq!(output.class_ids, vec![20, 11]);
        assert_eq!(output.probabilities, vec![0.87, 0.1]);
    }

    #[test]
    fn test_parse_prediction_response_aliases() {
        let output =
            parse_prediction_response("\n{\"classes\": [1], \"probas\": [1.0]}\n").unwrap();
        assert_eq!(output.class_ids, vec![1]);
    }

    #[test]
    fn test_parse_prediction_response_misaligned() {
        let result = parse_prediction_response(r#"{"class_ids": [1, 2], "probabilities": [1.0]}"#);
        assert!(result.unwrap_err().contains("differ in length"));
    }

    #[test]
    fn test_total_budget_covers_retries_and_backoff() {
        let settings = ClassifierSettings::default();
        assert_eq!(settings.backoff(1), Duration::from_secs(1));
        assert_eq!(settings.backoff(2), Duration::from_secs(2));
        assert_eq!(settings.total_budget(), Duration::from_secs(30 * 3 + 1 + 2));

        let single = ClassifierSettings {
            timeout_secs: 5,
            retries: 0,
        };
        assert_eq!(single.total_budget(), Duration::from_secs(5));
    }

    #[test]
    fn test_parse_prediction_response_invalid_json() {
        assert!(parse_prediction_response("not json").is_err());
    }
}
