//! Classifier that shells out to an external predictor process
//!
//! The predictor receives `{"features": [N, P, K, rainfall, ph, humidity, temperature]}`
//! on stdin (unless a `{features}` placeholder is used in its arguments) and must
//! print `{"class_ids": [...], "probabilities": [...]}` on stdout.

use async_trait::async_trait;
use crop_advisor_domain::{Classifier, ClassifierOutput, ClassifyError, FeatureVector};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{ClassifierSettings, parse_prediction_response};

/// Classifier backed by a local command, e.g. a Python script wrapping a pickled model
pub struct CommandClassifier {
    command: String,
    args: Vec<String>,
    settings: ClassifierSettings,
}

impl CommandClassifier {
    pub fn new(command: String, args: Vec<String>, settings: ClassifierSettings) -> Self {
        Self {
            command,
            args,
            settings,
        }
    }

    async fn run_command(&self, features: &FeatureVector) -> Result<String, ClassifyError> {
        let (expanded_args, used_features_arg) = expand_args(&self.args, features);

        let mut command = Command::new(&self.command);
        command.args(&expanded_args);
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());
        command.kill_on_drop(true);
        if used_features_arg {
            command.stdin(Stdio::null());
        } else {
            command.stdin(Stdio::piped());
        }

        let mut child = command.spawn().map_err(|e| {
            ClassifyError::Api(format!("Failed to spawn command {}: {}", self.command, e))
        })?;

        if !used_features_arg {
            if let Some(mut stdin) = child.stdin.take() {
                let payload = serde_json::json!({ "features": features.to_array() }).to_string();
                stdin.write_all(payload.as_bytes()).await.map_err(|e| {
                    ClassifyError::Api(format!("Failed to write to stdin: {}", e))
                })?;
            }
        }

        // Drain stdout and stderr while waiting so a chatty predictor cannot fill a pipe
        let output = match tokio::time::timeout(
            Duration::from_secs(self.settings.timeout_secs),
            child.wait_with_output(),
        )
        .await
        {
            Ok(result) => result.map_err(|e| ClassifyError::Api(e.to_string()))?,
            // Dropping the future drops the child, and kill_on_drop terminates it
            Err(_) => return Err(ClassifyError::Timeout),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ClassifyError::Api(format!(
                "Command exited with {}: {}",
                output.status, stderr
            )));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| ClassifyError::InvalidFormat(e.to_string()))?;
        if stdout.trim().is_empty() {
            return Err(ClassifyError::InvalidFormat("Empty response".to_string()));
        }

        Ok(stdout)
    }
}

#[async_trait]
impl Classifier for CommandClassifier {
    async fn predict_probabilities(
        &self,
        features: &FeatureVector,
    ) -> Result<ClassifierOutput, ClassifyError> {
        let mut last_error = None;
        for attempt in 0..=self.settings.retries {
            if attempt > 0 {
                tracing::warn!(attempt = attempt, command = %self.command, "Retrying prediction");
                tokio::time::sleep(self.settings.backoff(attempt)).await;
            }

            match self.run_command(features).await {
                Ok(response_text) => match parse_prediction_response(&response_text) {
                    Ok(output) => return Ok(output),
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to parse predictor output");
                        last_error = Some(ClassifyError::InvalidFormat(e));
                    }
                },
                Err(e) => {
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ClassifyError::Api("Unknown error".to_string())))
    }
}

/// Replace `{features}` (comma separated) and `{features_json}` placeholders
fn expand_args(args: &[String], features: &FeatureVector) -> (Vec<String>, bool) {
    let values = features.to_array();
    let csv = values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",");
    let json = serde_json::json!(values).to_string();

    let mut used_features_arg = false;
    let mut expanded = Vec::with_capacity(args.len());

    for arg in args {
        let mut value = arg.clone();
        if value.contains("{features_json}") {
            used_features_arg = true;
            value = value.replace("{features_json}", &json);
        }
        if value.contains("{features}") {
            used_features_arg = true;
            value = value.replace("{features}", &csv);
        }
        expanded.push(value);
    }

    (expanded, used_features_arg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features() -> FeatureVector {
        FeatureVector::try_from_slice(&[90.0, 40.0, 43.0, 202.0, 6.5, 82.0, 25.0]).unwrap()
    }

    #[test]
    fn test_expand_args_replaces_placeholders() {
        let args = vec![
            "predict.py".to_string(),
            "--input={features}".to_string(),
        ];

        let (expanded, used) = expand_args(&args, &features());
        assert!(used);
        assert_eq!(
            expanded,
            vec!["predict.py", "--input=90,40,43,202,6.5,82,25"]
        );
    }

    #[test]
    fn test_expand_args_without_placeholders() {
        let args = vec!["predict.py".to_string()];
        let (expanded, used) = expand_args(&args, &features());
        assert!(!used);
        assert_eq!(expanded, args);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_predict_with_local_command() {
        let script = r#"cat >/dev/null; printf '{"class_ids":[20,11],"probabilities":[0.87,0.1]}'"#;
        let classifier = CommandClassifier::new(
            "sh".to_string(),
            vec!["-c".to_string(), script.to_string()],
            ClassifierSettings {
                retries: 0,
                ..ClassifierSettings::default()
            },
        );

        let output = classifier.predict_probabilities(&features()).await.unwrap();
        assert_eq!(output.class_ids, vec![20, 11]);
        assert_eq!(output.probabilities, vec![0.87, 0.1]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_receives_features_on_stdin() {
        // Echo the first feature back as the probability of class 0
        let script = r#"read line; n=$(echo "$line" | sed 's/.*\[\([0-9.]*\),.*/\1/'); printf '{"class_ids":[0],"probabilities":[%s]}' "$n""#;
        let classifier = CommandClassifier::new(
            "sh".to_string(),
            vec!["-c".to_string(), script.to_string()],
            ClassifierSettings {
                retries: 0,
                ..ClassifierSettings::default()
            },
        );

        let output = classifier.predict_probabilities(&features()).await.unwrap();
        assert_eq!(output.probabilities, vec![90.0]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_command_is_api_error() {
        let classifier = CommandClassifier::new(
            "sh".to_string(),
            vec!["-c".to_string(), "echo boom >&2; exit 3".to_string()],
            ClassifierSettings {
                retries: 0,
                ..ClassifierSettings::default()
            },
        );

        let result = classifier.predict_probabilities(&features()).await;
        assert!(matches!(result, Err(ClassifyError::Api(msg)) if msg.contains("boom")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_slow_command_times_out() {
        let classifier = CommandClassifier::new(
            "sh".to_string(),
            vec!["-c".to_string(), "sleep 5".to_string()],
            ClassifierSettings {
                timeout_secs: 1,
                retries: 0,
            },
        );

        let result = classifier.predict_probabilities(&features()).await;
        assert!(matches!(result, Err(ClassifyError::Timeout)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_large_stderr_does_not_block_prediction() {
        // Well past the 64 KiB pipe buffer
        let script = r#"cat >/dev/null; head -c 204800 /dev/zero | tr '\0' w >&2; printf '{"class_ids":[20],"probabilities":[0.9]}'"#;
        let classifier = CommandClassifier::new(
            "sh".to_string(),
            vec!["-c".to_string(), script.to_string()],
            ClassifierSettings {
                timeout_secs: 5,
                retries: 0,
            },
        );

        let output = classifier.predict_probabilities(&features()).await.unwrap();
        assert_eq!(output.class_ids, vec![20]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_retry_after_timeout_completes_within_recommend() {
        use crate::reference::BuiltinReferenceRepo;
        use crop_advisor_domain::ReferenceRepo;
        use crop_advisor_domain::usecases::{
            RankConfig, RankingEngine, RecommendConfig, RecommendUseCase,
        };
        use std::sync::Arc;

        let dir = tempfile::TempDir::new().unwrap();
        let marker = dir.path().join("first-attempt");
        // First run hangs past the attempt timeout, the second answers at once
        let script = format!(
            r#"cat >/dev/null; if [ -f '{0}' ]; then printf '{{"class_ids":[20],"probabilities":[0.87]}}'; else touch '{0}'; sleep 10; fi"#,
            marker.display()
        );
        let settings = ClassifierSettings {
            timeout_secs: 1,
            retries: 1,
        };
        let budget = settings.total_budget();
        let classifier =
            CommandClassifier::new("sh".to_string(), vec!["-c".to_string(), script], settings);

        let store = Arc::new(BuiltinReferenceRepo.load().unwrap());
        let usecase = RecommendUseCase::new(
            classifier,
            RankingEngine::new(store, RankConfig::default()),
            RecommendConfig {
                classifier_timeout: budget,
                ..Default::default()
            },
        );

        let outcome = usecase
            .recommend(&features().to_array(), Some(100))
            .await
            .unwrap();
        assert!(marker.exists());
        let rice = outcome.results.iter().find(|r| r.crop == "rice").unwrap();
        assert_eq!(rice.confidence, 0.87);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_garbage_output_is_invalid_format() {
        let classifier = CommandClassifier::new(
            "sh".to_string(),
            vec!["-c".to_string(), "cat >/dev/null; echo nope".to_string()],
            ClassifierSettings {
                retries: 0,
                ..ClassifierSettings::default()
            },
        );

        let result = classifier.predict_probabilities(&features()).await;
        assert!(matches!(result, Err(ClassifyError::InvalidFormat(_))));
    }
}
