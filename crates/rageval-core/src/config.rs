//! Run configuration.
//!
//! An explicit value handed to the pipeline; nothing here is process-wide.
//! Loaded from TOML, then overridden field by field by the CLI.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{RagEvalError, Result};
use crate::gate::ScoreThresholds;
use crate::metric::STANDARD_METRICS;

pub const DEFAULT_REFERENCE_PATH: &str = "./eval/eval_dataset.csv";
pub const DEFAULT_OUTPUT_DIR: &str = "./results";
pub const DEFAULT_DETAILS_FILE: &str = "ragas-eval-run-details.csv";
pub const DEFAULT_SUMMARY_FILE: &str = "ragas-eval-scores.json";

/// Settings for one evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EvalConfig {
    /// Reference dataset (`.csv` or `.json`).
    pub reference_path: PathBuf,
    /// Directory receiving both artifacts.
    pub output_dir: PathBuf,
    pub details_file: String,
    pub summary_file: String,
    /// Metric names, in the order they appear in artifacts.
    pub metrics: Vec<String>,
    /// Upper bound on concurrently running metric evaluations.
    pub max_concurrent: usize,
    pub thresholds: ScoreThresholds,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            reference_path: PathBuf::from(DEFAULT_REFERENCE_PATH),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            details_file: DEFAULT_DETAILS_FILE.to_string(),
            summary_file: DEFAULT_SUMMARY_FILE.to_string(),
            metrics: STANDARD_METRICS.iter().map(|m| m.to_string()).collect(),
            max_concurrent: 4,
            thresholds: ScoreThresholds::default(),
        }
    }
}

impl EvalConfig {
    /// Parse a TOML document; missing fields keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RagEvalError::io(path, e))?;
        Self::from_toml_str(&content)
    }

    pub fn details_path(&self) -> PathBuf {
        self.output_dir.join(&self.details_file)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.output_dir.join(&self.summary_file)
    }

    /// Reject settings no run could succeed with.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent == 0 {
            return Err(RagEvalError::Config(
                "max_concurrent must be at least 1".to_string(),
            ));
        }
        if self.metrics.is_empty() {
            return Err(RagEvalError::Config(
                "at least one metric must be configured".to_string(),
            ));
        }
        for (field, name) in [
            ("details_file", &self.details_file),
            ("summary_file", &self.summary_file),
        ] {
            if name.trim().is_empty() {
                return Err(RagEvalError::Config(format!("{field} must not be empty")));
            }
        }
        if self.details_file == self.summary_file {
            return Err(RagEvalError::Config(
                "details_file and summary_file must differ".to_string(),
            ));
        }

        let thresholds = self
            .thresholds
            .min_aggregate
            .iter()
            .map(|v| ("min_aggregate".to_string(), *v))
            .chain(
                self.thresholds
                    .min_metric
                    .iter()
                    .map(|(k, v)| (format!("min_metric.{k}"), *v)),
            );
        for (name, value) in thresholds {
            if !(0.0..=1.0).contains(&value) {
                return Err(RagEvalError::Config(format!(
                    "threshold {name} must be within [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EvalConfig::default();
        assert_eq!(config.metrics.len(), 5);
        assert_eq!(config.max_concurrent, 4);
        assert_eq!(
            config.summary_path(),
            PathBuf::from("./results/ragas-eval-scores.json")
        );
        config.validate().expect("defaults are valid");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EvalConfig::from_toml_str(
            r#"
reference_path = "data/reference.json"
metrics = ["faithfulness", "context_recall"]

[thresholds]
min_aggregate = 0.6

[thresholds.min_metric]
faithfulness = 0.8
"#,
        )
        .expect("parse");

        assert_eq!(config.reference_path, PathBuf::from("data/reference.json"));
        assert_eq!(config.metrics, vec!["faithfulness", "context_recall"]);
        assert_eq!(config.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(config.thresholds.min_aggregate, Some(0.6));
        assert_eq!(config.thresholds.min_metric["faithfulness"], 0.8);
        config.validate().expect("valid");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = EvalConfig::from_toml_str("max_concurency = 2").unwrap_err();
        assert!(matches!(err, RagEvalError::Toml(_)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = EvalConfig {
            max_concurrent: 0,
            ..EvalConfig::default()
        };
        assert!(config.validate().is_err());

        let config = EvalConfig {
            metrics: vec![],
            ..EvalConfig::default()
        };
        assert!(config.validate().is_err());

        let config = EvalConfig {
            summary_file: DEFAULT_DETAILS_FILE.to_string(),
            ..EvalConfig::default()
        };
        assert!(config.validate().is_err());

        let config = EvalConfig {
            thresholds: ScoreThresholds::default().with_min_aggregate(1.5),
            ..EvalConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("min_aggregate"));
    }
}
