//! Error taxonomy for evaluation runs.
//!
//! Every stage returns either a fully valid value or one of these errors.
//! None of them are retried; the first one raised ends the run.

use std::path::PathBuf;

/// Structural violations found while validating raw input records.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("input must be a JSON array of records, found {found}")]
    NotAnArray { found: &'static str },

    #[error("record {index} must be an object, found {found}")]
    RecordNotObject { index: usize, found: &'static str },

    #[error("record {index} is missing required key `{key}`")]
    MissingKey { index: usize, key: &'static str },

    #[error("record {index} has unexpected key `{key}`")]
    UnexpectedKey { index: usize, key: String },

    #[error("record {index} key `{key}` must be {expected}, found {found}")]
    WrongType {
        index: usize,
        key: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("record {index} contexts[{position}] must be a string, found {found}")]
    ContextNotString {
        index: usize,
        position: usize,
        found: &'static str,
    },

    #[error("record {index} key `{key}` must not be empty")]
    EmptyField { index: usize, key: &'static str },
}

/// The input record set does not correspond to the reference dataset.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AlignmentError {
    #[error("input has {records} records but the reference dataset has {reference}")]
    LengthMismatch { records: usize, reference: usize },

    #[error("question at index {index} does not match the reference: expected {expected:?}, found {found:?}")]
    QuestionMismatch {
        index: usize,
        expected: String,
        found: String,
    },
}

/// Failure reported by a metric implementation itself.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{reason}")]
pub struct MetricFailure {
    pub reason: String,
}

impl MetricFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// A metric could not produce a usable score for a record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MetricError {
    #[error("metric `{metric}` failed on record {record_index}: {source}")]
    Failed {
        metric: String,
        record_index: usize,
        #[source]
        source: MetricFailure,
    },

    #[error("metric `{metric}` produced non-finite value {value} on record {record_index}")]
    NonFinite {
        metric: String,
        record_index: usize,
        value: f64,
    },

    #[error("metric `{metric}` produced {value} on record {record_index}, outside [{min}, {max}]")]
    OutOfRange {
        metric: String,
        record_index: usize,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("metric `{metric}` panicked on record {record_index}: {detail}")]
    Panicked {
        metric: String,
        record_index: usize,
        detail: String,
    },
}

impl MetricError {
    /// Name of the metric that failed.
    pub fn metric(&self) -> &str {
        match self {
            MetricError::Failed { metric, .. }
            | MetricError::NonFinite { metric, .. }
            | MetricError::OutOfRange { metric, .. }
            | MetricError::Panicked { metric, .. } => metric,
        }
    }

    /// Index of the record the metric failed on.
    pub fn record_index(&self) -> usize {
        match self {
            MetricError::Failed { record_index, .. }
            | MetricError::NonFinite { record_index, .. }
            | MetricError::OutOfRange { record_index, .. }
            | MetricError::Panicked { record_index, .. } => *record_index,
        }
    }
}

/// Top-level error for a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum RagEvalError {
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("alignment error: {0}")]
    Alignment(#[from] AlignmentError),

    #[error("metric evaluation error: {0}")]
    Metric(#[from] MetricError),

    #[error("nothing to score: the input and the reference dataset are both empty")]
    NothingToScore,

    #[error("io error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("unsupported reference dataset format: {}", .0.display())]
    UnsupportedReferenceFormat(PathBuf),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
}

impl RagEvalError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RagEvalError::Io {
            path: path.into(),
            source,
        }
    }

    /// Pipeline stage the error originated from, for log output.
    pub fn stage(&self) -> &'static str {
        match self {
            RagEvalError::Schema(_) | RagEvalError::Json(_) => "schema",
            RagEvalError::Alignment(_) | RagEvalError::NothingToScore => "alignment",
            RagEvalError::Metric(_) => "metrics",
            RagEvalError::Io { .. }
            | RagEvalError::Csv(_)
            | RagEvalError::UnsupportedReferenceFormat(_) => "io",
            RagEvalError::Config(_) | RagEvalError::Toml(_) => "config",
        }
    }
}

/// Result type for rageval operations.
pub type Result<T> = std::result::Result<T, RagEvalError>;

/// Short JSON type name used in schema diagnostics.
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_display_names_record_and_key() {
        let err = SchemaError::MissingKey {
            index: 3,
            key: "contexts",
        };
        let msg = err.to_string();
        assert!(msg.contains("record 3"));
        assert!(msg.contains("contexts"));
    }

    #[test]
    fn test_alignment_error_display() {
        let err = AlignmentError::LengthMismatch {
            records: 2,
            reference: 3,
        };
        assert_eq!(
            err.to_string(),
            "input has 2 records but the reference dataset has 3"
        );
    }

    #[test]
    fn test_metric_error_accessors() {
        let err = MetricError::Failed {
            metric: "faithfulness".to_string(),
            record_index: 7,
            source: MetricFailure::new("boom"),
        };
        assert_eq!(err.metric(), "faithfulness");
        assert_eq!(err.record_index(), 7);
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_stage_mapping() {
        let err: RagEvalError = SchemaError::NotAnArray { found: "object" }.into();
        assert_eq!(err.stage(), "schema");

        assert_eq!(RagEvalError::NothingToScore.stage(), "alignment");

        let err: RagEvalError = AlignmentError::LengthMismatch {
            records: 1,
            reference: 2,
        }
        .into();
        assert_eq!(err.stage(), "alignment");

        let err = RagEvalError::io(
            "/missing",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.stage(), "io");
        assert!(err.to_string().contains("/missing"));
    }
}
