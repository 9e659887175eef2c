//! Quality metrics applied to aligned records.
//!
//! A metric is a pure function of `{question, answer, contexts, ground_truth}`
//! returning a bounded score. The built-in metrics are deterministic lexical
//! scorers; model-backed scorers plug in through the same [`Metric`] trait.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{MetricFailure, MetricInput, RagEvalError, Result};

pub mod answer_correctness;
pub mod answer_relevancy;
pub mod context_precision;
pub mod context_recall;
pub mod faithfulness;
pub mod text;

pub use answer_correctness::AnswerCorrectness;
pub use answer_relevancy::AnswerRelevancy;
pub use context_precision::ContextPrecision;
pub use context_recall::ContextRecall;
pub use faithfulness::Faithfulness;

/// Core trait that all metrics implement.
#[async_trait]
pub trait Metric: Send + Sync {
    /// Unique name, used as the column/key in every artifact.
    fn name(&self) -> &str;

    /// Inclusive range of valid scores.
    fn range(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    /// Score a single aligned record.
    async fn score(&self, input: &MetricInput<'_>) -> std::result::Result<f64, MetricFailure>;
}

/// Names of the standard metrics, in suite order.
pub const STANDARD_METRICS: [&str; 5] = [
    faithfulness::NAME,
    answer_relevancy::NAME,
    context_recall::NAME,
    context_precision::NAME,
    answer_correctness::NAME,
];

/// Build the built-in metric registered under `name`.
pub fn builtin(name: &str) -> Option<Arc<dyn Metric>> {
    let metric: Arc<dyn Metric> = match name {
        faithfulness::NAME => Arc::new(Faithfulness::default()),
        answer_relevancy::NAME => Arc::new(AnswerRelevancy),
        context_recall::NAME => Arc::new(ContextRecall::default()),
        context_precision::NAME => Arc::new(ContextPrecision::default()),
        answer_correctness::NAME => Arc::new(AnswerCorrectness::default()),
        _ => return None,
    };
    Some(metric)
}

/// Ordered set of metrics run against every record.
#[derive(Clone)]
pub struct MetricSuite {
    metrics: Vec<Arc<dyn Metric>>,
}

impl std::fmt::Debug for MetricSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricSuite")
            .field("metrics", &self.names())
            .finish()
    }
}

impl MetricSuite {
    /// Create a suite; names must be unique and the suite non-empty.
    pub fn new(metrics: Vec<Arc<dyn Metric>>) -> Result<Self> {
        if metrics.is_empty() {
            return Err(RagEvalError::Config(
                "metric suite must contain at least one metric".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for metric in &metrics {
            if !seen.insert(metric.name().to_string()) {
                return Err(RagEvalError::Config(format!(
                    "duplicate metric `{}`",
                    metric.name()
                )));
            }
        }
        Ok(Self { metrics })
    }

    /// The five built-in metrics.
    pub fn standard() -> Self {
        Self {
            metrics: STANDARD_METRICS.iter().filter_map(|n| builtin(n)).collect(),
        }
    }

    /// Build a suite of built-in metrics from their names.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let metrics = names
            .iter()
            .map(|name| {
                builtin(name.as_ref()).ok_or_else(|| {
                    RagEvalError::Config(format!(
                        "unknown metric `{}` (available: {})",
                        name.as_ref(),
                        STANDARD_METRICS.join(", ")
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(metrics)
    }

    pub fn names(&self) -> Vec<String> {
        self.metrics.iter().map(|m| m.name().to_string()).collect()
    }

    pub fn metrics(&self) -> &[Arc<dyn Metric>] {
        &self.metrics
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}
