//! Score gate.
//!
//! Checks an [`EvaluationSummary`] against [`ScoreThresholds`] to produce a
//! [`GateVerdict`]. The gate runs after artifacts are persisted and only
//! decides whether a caller should treat the run as passing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::reporting::EvaluationSummary;

/// Minimum scores a run must reach.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ScoreThresholds {
    /// Minimum aggregate score.
    pub min_aggregate: Option<f64>,
    /// Minimum mean per metric name.
    pub min_metric: BTreeMap<String, f64>,
}

impl ScoreThresholds {
    pub fn is_empty(&self) -> bool {
        self.min_aggregate.is_none() && self.min_metric.is_empty()
    }

    pub fn with_min_aggregate(mut self, min: f64) -> Self {
        self.min_aggregate = Some(min);
        self
    }

    pub fn with_min_metric(mut self, metric: impl Into<String>, min: f64) -> Self {
        self.min_metric.insert(metric.into(), min);
        self
    }
}

/// A single threshold violation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Violation {
    AggregateBelowMinimum { score: f64, min: f64 },
    MetricBelowMinimum { metric: String, mean: f64, min: f64 },
    MetricNotEvaluated { metric: String },
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::AggregateBelowMinimum { score, min } => {
                write!(f, "aggregate score {score:.4} < required {min:.4}")
            }
            Violation::MetricBelowMinimum { metric, mean, min } => {
                write!(f, "{metric} mean {mean:.4} < required {min:.4}")
            }
            Violation::MetricNotEvaluated { metric } => {
                write!(f, "threshold set for {metric}, which was not evaluated")
            }
        }
    }
}

/// Outcome of checking a summary against thresholds.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GateVerdict {
    /// Violations found (empty when passed).
    pub violations: Vec<Violation>,
}

impl GateVerdict {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Check every threshold and collect all violations.
pub fn evaluate_gate(thresholds: &ScoreThresholds, summary: &EvaluationSummary) -> GateVerdict {
    let mut violations = Vec::new();

    if let Some(min) = thresholds.min_aggregate {
        if summary.aggregate_score < min {
            violations.push(Violation::AggregateBelowMinimum {
                score: summary.aggregate_score,
                min,
            });
        }
    }

    for (metric, min) in &thresholds.min_metric {
        match summary.metric_means.get(metric) {
            Some(mean) if mean < min => violations.push(Violation::MetricBelowMinimum {
                metric: metric.clone(),
                mean: *mean,
                min: *min,
            }),
            Some(_) => {}
            None => violations.push(Violation::MetricNotEvaluated {
                metric: metric.clone(),
            }),
        }
    }

    GateVerdict { violations }
}
