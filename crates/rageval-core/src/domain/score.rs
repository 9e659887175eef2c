//! Score containers produced by the orchestrator and the aggregator.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Key of one cell in the record × metric score matrix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScoreKey {
    pub record_index: usize,
    pub metric: String,
}

impl ScoreKey {
    pub fn new(record_index: usize, metric: impl Into<String>) -> Self {
        Self {
            record_index,
            metric: metric.into(),
        }
    }
}

/// Result of one metric applied to one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricScore {
    pub record_index: usize,
    pub metric_name: String,
    pub value: f64,
}

/// Per-record, per-metric scores for a whole run.
///
/// Keys are ordered, so the table (and everything derived from it) does not
/// depend on the order in which metric tasks finished.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScoreTable {
    metric_names: Vec<String>,
    record_count: usize,
    scores: BTreeMap<ScoreKey, f64>,
}

impl ScoreTable {
    pub fn new(metric_names: Vec<String>, record_count: usize) -> Self {
        Self {
            metric_names,
            record_count,
            scores: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, score: MetricScore) {
        self.scores
            .insert(ScoreKey::new(score.record_index, score.metric_name), score.value);
    }

    /// Metric names in suite order.
    pub fn metric_names(&self) -> &[String] {
        &self.metric_names
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub fn get(&self, record_index: usize, metric: &str) -> Option<f64> {
        self.scores
            .get(&ScoreKey::new(record_index, metric))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// True when every record has a score for every metric.
    pub fn is_complete(&self) -> bool {
        self.scores.len() == self.metric_names.len() * self.record_count
            && (0..self.record_count).all(|i| {
                self.metric_names
                    .iter()
                    .all(|m| self.get(i, m).is_some())
            })
    }

    /// Scores recorded for `metric`, in record order.
    pub fn values_for<'a>(&'a self, metric: &'a str) -> impl Iterator<Item = f64> + 'a {
        self.scores
            .iter()
            .filter(move |(k, _)| k.metric == metric)
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ScoreKey, f64)> {
        self.scores.iter().map(|(k, v)| (k, *v))
    }

    pub(crate) fn into_scores(self) -> BTreeMap<ScoreKey, f64> {
        self.scores
    }
}

/// Final result of a run: every score plus the per-metric and overall means.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    pub per_record_scores: BTreeMap<ScoreKey, f64>,
    /// Mean across records, keyed by metric name.
    pub metric_means: BTreeMap<String, f64>,
    /// Mean of `metric_means`.
    pub aggregate_score: f64,
    /// Metric names in suite order.
    pub metric_names: Vec<String>,
    pub record_count: usize,
}

impl EvaluationResult {
    pub fn score(&self, record_index: usize, metric: &str) -> Option<f64> {
        self.per_record_scores
            .get(&ScoreKey::new(record_index, metric))
            .copied()
    }

    /// Distinct record indices that carry at least one score.
    pub fn scored_records(&self) -> usize {
        let mut last = None;
        let mut count = 0;
        for key in self.per_record_scores.keys() {
            if last != Some(key.record_index) {
                count += 1;
                last = Some(key.record_index);
            }
        }
        count
    }

    /// Scores flattened into [`MetricScore`] rows, record-major.
    pub fn scores(&self) -> Vec<MetricScore> {
        self.per_record_scores
            .iter()
            .map(|(k, v)| MetricScore {
                record_index: k.record_index,
                metric_name: k.metric.clone(),
                value: *v,
            })
            .collect()
    }
}
