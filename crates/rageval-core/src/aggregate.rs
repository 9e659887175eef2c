//! Aggregation of per-record scores into per-metric means and one overall score.
//!
//! The overall score is the mean of the per-metric means, not a flat mean over
//! every cell, so each metric weighs the same regardless of its scale.

use std::collections::BTreeMap;

use crate::domain::{EvaluationResult, ScoreTable};

/// Aggregate a score table. Deterministic: equal tables give equal results.
pub fn aggregate(table: &ScoreTable) -> EvaluationResult {
    let metric_means: BTreeMap<String, f64> = table
        .metric_names()
        .iter()
        .map(|name| (name.clone(), mean(table.values_for(name))))
        .collect();

    // Averaged in suite order so float summation order is fixed.
    let aggregate_score = mean(
        table
            .metric_names()
            .iter()
            .filter_map(|name| metric_means.get(name).copied()),
    );

    EvaluationResult {
        per_record_scores: table.clone().into_scores(),
        metric_means,
        aggregate_score,
        metric_names: table.metric_names().to_vec(),
        record_count: table.record_count(),
    }
}

/// Arithmetic mean; 0.0 for an empty sequence.
fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MetricScore;

    fn table(rows: &[(usize, &str, f64)], metrics: &[&str], records: usize) -> ScoreTable {
        let mut table = ScoreTable::new(metrics.iter().map(|m| m.to_string()).collect(), records);
        for (record_index, metric, value) in rows {
            table.insert(MetricScore {
                record_index: *record_index,
                metric_name: metric.to_string(),
                value: *value,
            });
        }
        table
    }

    #[test]
    fn test_constant_metrics_average() {
        let metrics = ["m1", "m2", "m3", "m4", "m5"];
        let values = [0.2, 0.4, 0.6, 0.8, 1.0];
        let mut rows = Vec::new();
        for record in 0..3 {
            for (m, v) in metrics.iter().zip(values) {
                rows.push((record, *m, v));
            }
        }
        let result = aggregate(&table(&rows, &metrics, 3));
        assert!((result.aggregate_score - 0.6).abs() < 1e-12);
        assert!((result.metric_means["m2"] - 0.4).abs() < 1e-12);
        assert_eq!(result.scored_records(), 3);
    }

    #[test]
    fn test_mean_of_means_not_flat_mean() {
        // m1 has two scores, m2 one. Flat mean = (1 + 1 + 0) / 3; mean of means = 0.5.
        let rows = [(0, "m1", 1.0), (1, "m1", 1.0), (0, "m2", 0.0)];
        let result = aggregate(&table(&rows, &["m1", "m2"], 2));
        assert!((result.aggregate_score - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_empty_table_aggregates_to_zero() {
        let result = aggregate(&ScoreTable::new(vec![], 0));
        assert_eq!(result.aggregate_score, 0.0);
        assert!(result.metric_means.is_empty());
    }
}
