//! Runs the metric suite over an aligned record set.
//!
//! Every (record, metric) pair is scored exactly once. Pairs run as tokio
//! tasks bounded by a semaphore; each task gets its own `Arc` of the
//! immutable record set. The first failure observed aborts every outstanding
//! task and is returned as-is, so a run either scores the full record set or
//! produces nothing.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinError, JoinSet};
use tracing::{debug, instrument};

use crate::domain::{AlignedRecordSet, MetricError, MetricScore, ScoreTable};
use crate::metric::{Metric, MetricSuite};
use crate::obs;

/// Schedules metric evaluations.
#[derive(Debug, Clone)]
pub struct MetricOrchestrator {
    max_concurrent: usize,
}

impl Default for MetricOrchestrator {
    fn default() -> Self {
        Self { max_concurrent: 4 }
    }
}

impl MetricOrchestrator {
    /// `max_concurrent` of 0 is treated as 1.
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Score every record with every metric in `suite`.
    #[instrument(skip_all, fields(records = aligned.len(), metrics = suite.len()))]
    pub async fn run(
        &self,
        aligned: Arc<AlignedRecordSet>,
        suite: &MetricSuite,
    ) -> Result<ScoreTable, MetricError> {
        let mut table = ScoreTable::new(suite.names(), aligned.len());

        if self.max_concurrent == 1 {
            for index in 0..aligned.len() {
                for metric in suite.metrics() {
                    let score = evaluate_one(Arc::clone(metric), Arc::clone(&aligned), index).await;
                    table.insert(observe(score)?);
                }
            }
            return Ok(table);
        }

        let sem = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();
        let mut pairs: HashMap<Id, (usize, String)> = HashMap::new();

        for index in 0..aligned.len() {
            for metric in suite.metrics() {
                let name = metric.name().to_string();
                let metric = Arc::clone(metric);
                let aligned = Arc::clone(&aligned);
                let sem = Arc::clone(&sem);
                let handle = tasks.spawn(async move {
                    let _permit = sem.acquire_owned().await.ok();
                    evaluate_one(metric, aligned, index).await
                });
                pairs.insert(handle.id(), (index, name));
            }
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            let score = match joined {
                Ok((id, score)) => {
                    pairs.remove(&id);
                    score
                }
                Err(e) => Err(join_failure(&mut pairs, e)),
            };
            match observe(score) {
                Ok(score) => table.insert(score),
                Err(e) => {
                    tasks.abort_all();
                    return Err(e);
                }
            }
        }

        Ok(table)
    }
}

/// Map a task that died outside the metric's own panic guard back to its pair.
fn join_failure(pairs: &mut HashMap<Id, (usize, String)>, e: JoinError) -> MetricError {
    let (record_index, metric) = pairs
        .remove(&e.id())
        .unwrap_or_else(|| (usize::MAX, "unknown".to_string()));
    let detail = match e.try_into_panic() {
        Ok(payload) => panic_message(payload.as_ref()),
        Err(e) => e.to_string(),
    };
    MetricError::Panicked {
        metric,
        record_index,
        detail,
    }
}

fn observe(score: Result<MetricScore, MetricError>) -> Result<MetricScore, MetricError> {
    match &score {
        Ok(s) => debug!(
            record_index = s.record_index,
            metric = %s.metric_name,
            value = s.value,
            "scored"
        ),
        Err(e) => obs::emit_metric_failed(e),
    }
    score
}

/// Score one record with one metric and check the value against the metric's range.
async fn evaluate_one(
    metric: Arc<dyn Metric>,
    aligned: Arc<AlignedRecordSet>,
    index: usize,
) -> Result<MetricScore, MetricError> {
    let name = metric.name().to_string();
    let Some(input) = aligned.input(index) else {
        return Err(MetricError::Panicked {
            metric: name,
            record_index: index,
            detail: "record index out of bounds".to_string(),
        });
    };

    let outcome = AssertUnwindSafe(metric.score(&input)).catch_unwind().await;
    let value = match outcome {
        Ok(Ok(value)) => value,
        Ok(Err(failure)) => {
            return Err(MetricError::Failed {
                metric: name,
                record_index: index,
                source: failure,
            })
        }
        Err(payload) => {
            return Err(MetricError::Panicked {
                metric: name,
                record_index: index,
                detail: panic_message(payload.as_ref()),
            })
        }
    };

    if !value.is_finite() {
        return Err(MetricError::NonFinite {
            metric: name,
            record_index: index,
            value,
        });
    }
    let (min, max) = metric.range();
    if value < min || value > max {
        return Err(MetricError::OutOfRange {
            metric: name,
            record_index: index,
            value,
            min,
            max,
        });
    }

    Ok(MetricScore {
        record_index: index,
        metric_name: name,
        value,
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::align;
    use crate::domain::{EvaluationRecord, MetricFailure, MetricInput, ReferenceSample};
    use async_trait::async_trait;

    struct Fixed(&'static str, f64);

    #[async_trait]
    impl Metric for Fixed {
        fn name(&self) -> &str {
            self.0
        }

        async fn score(&self, _input: &MetricInput<'_>) -> Result<f64, MetricFailure> {
            Ok(self.1)
        }
    }

    struct FailOn(usize);

    #[async_trait]
    impl Metric for FailOn {
        fn name(&self) -> &str {
            "fail_on"
        }

        async fn score(&self, input: &MetricInput<'_>) -> Result<f64, MetricFailure> {
            if input.question == format!("Q{}", self.0) {
                return Err(MetricFailure::new("division by zero"));
            }
            Ok(0.5)
        }
    }

    struct Panics;

    #[async_trait]
    impl Metric for Panics {
        fn name(&self) -> &str {
            "panics"
        }

        async fn score(&self, _input: &MetricInput<'_>) -> Result<f64, MetricFailure> {
            panic!("model backend exploded");
        }
    }

    fn aligned(n: usize) -> Arc<AlignedRecordSet> {
        let records = (0..n)
            .map(|i| EvaluationRecord::new(format!("Q{i}"), format!("A{i}"), vec![]))
            .collect();
        let reference: Vec<_> = (0..n)
            .map(|i| ReferenceSample::new(format!("Q{i}"), format!("G{i}")))
            .collect();
        Arc::new(align(records, &reference).expect("aligned"))
    }

    fn suite(metrics: Vec<Arc<dyn Metric>>) -> MetricSuite {
        MetricSuite::new(metrics).expect("suite")
    }

    #[tokio::test]
    async fn test_scores_every_pair() {
        let suite = suite(vec![Arc::new(Fixed("a", 0.1)), Arc::new(Fixed("b", 0.9))]);
        for concurrency in [1, 4] {
            let table = MetricOrchestrator::new(concurrency)
                .run(aligned(3), &suite)
                .await
                .expect("run");
            assert_eq!(table.len(), 6);
            assert!(table.is_complete());
            assert_eq!(table.get(2, "b"), Some(0.9));
        }
    }

    #[tokio::test]
    async fn test_failure_names_metric_and_record() {
        let suite = suite(vec![Arc::new(Fixed("a", 0.1)), Arc::new(FailOn(2))]);
        for concurrency in [1, 8] {
            let err = MetricOrchestrator::new(concurrency)
                .run(aligned(4), &suite)
                .await
                .unwrap_err();
            assert_eq!(err.metric(), "fail_on");
            assert_eq!(err.record_index(), 2);
            assert!(err.to_string().contains("division by zero"));
        }
    }

    #[tokio::test]
    async fn test_non_finite_rejected() {
        let suite = suite(vec![Arc::new(Fixed("nan", f64::NAN))]);
        let err = MetricOrchestrator::default()
            .run(aligned(1), &suite)
            .await
            .unwrap_err();
        assert!(matches!(err, MetricError::NonFinite { .. }));
    }

    #[tokio::test]
    async fn test_out_of_range_rejected() {
        let suite = suite(vec![Arc::new(Fixed("big", 1.5))]);
        let err = MetricOrchestrator::default()
            .run(aligned(2), &suite)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MetricError::OutOfRange { value, max, .. } if value == 1.5 && max == 1.0
        ));
    }

    #[tokio::test]
    async fn test_panic_is_reported() {
        let suite = suite(vec![Arc::new(Panics)]);
        let err = MetricOrchestrator::new(2)
            .run(aligned(1), &suite)
            .await
            .unwrap_err();
        match err {
            MetricError::Panicked {
                metric,
                record_index,
                detail,
            } => {
                assert_eq!(metric, "panics");
                assert_eq!(record_index, 0);
                assert!(detail.contains("exploded"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    struct BadRange;

    #[async_trait]
    impl Metric for BadRange {
        fn name(&self) -> &str {
            "bad_range"
        }

        fn range(&self) -> (f64, f64) {
            panic!("range table missing");
        }

        async fn score(&self, _input: &MetricInput<'_>) -> Result<f64, MetricFailure> {
            Ok(0.5)
        }
    }

    #[tokio::test]
    async fn test_task_panic_outside_score_names_its_pair() {
        let suite = suite(vec![Arc::new(BadRange)]);
        let err = MetricOrchestrator::new(2)
            .run(aligned(3), &suite)
            .await
            .unwrap_err();
        match err {
            MetricError::Panicked {
                metric,
                record_index,
                detail,
            } => {
                assert_eq!(metric, "bad_range");
                assert!(record_index < 3);
                assert!(detail.contains("range table missing"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_zero_concurrency_clamped() {
        assert_eq!(MetricOrchestrator::new(0).max_concurrent(), 1);
    }
}
