//! Structured observability hooks for evaluation runs.
//!
//! This module provides:
//! - A run-scoped tracing span (`RunSpan`) carrying a run id
//! - Emission functions for pipeline lifecycle events
//!
//! Events are emitted at `info!` level except failures (`warn!`/`error!`).
//! Filter with `RAGEVAL_LOG`; pass `--json` to the CLI for JSON lines.

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{MetricError, RagEvalError};

/// Run-scoped tracing span tagged with a fresh run id.
///
/// Attach it to the run's future with `tracing::Instrument` rather than
/// entering it, since the run awaits across task boundaries.
///
/// # Example
///
/// ```ignore
/// let run = RunSpan::new();
/// evaluate(..).instrument(run.span().clone()).await
/// ```
#[derive(Debug, Clone)]
pub struct RunSpan {
    run_id: Uuid,
    span: tracing::Span,
}

impl RunSpan {
    pub fn new() -> Self {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("rageval.run", run_id = %run_id);
        Self { run_id, span }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn span(&self) -> &tracing::Span {
        &self.span
    }
}

impl Default for RunSpan {
    fn default() -> Self {
        Self::new()
    }
}

/// Emit event: pipeline started for an input.
pub fn emit_pipeline_started(input: &str, reference: &str, metrics: &[String]) {
    info!(
        event = "pipeline.started",
        input = %input,
        reference = %reference,
        metrics = ?metrics,
    );
}

/// Emit event: a stage finished with the number of records it produced.
pub fn emit_stage_completed(stage: &str, records: usize) {
    info!(event = "stage.completed", stage = %stage, records = records);
}

/// Emit event: a metric failed; the run is about to abort.
pub fn emit_metric_failed(err: &MetricError) {
    warn!(
        event = "metric.failed",
        metric = %err.metric(),
        record_index = err.record_index(),
        error = %err,
    );
}

/// Emit event: the pipeline aborted.
pub fn emit_pipeline_failed(err: &RagEvalError) {
    error!(event = "pipeline.failed", stage = err.stage(), error = %err);
}

/// Emit event: pipeline finished with the aggregate score.
pub fn emit_pipeline_finished(aggregate_score: f64, records: usize, duration_ms: u64) {
    info!(
        event = "pipeline.finished",
        aggregate_score = aggregate_score,
        records = records,
        duration_ms = duration_ms,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_span_ids_are_unique() {
        let a = RunSpan::new();
        let b = RunSpan::new();
        assert_ne!(a.run_id(), b.run_id());
    }
}
