//! rageval core library
//!
//! Scores the outputs of a Retrieval-Augmented-Generation pipeline against a
//! fixed reference dataset:
//!
//! 1. [`schema::validate`] checks the untrusted input records.
//! 2. [`align::align`] matches them position-by-position with the reference
//!    and attaches ground truths, failing on the first mismatch.
//! 3. [`MetricOrchestrator`] runs every [`Metric`] of a [`MetricSuite`] on
//!    every record.
//! 4. [`aggregate::aggregate`] averages per metric, then across metrics.
//! 5. [`ArtifactBundle`] persists the detail table and the summary.
//!
//! [`EvalPipeline`] wires the stages together.

pub mod aggregate;
pub mod align;
pub mod config;
pub mod domain;
pub mod gate;
pub mod metric;
pub mod obs;
pub mod orchestrator;
pub mod pipeline;
pub mod reference;
pub mod reporting;
pub mod schema;
pub mod telemetry;

pub use domain::{
    AlignedRecordSet, AlignmentError, EvaluationRecord, EvaluationResult, MetricError,
    MetricFailure, MetricInput, MetricScore, RagEvalError, ReferenceSample, Result, SchemaError,
    ScoreKey, ScoreTable,
};

pub use config::EvalConfig;
pub use gate::{evaluate_gate, GateVerdict, ScoreThresholds, Violation};
pub use metric::{Metric, MetricSuite, STANDARD_METRICS};
pub use orchestrator::MetricOrchestrator;
pub use pipeline::{resolve_input_path, EvalPipeline, Evaluation, EvaluationOutcome};
pub use reference::{ReferenceDataset, ReferenceFile, ReferenceSource};
pub use reporting::{
    render_details_csv, render_summary_json, ArtifactBundle, ArtifactPaths, EvaluationSummary,
};
pub use telemetry::init_tracing;

/// rageval version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
