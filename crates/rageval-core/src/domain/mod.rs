//! Domain models for rageval.
//!
//! Canonical definitions for the entities of one evaluation run:
//! - `EvaluationRecord`: a generated sample under test
//! - `ReferenceSample`: a row of the canonical dataset
//! - `AlignedRecordSet`: records matched position-by-position with the reference
//! - `ScoreTable` / `EvaluationResult`: scores and their aggregation

pub mod error;
pub mod record;
pub mod score;

pub use error::{AlignmentError, MetricError, MetricFailure, RagEvalError, Result, SchemaError};
pub use record::{AlignedRecordSet, EvaluationRecord, MetricInput, ReferenceSample};
pub use score::{EvaluationResult, MetricScore, ScoreKey, ScoreTable};
