//! Records under test and the reference samples they are checked against.

use serde::{Deserialize, Serialize};

/// One generated sample under test.
///
/// `ground_truth` stays `None` until the aligner attaches the reference
/// answer; after that the record is only ever read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvaluationRecord {
    pub question: String,
    pub answer: String,
    pub contexts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ground_truth: Option<String>,
}

impl EvaluationRecord {
    /// Create a record without a ground truth.
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        contexts: Vec<String>,
    ) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            contexts,
            ground_truth: None,
        }
    }
}

/// One row of the canonical evaluation dataset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReferenceSample {
    pub question: String,
    pub ground_truth: String,
}

impl ReferenceSample {
    pub fn new(question: impl Into<String>, ground_truth: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ground_truth: ground_truth.into(),
        }
    }
}

/// Read-only view of one aligned record handed to every metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricInput<'a> {
    pub question: &'a str,
    pub answer: &'a str,
    pub contexts: &'a [String],
    pub ground_truth: &'a str,
}

/// Records position-matched with the reference dataset, each carrying its
/// ground truth.
///
/// # Invariants
///
/// Only [`crate::align::align`] constructs this type. Its length equals the
/// reference length, `records[i].question == reference[i].question`, and
/// every record has `ground_truth` set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlignedRecordSet {
    records: Vec<EvaluationRecord>,
}

impl AlignedRecordSet {
    pub(crate) fn from_aligned(records: Vec<EvaluationRecord>) -> Self {
        debug_assert!(records.iter().all(|r| r.ground_truth.is_some()));
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[EvaluationRecord] {
        &self.records
    }

    /// Metric view of the record at `index`.
    pub fn input(&self, index: usize) -> Option<MetricInput<'_>> {
        self.records.get(index).map(|r| MetricInput {
            question: &r.question,
            answer: &r.answer,
            contexts: &r.contexts,
            ground_truth: r.ground_truth.as_deref().unwrap_or_default(),
        })
    }

    /// Iterate metric views in record order.
    pub fn inputs(&self) -> impl Iterator<Item = (usize, MetricInput<'_>)> {
        (0..self.records.len()).filter_map(move |i| self.input(i).map(|input| (i, input)))
    }
}
