//! Positional alignment of input records with the reference dataset.
//!
//! Record `i` is matched against reference sample `i` by exact question
//! equality. Lengths are compared first; the first mismatching index ends
//! alignment and nothing after it is inspected. There is no fuzzy or
//! key-based fallback: scores are only produced over a question set that is
//! identical to the reference.

use tracing::debug;

use crate::domain::{AlignedRecordSet, AlignmentError, EvaluationRecord, ReferenceSample};

/// Attach ground truths to `records`, or fail on the first discrepancy.
pub fn align(
    records: Vec<EvaluationRecord>,
    reference: &[ReferenceSample],
) -> Result<AlignedRecordSet, AlignmentError> {
    if records.len() != reference.len() {
        return Err(AlignmentError::LengthMismatch {
            records: records.len(),
            reference: reference.len(),
        });
    }

    let mut aligned = Vec::with_capacity(records.len());
    for (index, (mut record, sample)) in records.into_iter().zip(reference).enumerate() {
        if record.question != sample.question {
            debug!(index, "question mismatch, aborting alignment");
            return Err(AlignmentError::QuestionMismatch {
                index,
                expected: sample.question.clone(),
                found: record.question,
            });
        }
        record.ground_truth = Some(sample.ground_truth.clone());
        aligned.push(record);
    }

    Ok(AlignedRecordSet::from_aligned(aligned))
}
