//! Answer correctness: agreement between the answer and the ground truth.

use async_trait::async_trait;

use super::text;
use super::Metric;
use crate::domain::{MetricFailure, MetricInput};

pub const NAME: &str = "answer_correctness";

/// Weighted blend of token F1 (factual overlap) and cosine similarity.
#[derive(Debug, Clone)]
pub struct AnswerCorrectness {
    factual_weight: f64,
    similarity_weight: f64,
}

impl Default for AnswerCorrectness {
    fn default() -> Self {
        Self {
            factual_weight: 0.75,
            similarity_weight: 0.25,
        }
    }
}

impl AnswerCorrectness {
    /// Override the blend weights. They must be non-negative and sum to 1.
    pub fn with_weights(factual: f64, similarity: f64) -> Result<Self, MetricFailure> {
        if factual < 0.0 || similarity < 0.0 || ((factual + similarity) - 1.0).abs() > 1e-9 {
            return Err(MetricFailure::new(format!(
                "weights must be non-negative and sum to 1, got {factual} and {similarity}"
            )));
        }
        Ok(Self {
            factual_weight: factual,
            similarity_weight: similarity,
        })
    }
}

#[async_trait]
impl Metric for AnswerCorrectness {
    fn name(&self) -> &str {
        NAME
    }

    async fn score(&self, input: &MetricInput<'_>) -> Result<f64, MetricFailure> {
        if text::token_set(input.ground_truth).is_empty() {
            return Err(MetricFailure::new("ground truth has no content"));
        }
        let factual = text::token_f1(input.answer, input.ground_truth);
        let similarity = text::cosine_similarity(input.answer, input.ground_truth);
        Ok(self.factual_weight * factual + self.similarity_weight * similarity)
    }
}
