//! Context recall: how much of the ground truth the retrieved contexts cover.

use async_trait::async_trait;

use super::text;
use super::Metric;
use crate::domain::{MetricFailure, MetricInput};

pub const NAME: &str = "context_recall";

/// Share of ground-truth sentences attributable to the retrieved contexts.
#[derive(Debug, Clone)]
pub struct ContextRecall {
    support_threshold: f64,
}

impl Default for ContextRecall {
    fn default() -> Self {
        Self {
            support_threshold: 0.5,
        }
    }
}

impl ContextRecall {
    pub fn with_support_threshold(mut self, threshold: f64) -> Self {
        self.support_threshold = threshold;
        self
    }
}

#[async_trait]
impl Metric for ContextRecall {
    fn name(&self) -> &str {
        NAME
    }

    async fn score(&self, input: &MetricInput<'_>) -> Result<f64, MetricFailure> {
        let claims = text::sentences(input.ground_truth);
        if claims.is_empty() {
            return Err(MetricFailure::new("ground truth has no content"));
        }
        if input.contexts.is_empty() {
            return Ok(0.0);
        }

        let support = text::token_set(&input.contexts.join("\n"));
        let attributed = claims
            .iter()
            .filter(|c| text::coverage(c, &support) >= self.support_threshold)
            .count();

        Ok(attributed as f64 / claims.len() as f64)
    }
}
