//! Faithfulness: are the answer's statements grounded in the retrieved contexts?

use async_trait::async_trait;

use super::text;
use super::Metric;
use crate::domain::{MetricFailure, MetricInput};

pub const NAME: &str = "faithfulness";

/// Share of answer sentences supported by the union of contexts.
///
/// A sentence is supported when at least `support_threshold` of its distinct
/// content tokens occur somewhere in the contexts.
#[derive(Debug, Clone)]
pub struct Faithfulness {
    support_threshold: f64,
}

impl Default for Faithfulness {
    fn default() -> Self {
        Self {
            support_threshold: 0.5,
        }
    }
}

impl Faithfulness {
    pub fn with_support_threshold(mut self, threshold: f64) -> Self {
        self.support_threshold = threshold;
        self
    }
}

#[async_trait]
impl Metric for Faithfulness {
    fn name(&self) -> &str {
        NAME
    }

    async fn score(&self, input: &MetricInput<'_>) -> Result<f64, MetricFailure> {
        let statements = text::sentences(input.answer);
        if statements.is_empty() || input.contexts.is_empty() {
            return Ok(0.0);
        }

        let support = text::token_set(&input.contexts.join("\n"));
        let supported = statements
            .iter()
            .filter(|s| text::coverage(s, &support) >= self.support_threshold)
            .count();

        Ok(supported as f64 / statements.len() as f64)
    }
}
