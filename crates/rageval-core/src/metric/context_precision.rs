//! Context precision: are the relevant contexts ranked first?

use async_trait::async_trait;

use super::text;
use super::Metric;
use crate::domain::{MetricFailure, MetricInput};

pub const NAME: &str = "context_precision";

/// Average precision of the ranked contexts against the ground truth.
///
/// A context counts as relevant when it covers at least
/// `relevance_threshold` of the ground truth's distinct content tokens.
#[derive(Debug, Clone)]
pub struct ContextPrecision {
    relevance_threshold: f64,
}

impl Default for ContextPrecision {
    fn default() -> Self {
        Self {
            relevance_threshold: 0.3,
        }
    }
}

impl ContextPrecision {
    pub fn with_relevance_threshold(mut self, threshold: f64) -> Self {
        self.relevance_threshold = threshold;
        self
    }
}

#[async_trait]
impl Metric for ContextPrecision {
    fn name(&self) -> &str {
        NAME
    }

    async fn score(&self, input: &MetricInput<'_>) -> Result<f64, MetricFailure> {
        if text::token_set(input.ground_truth).is_empty() {
            return Err(MetricFailure::new("ground truth has no content"));
        }

        let mut relevant_so_far = 0usize;
        let mut precision_sum = 0.0;
        for (rank, context) in input.contexts.iter().enumerate() {
            let chunk = text::token_set(context);
            if text::coverage(input.ground_truth, &chunk) >= self.relevance_threshold {
                relevant_so_far += 1;
                precision_sum += relevant_so_far as f64 / (rank + 1) as f64;
            }
        }

        if relevant_so_far == 0 {
            return Ok(0.0);
        }
        Ok(precision_sum / relevant_so_far as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input<'a>(contexts: &'a [String]) -> MetricInput<'a> {
        MetricInput {
            question: "What is the capital of France?",
            answer: "Paris",
            contexts,
            ground_truth: "Paris is the capital of France",
        }
    }

    #[tokio::test]
    async fn test_relevant_first_is_perfect() {
        let contexts = vec![
            "Paris is the capital of France.".to_string(),
            "Bananas grow in tropical climates.".to_string(),
        ];
        let score = ContextPrecision::default()
            .score(&input(&contexts))
            .await
            .expect("score");
        assert_eq!(score, 1.0);
    }

    #[tokio::test]
    async fn test_relevant_second_is_penalised() {
        let contexts = vec![
            "Bananas grow in tropical climates.".to_string(),
            "Paris is the capital of France.".to_string(),
        ];
        let score = ContextPrecision::default()
            .score(&input(&contexts))
            .await
            .expect("score");
        assert_eq!(score, 0.5);
    }

    #[tokio::test]
    async fn test_no_contexts_scores_zero() {
        let score = ContextPrecision::default()
            .score(&input(&[]))
            .await
            .expect("score");
        assert_eq!(score, 0.0);
    }
}
