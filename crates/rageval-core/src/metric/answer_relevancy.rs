//! Answer relevancy: does the answer address the question?

use async_trait::async_trait;

use super::text;
use super::Metric;
use crate::domain::{MetricFailure, MetricInput};

pub const NAME: &str = "answer_relevancy";

/// Term-frequency cosine similarity between question and answer.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnswerRelevancy;

#[async_trait]
impl Metric for AnswerRelevancy {
    fn name(&self) -> &str {
        NAME
    }

    async fn score(&self, input: &MetricInput<'_>) -> Result<f64, MetricFailure> {
        Ok(text::cosine_similarity(input.question, input.answer))
    }
}
