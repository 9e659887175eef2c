//! The evaluation pipeline: validate → align → score → aggregate → persist.
//!
//! Stages run strictly in order and never call back upstream. Any error ends
//! the run before the persist step, so a failed run writes no artifacts.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, Instrument};

use crate::aggregate::aggregate;
use crate::align::align;
use crate::config::EvalConfig;
use crate::domain::{AlignedRecordSet, EvaluationResult, RagEvalError, Result};
use crate::metric::MetricSuite;
use crate::obs;
use crate::orchestrator::MetricOrchestrator;
use crate::reference::{sha256_hex, ReferenceSource};
use crate::reporting::{ArtifactBundle, ArtifactPaths, EvaluationSummary};
use crate::schema;

/// Everything a successful in-memory evaluation produced.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub aligned: Arc<AlignedRecordSet>,
    pub result: EvaluationResult,
    pub summary: EvaluationSummary,
}

/// Outcome of [`EvalPipeline::evaluate_file`].
#[derive(Debug, Clone)]
pub struct EvaluationOutcome {
    pub evaluation: Evaluation,
    pub artifacts: ArtifactPaths,
}

impl EvaluationOutcome {
    pub fn summary(&self) -> &EvaluationSummary {
        &self.evaluation.summary
    }
}

/// Pipeline configured with a metric suite and run settings.
#[derive(Debug, Clone)]
pub struct EvalPipeline {
    config: EvalConfig,
    suite: MetricSuite,
    orchestrator: MetricOrchestrator,
}

impl EvalPipeline {
    /// Use an explicit metric suite; `config.metrics` is ignored.
    pub fn new(config: EvalConfig, suite: MetricSuite) -> Result<Self> {
        config.validate()?;
        let orchestrator = MetricOrchestrator::new(config.max_concurrent);
        Ok(Self {
            config,
            suite,
            orchestrator,
        })
    }

    /// Build the suite from the built-in metrics named in `config.metrics`.
    pub fn from_config(config: EvalConfig) -> Result<Self> {
        config.validate()?;
        let suite = MetricSuite::from_names(&config.metrics)?;
        Self::new(config, suite)
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    pub fn suite(&self) -> &MetricSuite {
        &self.suite
    }

    /// Evaluate the records file at `path` and persist both artifacts.
    pub async fn evaluate_file(
        &self,
        path: &Path,
        reference: &dyn ReferenceSource,
    ) -> Result<EvaluationOutcome> {
        let run = obs::RunSpan::new();
        let start = Instant::now();

        async {
            obs::emit_pipeline_started(
                &path.display().to_string(),
                &reference.describe(),
                &self.suite.names(),
            );
            let outcome = self.evaluate_file_inner(path, reference).await;
            match &outcome {
                Ok(outcome) => obs::emit_pipeline_finished(
                    outcome.evaluation.summary.aggregate_score,
                    outcome.evaluation.summary.record_count,
                    start.elapsed().as_millis() as u64,
                ),
                Err(e) => obs::emit_pipeline_failed(e),
            }
            outcome
        }
        .instrument(run.span().clone())
        .await
    }

    async fn evaluate_file_inner(
        &self,
        path: &Path,
        reference: &dyn ReferenceSource,
    ) -> Result<EvaluationOutcome> {
        let bytes = std::fs::read(path).map_err(|e| RagEvalError::io(path, e))?;
        let raw: serde_json::Value = serde_json::from_slice(&bytes)?;

        let evaluation = self
            .evaluate_raw(&raw, &sha256_hex(&bytes), reference)
            .await?;

        let bundle = ArtifactBundle::render(
            &evaluation.aligned,
            &evaluation.result,
            &evaluation.summary,
        )?;
        let artifacts = bundle.persist(
            &self.config.output_dir,
            &self.config.details_file,
            &self.config.summary_file,
        )?;
        info!(
            details = %artifacts.details.display(),
            summary = %artifacts.summary.display(),
            "artifacts written"
        );

        Ok(EvaluationOutcome {
            evaluation,
            artifacts,
        })
    }

    /// Run every stage except persistence on already-parsed input.
    ///
    /// The input digest is taken over the compact JSON encoding of `raw`.
    pub async fn evaluate_records(
        &self,
        raw: &serde_json::Value,
        reference: &dyn ReferenceSource,
    ) -> Result<Evaluation> {
        let digest = sha256_hex(&serde_json::to_vec(raw)?);
        self.evaluate_raw(raw, &digest, reference).await
    }

    async fn evaluate_raw(
        &self,
        raw: &serde_json::Value,
        input_digest: &str,
        reference: &dyn ReferenceSource,
    ) -> Result<Evaluation> {
        let records = schema::validate(raw)?;
        obs::emit_stage_completed("schema", records.len());

        let dataset = reference.load()?;
        obs::emit_stage_completed("reference", dataset.len());

        let aligned = Arc::new(align(records, dataset.samples())?);
        if aligned.is_empty() {
            return Err(RagEvalError::NothingToScore);
        }
        obs::emit_stage_completed("alignment", aligned.len());

        let table = self
            .orchestrator
            .run(Arc::clone(&aligned), &self.suite)
            .await?;
        obs::emit_stage_completed("metrics", table.record_count());

        let result = aggregate(&table);
        let summary = EvaluationSummary::new(&result, input_digest, dataset.digest());
        obs::emit_stage_completed("aggregate", result.record_count);

        Ok(Evaluation {
            aligned,
            result,
            summary,
        })
    }
}

/// Expand a leading `~` and make `path` absolute against the current directory.
pub fn resolve_input_path(path: &Path) -> Result<PathBuf> {
    let expanded = match path.strip_prefix("~") {
        Ok(rest) => match std::env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    };
    if expanded.is_absolute() {
        return Ok(expanded);
    }
    let cwd = std::env::current_dir().map_err(|e| RagEvalError::io(".", e))?;
    Ok(cwd.join(expanded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_path_is_absolute() {
        let resolved = resolve_input_path(Path::new("records.json")).expect("resolve");
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("records.json"));
    }

    #[test]
    fn test_resolve_keeps_absolute_path() {
        let resolved = resolve_input_path(Path::new("/data/records.json")).expect("resolve");
        assert_eq!(resolved, PathBuf::from("/data/records.json"));
    }

    #[test]
    fn test_from_config_rejects_unknown_metric() {
        let config = EvalConfig {
            metrics: vec!["bleu".to_string()],
            ..EvalConfig::default()
        };
        let err = EvalPipeline::from_config(config).unwrap_err();
        assert_eq!(err.stage(), "config");
    }
}
