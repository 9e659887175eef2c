//! Evaluation artifacts: the per-record detail table and the summary document.
//!
//! Both artifacts are rendered in memory, written to temporaries in the output
//! directory and only then moved into place, so a failed run leaves neither.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::domain::{AlignedRecordSet, EvaluationResult, RagEvalError, Result};

pub const SUMMARY_SCHEMA_VERSION: &str = "1.0";

/// Summary document persisted as JSON.
///
/// Carries no timestamps or run ids: identical inputs produce byte-identical
/// summaries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationSummary {
    pub schema_version: String,
    pub aggregate_score: f64,
    pub metric_means: BTreeMap<String, f64>,
    pub record_count: usize,
    /// SHA-256 of the raw input file.
    pub input_digest: String,
    /// SHA-256 of the raw reference dataset.
    pub reference_digest: String,
}

impl EvaluationSummary {
    pub fn new(result: &EvaluationResult, input_digest: &str, reference_digest: &str) -> Self {
        Self {
            schema_version: SUMMARY_SCHEMA_VERSION.to_string(),
            aggregate_score: result.aggregate_score,
            metric_means: result.metric_means.clone(),
            record_count: result.record_count,
            input_digest: input_digest.to_string(),
            reference_digest: reference_digest.to_string(),
        }
    }
}

/// Render the detail table as CSV.
///
/// Columns: `index, question, answer, contexts, ground_truth`, then one column
/// per metric in suite order. `contexts` holds the JSON encoding of the list.
pub fn render_details_csv(
    aligned: &AlignedRecordSet,
    result: &EvaluationResult,
) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());

    let mut header: Vec<&str> = vec!["index", "question", "answer", "contexts", "ground_truth"];
    header.extend(result.metric_names.iter().map(String::as_str));
    wtr.write_record(&header)?;

    for (index, record) in aligned.records().iter().enumerate() {
        let mut row = vec![
            index.to_string(),
            record.question.clone(),
            record.answer.clone(),
            serde_json::to_string(&record.contexts)?,
            record.ground_truth.clone().unwrap_or_default(),
        ];
        row.extend(result.metric_names.iter().map(|metric| {
            result
                .score(index, metric)
                .map(|v| v.to_string())
                .unwrap_or_default()
        }));
        wtr.write_record(&row)?;
    }

    wtr.into_inner()
        .map_err(|e| RagEvalError::Csv(csv::Error::from(e.into_error())))
}

/// Render the summary as pretty JSON with a trailing newline.
pub fn render_summary_json(summary: &EvaluationSummary) -> Result<String> {
    let mut out = serde_json::to_string_pretty(summary)?;
    out.push('\n');
    Ok(out)
}

/// Both artifacts, rendered and ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactBundle {
    pub details_csv: Vec<u8>,
    pub summary_json: String,
}

/// Where the artifacts landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactPaths {
    pub details: PathBuf,
    pub summary: PathBuf,
}

impl ArtifactBundle {
    pub fn render(
        aligned: &AlignedRecordSet,
        result: &EvaluationResult,
        summary: &EvaluationSummary,
    ) -> Result<Self> {
        Ok(Self {
            details_csv: render_details_csv(aligned, result)?,
            summary_json: render_summary_json(summary)?,
        })
    }

    /// Write both artifacts into `dir`, creating it if needed.
    ///
    /// If the summary cannot be moved into place the already persisted
    /// detail table is removed again.
    pub fn persist(
        &self,
        dir: &Path,
        details_file: &str,
        summary_file: &str,
    ) -> Result<ArtifactPaths> {
        std::fs::create_dir_all(dir).map_err(|e| RagEvalError::io(dir, e))?;

        let details = staged(dir, &self.details_csv)?;
        let summary = staged(dir, self.summary_json.as_bytes())?;

        let paths = ArtifactPaths {
            details: dir.join(details_file),
            summary: dir.join(summary_file),
        };

        details
            .persist(&paths.details)
            .map_err(|e| RagEvalError::io(&paths.details, e.error))?;

        if let Err(e) = summary.persist(&paths.summary) {
            if let Err(cleanup) = std::fs::remove_file(&paths.details) {
                warn!(
                    path = %paths.details.display(),
                    error = %cleanup,
                    "failed to remove partial artifact"
                );
            }
            return Err(RagEvalError::io(&paths.summary, e.error));
        }

        debug!(
            details = %paths.details.display(),
            summary = %paths.summary.display(),
            "artifacts persisted"
        );
        Ok(paths)
    }
}

fn staged(dir: &Path, bytes: &[u8]) -> Result<NamedTempFile> {
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| RagEvalError::io(dir, e))?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.flush())
        .map_err(|e| RagEvalError::io(tmp.path(), e))?;
    Ok(tmp)
}
