//! Loading of the canonical reference dataset.
//!
//! The dataset is an ordered list of `{question, ground_truth}` rows. Order is
//! taken as-is from the source; alignment relies on it.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::domain::{RagEvalError, ReferenceSample, Result};

/// Reference samples in dataset order, plus a digest of the bytes they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceDataset {
    samples: Vec<ReferenceSample>,
    digest: String,
}

impl ReferenceDataset {
    pub fn new(samples: Vec<ReferenceSample>, digest: String) -> Self {
        Self { samples, digest }
    }

    /// Build a dataset from in-memory samples, digesting their JSON encoding.
    pub fn from_samples(samples: Vec<ReferenceSample>) -> Result<Self> {
        let bytes = serde_json::to_vec(&samples)?;
        Ok(Self {
            digest: sha256_hex(&bytes),
            samples,
        })
    }

    pub fn samples(&self) -> &[ReferenceSample] {
        &self.samples
    }

    /// SHA-256 hex digest of the source bytes.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Anything that can hand the pipeline its reference dataset.
pub trait ReferenceSource: Send + Sync {
    /// Short description for logs.
    fn describe(&self) -> String;

    fn load(&self) -> Result<ReferenceDataset>;
}

impl ReferenceSource for ReferenceDataset {
    fn describe(&self) -> String {
        format!("in-memory dataset ({} samples)", self.samples.len())
    }

    fn load(&self) -> Result<ReferenceDataset> {
        Ok(self.clone())
    }
}

/// Reference dataset stored as a `.csv` or `.json` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceFile {
    path: PathBuf,
}

impl ReferenceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReferenceSource for ReferenceFile {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<ReferenceDataset> {
        let format = ReferenceFormat::from_path(&self.path)
            .ok_or_else(|| RagEvalError::UnsupportedReferenceFormat(self.path.clone()))?;
        let bytes = std::fs::read(&self.path).map_err(|e| RagEvalError::io(&self.path, e))?;

        let samples = match format {
            ReferenceFormat::Csv => parse_csv(&bytes)?,
            ReferenceFormat::Json => serde_json::from_slice(&bytes)?,
        };
        debug!(path = %self.path.display(), samples = samples.len(), "loaded reference dataset");

        Ok(ReferenceDataset::new(samples, sha256_hex(&bytes)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReferenceFormat {
    Csv,
    Json,
}

impl ReferenceFormat {
    fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(ReferenceFormat::Csv),
            "json" => Some(ReferenceFormat::Json),
            _ => None,
        }
    }
}

/// CSV row; columns other than these two (e.g. an exported index column) are ignored.
#[derive(Debug, Deserialize)]
struct CsvRow {
    question: String,
    ground_truth: String,
}

fn parse_csv(bytes: &[u8]) -> Result<Vec<ReferenceSample>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(bytes);

    let mut samples = Vec::new();
    for row in rdr.deserialize::<CsvRow>() {
        let row = row?;
        samples.push(ReferenceSample::new(row.question, row.ground_truth));
    }
    Ok(samples)
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
