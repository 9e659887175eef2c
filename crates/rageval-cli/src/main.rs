//! rageval - RAG output evaluation CLI
//!
//! The `rageval` command scores a file of generated records
//! (`question`, `answer`, `contexts`) against the reference dataset and writes
//! a per-record detail table plus a summary document.
//!
//! ## Exit codes
//!
//! - `0`: evaluation succeeded (and the score gate, if any, passed)
//! - `1`: evaluation failed; no artifacts were written
//! - `2`: evaluation succeeded but the score gate failed

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn, Level};

use rageval_core::{
    evaluate_gate, resolve_input_path, EvalConfig, EvalPipeline, EvaluationSummary, GateVerdict,
    ReferenceFile,
};

#[derive(Parser, Debug)]
#[command(name = "rageval")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Evaluate RAG pipeline outputs against a reference dataset", long_about = None)]
struct Cli {
    /// Path to the JSON file of generated records
    #[arg(short, long)]
    file: PathBuf,

    /// Reference dataset (.csv or .json)
    #[arg(short, long, env = "RAGEVAL_REFERENCE")]
    reference: Option<PathBuf>,

    /// Directory receiving the detail table and the summary
    #[arg(short, long, env = "RAGEVAL_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long, env = "RAGEVAL_CONFIG")]
    config: Option<PathBuf>,

    /// Metric to run (repeatable); defaults to the configured suite
    #[arg(long = "metric")]
    metrics: Vec<String>,

    /// Maximum concurrent metric evaluations
    #[arg(long)]
    max_concurrent: Option<usize>,

    /// Fail (exit code 2) when the aggregate score is below this value
    #[arg(long)]
    fail_under: Option<f64>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

/// Merge the config file (if any) with command-line overrides.
fn build_config(cli: &Cli) -> Result<EvalConfig> {
    let mut config = match &cli.config {
        Some(path) => EvalConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EvalConfig::default(),
    };

    if let Some(reference) = &cli.reference {
        config.reference_path = reference.clone();
    }
    if let Some(output_dir) = &cli.output_dir {
        config.output_dir = output_dir.clone();
    }
    if !cli.metrics.is_empty() {
        config.metrics = cli.metrics.clone();
    }
    if let Some(max_concurrent) = cli.max_concurrent {
        config.max_concurrent = max_concurrent;
    }
    if let Some(min) = cli.fail_under {
        config.thresholds.min_aggregate = Some(min);
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

enum Outcome {
    Passed,
    GateFailed,
}

async fn run(cli: &Cli) -> Result<Outcome> {
    let config = build_config(cli)?;

    let input = resolve_input_path(&cli.file)?;
    if !input.is_file() {
        anyhow::bail!("The file '{}' does not exist", input.display());
    }

    let pipeline = EvalPipeline::from_config(config.clone())?;
    let reference = ReferenceFile::new(&config.reference_path);

    info!(file = %input.display(), "Processing file");
    let outcome = pipeline
        .evaluate_file(&input, &reference)
        .await
        .with_context(|| format!("Evaluation of {} failed", input.display()))?;

    print_summary(outcome.summary())?;

    let verdict = evaluate_gate(&config.thresholds, outcome.summary());
    report_verdict(&verdict);
    if verdict.passed() {
        Ok(Outcome::Passed)
    } else {
        Ok(Outcome::GateFailed)
    }
}

fn print_summary(summary: &EvaluationSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary).context("serialize summary")?;
    println!("{json}");
    Ok(())
}

fn report_verdict(verdict: &GateVerdict) {
    for violation in &verdict.violations {
        warn!(violation = %violation, "score gate violation");
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Credentials for model-backed metrics may live in .env; it wins over the environment.
    dotenvy::dotenv_override().ok();

    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    rageval_core::init_tracing(cli.json, level);

    match run(&cli).await {
        Ok(Outcome::Passed) => ExitCode::SUCCESS,
        Ok(Outcome::GateFailed) => ExitCode::from(2),
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
