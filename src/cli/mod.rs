//! Survival pipeline CLI module
//!
//! Command-line interface for training, prediction and explanation. Status
//! lines go to stderr so that stdout carries only the JSON result.

use clap::{Parser, Subcommand};
use colored::*;
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::dataset::{PassengerDataset, PassengerInput, RawRecord};
use crate::explainability::Explainer;
use crate::export::ArtifactStore;
use crate::inference::{InferenceConfig, PredictionResult, Predictor};
use crate::synthetic::{generate, SyntheticConfig};
use crate::training::{Trainer, TrainingConfig};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }
fn warn(s: &str) -> ColoredString   { s.truecolor(230, 180, 80) }

fn step_run(msg: &str) {
    eprint!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    eprintln!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    eprintln!();
    eprintln!("  {}", title.white().bold());
    eprintln!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "survival-fairness")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Survival prediction with fairness auditing and explanations")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train candidate models, audit them and save the best
    Train {
        /// Labeled passenger JSON; a synthetic corpus is generated when omitted
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Size of the synthetic corpus
        #[arg(long, default_value = "891")]
        samples: usize,

        /// Seed of the synthetic corpus
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Training configuration JSON
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Artifact directory
        #[arg(short, long, default_value = "artifacts")]
        output: PathBuf,
    },

    /// Predict one passenger object or an array of them
    Predict {
        /// Artifact directory written by `train`
        #[arg(short, long, default_value = "artifacts")]
        artifacts: PathBuf,

        /// Passenger JSON
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Predict a passenger and list counterfactual scenarios
    Explain {
        /// Artifact directory written by `train`
        #[arg(short, long, default_value = "artifacts")]
        artifacts: PathBuf,

        /// Passenger JSON
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Per-feature contributions relative to the baseline passenger
    Contributions {
        /// Artifact directory written by `train`
        #[arg(short, long, default_value = "artifacts")]
        artifacts: PathBuf,

        /// Passenger JSON
        #[arg(short, long)]
        input: PathBuf,
    },
}

// ─── Loading ───────────────────────────────────────────────────────────────────

fn load_predictor(artifacts: &Path) -> anyhow::Result<Predictor> {
    step_run(&format!("Loading artifacts from {}", artifacts.display()));
    let predictor = ArtifactStore::new(artifacts).load_predictor(InferenceConfig::default())?;
    step_done(predictor.model_name());
    Ok(predictor)
}

fn read_json(path: &Path) -> anyhow::Result<serde_json::Value> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

fn read_record(path: &Path) -> anyhow::Result<RawRecord> {
    let input: PassengerInput = serde_json::from_value(read_json(path)?)?;
    Ok(RawRecord::try_from(input)?)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One entry of a batch response
#[derive(Serialize)]
#[serde(untagged)]
enum BatchEntry {
    Prediction(PredictionResult),
    Error { error: String },
}

impl From<crate::Result<PredictionResult>> for BatchEntry {
    fn from(result: crate::Result<PredictionResult>) -> Self {
        match result {
            Ok(prediction) => BatchEntry::Prediction(prediction),
            Err(e) => BatchEntry::Error { error: e.to_string() },
        }
    }
}

/// Predict a JSON array in order; elements that do not parse become error entries
fn predict_values(predictor: &Predictor, items: Vec<serde_json::Value>) -> Vec<BatchEntry> {
    let mut entries: Vec<Option<BatchEntry>> = Vec::with_capacity(items.len());
    let mut positions = Vec::new();
    let mut inputs = Vec::new();

    for item in items {
        match serde_json::from_value::<PassengerInput>(item) {
            Ok(input) => {
                positions.push(entries.len());
                inputs.push(input);
                entries.push(None);
            }
            Err(e) => {
                let failed: crate::Result<PredictionResult> = Err(e.into());
                entries.push(Some(BatchEntry::from(failed)));
            }
        }
    }

    for (position, result) in positions.into_iter().zip(predictor.batch_predict_inputs(&inputs)) {
        entries[position] = Some(BatchEntry::from(result));
    }
    entries.into_iter().flatten().collect()
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(
    data: Option<&Path>,
    samples: usize,
    seed: u64,
    config: Option<&Path>,
    output: &Path,
) -> anyhow::Result<()> {
    section("Train");

    let config = match config {
        Some(path) => TrainingConfig::from_file(path)?,
        None => TrainingConfig::default(),
    };

    step_run("Loading data");
    let start = Instant::now();
    let dataset = match data {
        Some(path) => PassengerDataset::from_json_file(path)?,
        None => generate(&SyntheticConfig::default().with_n_samples(samples).with_seed(seed))?,
    };
    step_done(&format!(
        "{} passengers, survival rate {:.3} in {:?}",
        dataset.len(),
        dataset.survival_rate(),
        start.elapsed()
    ));

    step_run(&format!("Training {} candidates", config.candidates.len()));
    let start = Instant::now();
    let outcome = Trainer::new(config).train(&dataset)?;
    step_done(&format!("{:?}", start.elapsed()));

    eprintln!();
    eprintln!(
        "  {:<22} {:>8} {:>8} {:>8} {:>8}",
        muted("Model"),
        muted("F1"),
        muted("AUC"),
        muted("DI sex"),
        muted("DI cls")
    );
    eprintln!("  {}", dim(&"─".repeat(58)));
    for (name, report) in outcome.report.iter() {
        let marker = if name == outcome.model_name { ok("●") } else { dim("○") };
        eprintln!(
            "{} {:<22} {:>8.4} {:>8.4} {:>8.3} {:>8.3}",
            marker,
            name,
            report.performance.f1_score,
            report.performance.roc_auc,
            report.fairness_sex.disparate_impact,
            report.fairness_class.disparate_impact
        );
        for violation in &report.violations {
            eprintln!("    {} {}", warn("!"), violation);
        }
    }

    step_run(&format!("Saving → {}", output.display()));
    let metadata = ArtifactStore::new(output).save(&outcome)?;
    step_done(&metadata.trained_at.to_rfc3339());

    eprintln!();
    eprintln!(
        "  {} {} {} {:.4}",
        ok("best"),
        metadata.selected_model.white().bold(),
        muted("F1:"),
        metadata.f1_score
    );
    eprintln!();

    print_json(&outcome.report)
}

pub fn cmd_predict(artifacts: &Path, input: &Path) -> anyhow::Result<()> {
    section("Predict");
    let predictor = load_predictor(artifacts)?;

    match read_json(input)? {
        serde_json::Value::Array(items) => print_json(&predict_values(&predictor, items)),
        value => {
            let input: PassengerInput = serde_json::from_value(value)?;
            let record = RawRecord::try_from(input)?;
            print_json(&predictor.predict(&record)?)
        }
    }
}

pub fn cmd_explain(artifacts: &Path, input: &Path) -> anyhow::Result<()> {
    section("Explain");
    let predictor = load_predictor(artifacts)?;
    let record = read_record(input)?;
    print_json(&Explainer::new(&predictor).explain(&record)?)
}

pub fn cmd_contributions(artifacts: &Path, input: &Path) -> anyhow::Result<()> {
    section("Contributions");
    let predictor = load_predictor(artifacts)?;
    let record = read_record(input)?;
    print_json(&Explainer::new(&predictor).feature_contributions(&record)?)
}
