//! obesity CLI: train, query, and inspect obesity category pipelines.

use clap::{Parser, Subcommand};
use obesity_pipeline::analytics::{analyze, DatasetFilter};
use obesity_pipeline::clinical::ClinicalSummary;
use obesity_pipeline::config::{self, TrainingConfig};
use obesity_pipeline::data::{
    CategoricalValue, FeatureRow, Gender, LabeledDataset, PatientRecord, YesNo,
};
use obesity_pipeline::loading::ArtifactHandle;
use obesity_pipeline::pipeline::{FittedPipeline, Prediction};
use obesity_pipeline::training::train_and_export;
use obesity_pipeline::Result;
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "obesity")]
#[command(about = "Obesity category prediction from lifestyle and anthropometric data")]
#[command(version)]
struct Cli {
    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate, fit on the full dataset, and write the artifact
    Train {
        /// JSON training configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Labelled CSV (overrides config and OBESITY_DATASET)
        #[arg(short, long)]
        dataset: Option<PathBuf>,

        /// Artifact output (overrides config and OBESITY_ARTIFACT)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Boosting stages
        #[arg(long)]
        n_estimators: Option<usize>,

        /// Shrinkage per stage
        #[arg(long)]
        learning_rate: Option<f32>,

        /// Maximum tree depth
        #[arg(long)]
        max_depth: Option<usize>,

        /// Seed for the booster and the evaluation splits
        #[arg(long)]
        seed: Option<u64>,

        /// Cross-validation folds
        #[arg(long)]
        cv_folds: Option<usize>,

        /// Skip cross-validation and the holdout split
        #[arg(long)]
        no_eval: bool,
    },

    /// Predict the category of one or more patients
    Predict {
        /// Artifact file (defaults to OBESITY_ARTIFACT, then obesity_pipeline.obp)
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// JSON object or array of objects; `-` reads stdin
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Single record as key=value pairs, e.g. `-f age=23 -f gender=Female`
        #[arg(short = 'f', long = "field", value_parser = parse_key_val)]
        fields: Vec<(String, String)>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Descriptive analytics over a labelled dataset
    Stats {
        /// Labelled CSV (defaults to OBESITY_DATASET, then Obesity.csv)
        dataset: Option<PathBuf>,

        /// Keep only these genders (repeatable)
        #[arg(long, value_parser = parse_gender)]
        gender: Vec<Gender>,

        /// Minimum age, inclusive
        #[arg(long)]
        min_age: Option<f32>,

        /// Maximum age, inclusive
        #[arg(long)]
        max_age: Option<f32>,

        /// Keep only these family-history answers (repeatable)
        #[arg(long, value_parser = parse_yes_no)]
        family_history: Vec<YesNo>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Describe an artifact
    Info {
        /// Artifact file (defaults to OBESITY_ARTIFACT, then obesity_pipeline.obp)
        model: Option<PathBuf>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Train {
            config,
            dataset,
            output,
            n_estimators,
            learning_rate,
            max_depth,
            seed,
            cv_folds,
            no_eval,
        } => load_training_config(config.as_deref()).and_then(|mut cfg| {
            if let Some(path) = dataset {
                cfg.dataset = path;
            }
            if let Some(path) = output {
                cfg.artifact = path;
            }
            if let Some(n) = n_estimators {
                cfg.booster.n_estimators = n;
            }
            if let Some(lr) = learning_rate {
                cfg.booster.learning_rate = lr;
            }
            if let Some(depth) = max_depth {
                cfg.booster.max_depth = depth;
            }
            if let Some(s) = seed {
                cfg.booster.random_state = s;
                cfg.split_seed = s;
            }
            if let Some(k) = cv_folds {
                cfg.cv_folds = k;
            }
            if no_eval {
                cfg.evaluate = false;
            }
            cmd_train(&cfg)
        }),
        Commands::Predict {
            model,
            input,
            fields,
            json,
        } => cmd_predict(model.as_deref(), input.as_deref(), &fields, json),
        Commands::Stats {
            dataset,
            gender,
            min_age,
            max_age,
            family_history,
            json,
        } => {
            let filter = DatasetFilter {
                genders: (!gender.is_empty()).then_some(gender),
                age_range: (min_age.is_some() || max_age.is_some()).then(|| {
                    (
                        min_age.unwrap_or(f32::NEG_INFINITY),
                        max_age.unwrap_or(f32::INFINITY),
                    )
                }),
                family_history: (!family_history.is_empty()).then_some(family_history),
            };
            cmd_stats(dataset, &filter, json)
        }
        Commands::Info { model, json } => cmd_info(model.as_deref(), json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            e.exit_code()
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    Ok((key.trim().to_string(), value.trim().to_string()))
}

fn parse_gender(s: &str) -> std::result::Result<Gender, String> {
    Gender::parse(s).ok_or_else(|| format!("unknown gender '{s}'"))
}

fn parse_yes_no(s: &str) -> std::result::Result<YesNo, String> {
    YesNo::parse(s).ok_or_else(|| format!("expected yes or no, got '{s}'"))
}

fn load_training_config(path: Option<&Path>) -> Result<TrainingConfig> {
    let config = match path {
        Some(p) => TrainingConfig::from_file(p)?,
        None => TrainingConfig::default(),
    };
    Ok(config.with_env_overrides())
}

fn cmd_train(config: &TrainingConfig) -> Result<()> {
    println!("Training Obesity Pipeline");
    println!("=========================");
    println!("Dataset:       {}", config.dataset.display());
    println!("Estimators:    {}", config.booster.n_estimators);
    println!("Learning rate: {}", config.booster.learning_rate);
    println!("Max depth:     {}", config.booster.max_depth);
    println!("Seed:          {}", config.booster.random_state);
    println!();

    let start = Instant::now();
    let outcome = train_and_export(config)?;

    if let Some(evaluation) = &outcome.evaluation {
        println!("{evaluation}");
        println!();
    }
    let metadata = outcome.pipeline.metadata();
    println!("Trained on:    {} rows", metadata.n_training_rows);
    println!(
        "Artifact:      {} ({} bytes)",
        outcome.artifact.display(),
        outcome.artifact_bytes
    );
    println!("Elapsed:       {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}

/// Text or JSON result for one request.
#[derive(Serialize)]
#[serde(untagged)]
enum PredictionReport {
    Clinical(Box<ClinicalSummary>),
    Bare(Prediction),
}

impl PredictionReport {
    /// Clinical summary when the row is a complete, valid record.
    fn new(index: usize, row: &FeatureRow, prediction: Prediction) -> Self {
        match PatientRecord::try_from(row) {
            Ok(record) => Self::Clinical(Box::new(ClinicalSummary::new(&record, prediction))),
            Err(e) => {
                log::warn!("request {index}: no clinical summary ({e})");
                Self::Bare(prediction)
            }
        }
    }
}

fn cmd_predict(
    model: Option<&Path>,
    input: Option<&Path>,
    fields: &[(String, String)],
    json: bool,
) -> Result<()> {
    // The artifact must be usable before any request is read.
    let handle = ArtifactHandle::new(config::artifact_path(model));
    let pipeline = handle.get()?;

    let rows = read_requests(input, fields)?;
    let predictions = pipeline.predict_batch(&rows)?;
    let reports: Vec<PredictionReport> = rows
        .iter()
        .zip(predictions)
        .enumerate()
        .map(|(i, (row, prediction))| PredictionReport::new(i, row, prediction))
        .collect();

    if json {
        let out = if reports.len() == 1 {
            serde_json::to_string_pretty(&reports[0])?
        } else {
            serde_json::to_string_pretty(&reports)?
        };
        println!("{out}");
        return Ok(());
    }

    for (i, report) in reports.iter().enumerate() {
        if reports.len() > 1 {
            println!("--- Request {} ---", i + 1);
        }
        match report {
            PredictionReport::Clinical(summary) => println!("{summary}"),
            PredictionReport::Bare(prediction) => print_prediction(prediction),
        }
    }
    Ok(())
}

fn read_requests(input: Option<&Path>, fields: &[(String, String)]) -> Result<Vec<FeatureRow>> {
    if input.is_none() && !fields.is_empty() {
        return Ok(vec![FeatureRow::from_pairs(
            fields.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        )]);
    }

    let text = match input {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)?,
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let value: serde_json::Value = serde_json::from_str(&text)?;
    match &value {
        serde_json::Value::Array(items) => items.iter().map(FeatureRow::from_json).collect(),
        _ => Ok(vec![FeatureRow::from_json(&value)?]),
    }
}

fn print_prediction(prediction: &Prediction) {
    println!(
        "Predicted category: {} ({:.1}%)",
        prediction.category.label(),
        prediction.confidence() * 100.0
    );
    for (category, p) in prediction.ranked() {
        println!("  {:<14} {:>6.2}%", category.label(), p * 100.0);
    }
}

fn cmd_stats(dataset: Option<PathBuf>, filter: &DatasetFilter, json: bool) -> Result<()> {
    let path = dataset.unwrap_or_else(|| TrainingConfig::default().with_env_overrides().dataset);
    let data = LabeledDataset::from_path(&path)?;
    let analysis = analyze(&data, filter)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        println!("Dataset: {} ({} rows before filtering)", path.display(), data.len());
        println!();
        println!("{analysis}");
    }
    Ok(())
}

fn cmd_info(model: Option<&Path>, json: bool) -> Result<()> {
    let path = config::artifact_path(model);
    let pipeline = FittedPipeline::load(&path)?;
    let metadata = pipeline.metadata();

    if json {
        let info = serde_json::json!({
            "path": path,
            "classes": pipeline.classes(),
            "columns": pipeline.encoder().column_names(),
            "stages": pipeline.classifier().n_stages(),
            "metadata": metadata,
        });
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("Obesity Pipeline Artifact");
    println!("=========================");
    println!("Path:          {}", path.display());
    println!("Built by:      obesity-pipeline {}", metadata.crate_version);
    println!("Training rows: {}", metadata.n_training_rows);
    println!();

    println!("Classes:");
    for (category, count) in pipeline.classes().iter().zip(&metadata.class_counts) {
        println!("  {:<14} {count:>6} rows", category.label());
    }
    println!();

    let spec = &metadata.spec;
    println!("Hyperparameters:");
    println!("  n_estimators:      {}", spec.n_estimators);
    println!("  learning_rate:     {}", spec.learning_rate);
    println!("  max_depth:         {}", spec.max_depth);
    println!("  min_samples_split: {}", spec.min_samples_split);
    println!("  min_samples_leaf:  {}", spec.min_samples_leaf);
    println!("  subsample:         {}", spec.subsample);
    println!("  random_state:      {}", spec.random_state);
    println!("  fitted stages:     {}", pipeline.classifier().n_stages());
    println!();

    let encoder = pipeline.encoder();
    println!("Feature columns ({}):", encoder.dimension());
    println!("  numeric: {}", encoder.numeric_columns().join(", "));
    let categorical = encoder.categorical();
    for attribute in categorical.attributes() {
        let vocabulary = categorical.vocabulary(attribute).unwrap_or_default();
        println!("  {attribute}: {}", vocabulary.join(", "));
    }
    println!();

    println!("Top feature importances:");
    for (name, importance) in pipeline.feature_importances().iter().take(10) {
        println!("  {name:<28} {importance:.4}");
    }

    match &metadata.evaluation {
        Some(evaluation) => {
            println!();
            println!("{evaluation}");
        }
        None => println!("\nNo evaluation recorded."),
    }
    Ok(())
}
