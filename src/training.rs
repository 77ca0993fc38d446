//! Offline training stage: evaluate, refit on every row, export.

use crate::config::TrainingConfig;
use crate::data::LabeledDataset;
use crate::error::Result;
use crate::evaluation::{run_evaluation, EvaluationSummary};
use crate::pipeline::FittedPipeline;
use std::path::PathBuf;

/// What a training run produced.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// The shipped pipeline, fit on 100% of the rows
    pub pipeline: FittedPipeline,
    /// Evaluation measured before the refit, if enabled
    pub evaluation: Option<EvaluationSummary>,
    /// Artifact location
    pub artifact: PathBuf,
    /// Artifact size in bytes
    pub artifact_bytes: usize,
}

/// Evaluates on splits of `dataset`, then fits the shipped pipeline on all of it.
///
/// The evaluation is stored in the pipeline's metadata but was measured on
/// different fits than the one returned.
///
/// # Errors
///
/// Returns configuration, evaluation, or fit errors.
pub fn fit_for_export(dataset: &LabeledDataset, config: &TrainingConfig) -> Result<FittedPipeline> {
    config.validate()?;
    let evaluation = if config.evaluate {
        Some(run_evaluation(
            dataset,
            &config.booster,
            &config.evaluation_plan(),
        )?)
    } else {
        log::info!("evaluation disabled; fitting shipped pipeline directly");
        None
    };

    log::info!("refitting on all {} rows", dataset.len());
    let pipeline = FittedPipeline::fit(dataset, &config.booster)?;
    Ok(match evaluation {
        Some(summary) => pipeline.with_evaluation(summary),
        None => pipeline,
    })
}

/// Loads the configured dataset, trains, and writes the artifact.
///
/// # Errors
///
/// Returns dataset errors ([`crate::PipelineError::SchemaMismatch`],
/// [`crate::PipelineError::InvalidLabel`], I/O), configuration errors, or
/// artifact write errors.
pub fn train_and_export(config: &TrainingConfig) -> Result<TrainingOutcome> {
    config.validate()?;
    let dataset = LabeledDataset::from_path(&config.dataset)?;
    let pipeline = fit_for_export(&dataset, config)?;
    let artifact_bytes = pipeline.save(&config.artifact)?;
    Ok(TrainingOutcome {
        evaluation: pipeline.metadata().evaluation.clone(),
        pipeline,
        artifact: config.artifact.clone(),
        artifact_bytes,
    })
}
