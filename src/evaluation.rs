//! Generalization estimate run before the shipped fit.
//!
//! Stratified k-fold cross-validation plus one stratified holdout split. Every
//! model here is fit on its own training partition only; the shipped
//! pipeline is refit on all rows afterwards, so these figures describe the
//! procedure, not the exact shipped artifact.

use crate::data::{LabeledDataset, ObesityCategory};
use crate::error::{PipelineError, Result};
use crate::metrics::{accuracy, ClassificationReport, ConfusionMatrix};
use crate::model_selection::{
    cross_validate, train_test_split_stratified, CrossValidationResult, StratifiedKFold,
};
use crate::pipeline::{FittedPipeline, PipelineSpec};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Caveat attached to every recorded evaluation.
pub const SCOPE_NOTE: &str = "measured on evaluation splits, not on the shipped fit";

/// How to split the data for evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationPlan {
    /// Number of stratified folds
    pub cv_folds: usize,
    /// Holdout fraction
    pub test_size: f32,
    /// Seed for fold shuffling and the holdout split
    pub split_seed: u64,
}

impl Default for EvaluationPlan {
    fn default() -> Self {
        Self {
            cv_folds: 5,
            test_size: 0.2,
            split_seed: 42,
        }
    }
}

/// Cross-validation and holdout results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    /// Split settings used
    pub plan: EvaluationPlan,
    /// Accuracy of every fold
    pub cv: CrossValidationResult,
    /// Holdout `(train, test)` row counts
    pub holdout_rows: (usize, usize),
    /// Accuracy on the holdout partition
    pub holdout_accuracy: f32,
    /// Per-class metrics on the holdout partition
    pub report: ClassificationReport,
    /// Holdout confusion matrix
    pub confusion: ConfusionMatrix,
    /// Always [`SCOPE_NOTE`]
    pub note: String,
}

/// Runs cross-validation and the holdout split with `spec`.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyDataset`] for an empty dataset, an
/// [`PipelineError::InvalidHyperparameter`] for impossible fold counts or
/// split sizes, or any pipeline fit error.
pub fn run_evaluation(
    dataset: &LabeledDataset,
    spec: &PipelineSpec,
    plan: &EvaluationPlan,
) -> Result<EvaluationSummary> {
    if dataset.is_empty() {
        return Err(PipelineError::EmptyDataset);
    }
    let y = dataset.label_indices();

    let folds = StratifiedKFold::new(plan.cv_folds)
        .with_shuffle(true)
        .with_random_state(plan.split_seed);
    let cv = cross_validate(&y, &folds, |train, test| {
        let pipeline = FittedPipeline::fit(&dataset.subset(train), spec)?;
        let held_out = dataset.subset(test);
        let predicted = pipeline.predict_indices(held_out.rows())?;
        Ok(accuracy(&predicted, &held_out.label_indices()))
    })?;
    log::info!(
        "cross-validation accuracy {:.4} +/- {:.4} over {} folds",
        cv.mean(),
        cv.std(),
        cv.scores.len()
    );

    let (train, test) = train_test_split_stratified(&y, plan.test_size, plan.split_seed)?;
    let pipeline = FittedPipeline::fit(&dataset.subset(&train), spec)?;
    let held_out = dataset.subset(&test);
    let y_true = held_out.label_indices();
    let y_pred = pipeline.predict_indices(held_out.rows())?;

    let labels: Vec<&str> = ObesityCategory::ALL.iter().map(|c| c.label()).collect();
    let confusion = ConfusionMatrix::new(&y_pred, &y_true, ObesityCategory::COUNT);
    let report = ClassificationReport::from_confusion(&confusion, &labels);
    let holdout_accuracy = accuracy(&y_pred, &y_true);
    log::info!(
        "holdout accuracy {holdout_accuracy:.4} ({} train / {} test)",
        train.len(),
        test.len()
    );

    Ok(EvaluationSummary {
        plan: *plan,
        cv,
        holdout_rows: (train.len(), test.len()),
        holdout_accuracy,
        report,
        confusion,
        note: SCOPE_NOTE.to_string(),
    })
}

impl fmt::Display for EvaluationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = ObesityCategory::ALL.iter().map(|c| c.label()).collect();
        writeln!(f, "Cross-validation ({} folds)", self.cv.scores.len())?;
        let folds: Vec<String> = self.cv.scores.iter().map(|s| format!("{s:.4}")).collect();
        writeln!(f, "  fold accuracy: [{}]", folds.join(", "))?;
        writeln!(
            f,
            "  mean accuracy: {:.4} (+/- {:.4})",
            self.cv.mean(),
            self.cv.std()
        )?;
        writeln!(f)?;
        writeln!(
            f,
            "Holdout ({} train / {} test)",
            self.holdout_rows.0, self.holdout_rows.1
        )?;
        writeln!(f, "  accuracy: {:.4}", self.holdout_accuracy)?;
        writeln!(f)?;
        writeln!(f, "{}", self.report)?;
        writeln!(f, "Confusion matrix (rows = actual, columns = predicted)")?;
        writeln!(f, "{}", self.confusion.render(&labels))?;
        write!(f, "Note: {}", self.note)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic::bmi_labelled;

    fn quick_spec() -> PipelineSpec {
        PipelineSpec {
            n_estimators: 10,
            ..PipelineSpec::default()
        }
    }

    #[test]
    fn test_evaluation_shapes() {
        let dataset = bmi_labelled(140, 4);
        let summary = run_evaluation(&dataset, &quick_spec(), &EvaluationPlan::default()).unwrap();
        assert_eq!(summary.cv.scores.len(), 5);
        assert_eq!(summary.holdout_rows, (112, 28));
        assert_eq!(summary.confusion.total(), 28);
        assert_eq!(summary.confusion.n_classes(), 7);
        assert_eq!(summary.note, SCOPE_NOTE);
        assert!(summary.cv.scores.iter().all(|s| (0.0..=1.0).contains(s)));
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let dataset = bmi_labelled(70, 8);
        let plan = EvaluationPlan {
            cv_folds: 3,
            ..EvaluationPlan::default()
        };
        let a = run_evaluation(&dataset, &quick_spec(), &plan).unwrap();
        let b = run_evaluation(&dataset, &quick_spec(), &plan).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_learnable_data_scores_well() {
        let dataset = bmi_labelled(280, 21);
        let spec = PipelineSpec {
            n_estimators: 40,
            ..PipelineSpec::default()
        };
        let summary = run_evaluation(&dataset, &spec, &EvaluationPlan::default()).unwrap();
        assert!(summary.cv.mean() > 0.4, "cv mean {}", summary.cv.mean());
    }

    #[test]
    fn test_too_many_folds_rejected() {
        let dataset = bmi_labelled(7, 0);
        let plan = EvaluationPlan {
            cv_folds: 10,
            ..EvaluationPlan::default()
        };
        assert!(matches!(
            run_evaluation(&dataset, &quick_spec(), &plan),
            Err(PipelineError::InvalidHyperparameter { .. })
        ));
    }

    #[test]
    fn test_display_mentions_caveat() {
        let dataset = bmi_labelled(70, 2);
        let plan = EvaluationPlan {
            cv_folds: 2,
            ..EvaluationPlan::default()
        };
        let text = run_evaluation(&dataset, &quick_spec(), &plan)
            .unwrap()
            .to_string();
        assert!(text.contains("Cross-validation (2 folds)"));
        assert!(text.contains(SCOPE_NOTE));
    }
}
