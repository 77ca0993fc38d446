//! Training configuration.
//!
//! Resolution order: built-in defaults, then an optional JSON file, then the
//! `OBESITY_DATASET` / `OBESITY_ARTIFACT` environment variables, then CLI
//! flags (applied by the binary).

use crate::error::{PipelineError, Result};
use crate::evaluation::EvaluationPlan;
use crate::pipeline::PipelineSpec;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the training CSV.
pub const DATASET_ENV: &str = "OBESITY_DATASET";

/// Environment variable naming the artifact file.
pub const ARTIFACT_ENV: &str = "OBESITY_ARTIFACT";

/// Default training CSV.
pub const DEFAULT_DATASET: &str = "Obesity.csv";

/// Default artifact file.
pub const DEFAULT_ARTIFACT: &str = "obesity_pipeline.obp";

/// Everything the `train` command needs.
///
/// Unlisted JSON keys fall back to their defaults:
///
/// ```
/// use obesity_pipeline::config::TrainingConfig;
///
/// let config = TrainingConfig::from_json_str(r#"{"n_estimators": 50, "cv_folds": 3}"#).unwrap();
/// assert_eq!(config.booster.n_estimators, 50);
/// assert_eq!(config.cv_folds, 3);
/// assert_eq!(config.booster.max_depth, 3);
/// assert_eq!(config.test_size, 0.2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Labelled CSV to train on
    pub dataset: PathBuf,
    /// Where the fitted pipeline is written
    pub artifact: PathBuf,
    /// Booster hyperparameters
    #[serde(flatten)]
    pub booster: PipelineSpec,
    /// Stratified folds for cross-validation
    pub cv_folds: usize,
    /// Holdout fraction
    pub test_size: f32,
    /// Seed for fold shuffling and the holdout split
    pub split_seed: u64,
    /// Run cross-validation and the holdout split before the final fit
    pub evaluate: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from(DEFAULT_DATASET),
            artifact: PathBuf::from(DEFAULT_ARTIFACT),
            booster: PipelineSpec::default(),
            cv_folds: 5,
            test_size: 0.2,
            split_seed: 42,
            evaluate: true,
        }
    }
}

impl TrainingConfig {
    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Json`] for malformed JSON or mistyped fields.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Io`] or [`PipelineError::Json`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        log::debug!("loaded training config from {}", path.display());
        Ok(config)
    }

    /// Applies `OBESITY_DATASET` and `OBESITY_ARTIFACT` if set.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies path overrides from `lookup`, keyed by environment variable name.
    #[must_use]
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dataset) = lookup(DATASET_ENV).filter(|v| !v.is_empty()) {
            log::debug!("{DATASET_ENV} overrides dataset path: {dataset}");
            self.dataset = PathBuf::from(dataset);
        }
        if let Some(artifact) = lookup(ARTIFACT_ENV).filter(|v| !v.is_empty()) {
            log::debug!("{ARTIFACT_ENV} overrides artifact path: {artifact}");
            self.artifact = PathBuf::from(artifact);
        }
        self
    }

    /// Evaluation split settings.
    #[must_use]
    pub fn evaluation_plan(&self) -> EvaluationPlan {
        EvaluationPlan {
            cv_folds: self.cv_folds,
            test_size: self.test_size,
            split_seed: self.split_seed,
        }
    }

    /// Rejects out-of-range settings.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidHyperparameter`] for the first bad value.
    pub fn validate(&self) -> Result<()> {
        self.booster.validate()?;
        if self.cv_folds < 2 {
            return Err(PipelineError::InvalidHyperparameter {
                param: "cv_folds".to_string(),
                value: self.cv_folds.to_string(),
                constraint: ">= 2".to_string(),
            });
        }
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(PipelineError::InvalidHyperparameter {
                param: "test_size".to_string(),
                value: self.test_size.to_string(),
                constraint: "in (0, 1)".to_string(),
            });
        }
        Ok(())
    }
}

/// Artifact path after applying `OBESITY_ARTIFACT`, for inference commands.
#[must_use]
pub fn artifact_path(explicit: Option<&Path>) -> PathBuf {
    explicit.map_or_else(
        || {
            std::env::var(ARTIFACT_ENV)
                .ok()
                .filter(|v| !v.is_empty())
                .map_or_else(|| PathBuf::from(DEFAULT_ARTIFACT), PathBuf::from)
        },
        Path::to_path_buf,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrainingConfig::default();
        assert_eq!(config.booster, PipelineSpec::default());
        assert_eq!(config.booster.n_estimators, 100);
        assert_eq!(config.booster.random_state, 42);
        assert_eq!(config.cv_folds, 5);
        assert_eq!(config.split_seed, 42);
        assert!(config.evaluate);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_flattened_json() {
        let config = TrainingConfig::from_json_str(
            r#"{"dataset": "data/train.csv", "learning_rate": 0.05, "subsample": 0.8}"#,
        )
        .unwrap();
        assert_eq!(config.dataset, PathBuf::from("data/train.csv"));
        assert!((config.booster.learning_rate - 0.05).abs() < 1e-6);
        assert!((config.booster.subsample - 0.8).abs() < 1e-6);
        assert_eq!(config.artifact, PathBuf::from(DEFAULT_ARTIFACT));
    }

    #[test]
    fn test_bad_json_is_json_error() {
        assert!(matches!(
            TrainingConfig::from_json_str(r#"{"cv_folds": "five"}"#),
            Err(PipelineError::Json(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let config = TrainingConfig::default().with_overrides(|key| match key {
            DATASET_ENV => Some("/srv/obesity.csv".to_string()),
            ARTIFACT_ENV => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.dataset, PathBuf::from("/srv/obesity.csv"));
        assert_eq!(config.artifact, PathBuf::from(DEFAULT_ARTIFACT));
    }

    #[test]
    fn test_validate_rejects() {
        let mut config = TrainingConfig {
            cv_folds: 1,
            ..TrainingConfig::default()
        };
        assert!(config.validate().is_err());
        config.cv_folds = 5;
        config.test_size = 1.0;
        assert!(config.validate().is_err());
        config.test_size = 0.2;
        config.booster.max_depth = 0;
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidHyperparameter { param, .. }) if param == "max_depth"
        ));
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.json");
        let config = TrainingConfig {
            cv_folds: 3,
            ..TrainingConfig::default()
        };
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
        assert_eq!(TrainingConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_explicit_artifact_path_wins() {
        let explicit = PathBuf::from("/tmp/model.obp");
        assert_eq!(artifact_path(Some(&explicit)), explicit);
    }
}
