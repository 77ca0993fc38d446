//! Model selection utilities for cross-validation and train/test splitting.
//!
//! Splitters work on label slices and return row indices, so callers can fit
//! every preprocessing step on the training partition only.

use crate::error::{PipelineError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Results from cross-validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidationResult {
    /// Score for each fold
    pub scores: Vec<f32>,
}

impl CrossValidationResult {
    /// Calculate mean score across folds
    #[must_use]
    pub fn mean(&self) -> f32 {
        if self.scores.is_empty() {
            return 0.0;
        }
        self.scores.iter().sum::<f32>() / self.scores.len() as f32
    }

    /// Calculate standard deviation of scores
    #[must_use]
    pub fn std(&self) -> f32 {
        if self.scores.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let variance = self
            .scores
            .iter()
            .map(|&score| (score - mean).powi(2))
            .sum::<f32>()
            / self.scores.len() as f32;
        variance.sqrt()
    }

    /// Get minimum score
    #[must_use]
    pub fn min(&self) -> f32 {
        self.scores.iter().copied().fold(f32::INFINITY, f32::min)
    }

    /// Get maximum score
    #[must_use]
    pub fn max(&self) -> f32 {
        self.scores
            .iter()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max)
    }
}

/// Runs `fit_and_score(train_idx, test_idx)` on every fold of `cv`.
///
/// The callback owns fitting: it must build its model from the training
/// indices alone and return the score on the test indices.
///
/// # Example
///
/// ```
/// use obesity_pipeline::model_selection::{cross_validate, StratifiedKFold};
///
/// let y = vec![0, 0, 0, 1, 1, 1];
/// let cv = StratifiedKFold::new(3).with_random_state(42);
/// let result = cross_validate(&y, &cv, |train, test| {
///     assert!(test.iter().all(|i| !train.contains(i)));
///     Ok(1.0)
/// })
/// .unwrap();
/// assert_eq!(result.scores.len(), 3);
/// ```
///
/// # Errors
///
/// Propagates splitter errors and the first callback error.
pub fn cross_validate<F>(
    y: &[usize],
    cv: &StratifiedKFold,
    mut fit_and_score: F,
) -> Result<CrossValidationResult>
where
    F: FnMut(&[usize], &[usize]) -> Result<f32>,
{
    let splits = cv.split(y)?;
    let mut scores = Vec::with_capacity(splits.len());
    for (fold, (train_idx, test_idx)) in splits.iter().enumerate() {
        let score = fit_and_score(train_idx, test_idx)?;
        log::info!(
            "fold {}/{}: accuracy {score:.4} ({} train / {} test)",
            fold + 1,
            splits.len(),
            train_idx.len(),
            test_idx.len()
        );
        scores.push(score);
    }
    Ok(CrossValidationResult { scores })
}

/// Groups row indices by label, in label order.
fn indices_by_class(y: &[usize]) -> BTreeMap<usize, Vec<usize>> {
    let mut class_indices: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, &label) in y.iter().enumerate() {
        class_indices.entry(label).or_default().push(i);
    }
    class_indices
}

/// Stratified K-Fold cross-validator.
///
/// Each class is split across the folds separately, so every fold keeps
/// approximately the overall class proportions. Classes are visited in
/// label order, which makes the folds a pure function of `y` and the seed.
///
/// # Example
///
/// ```rust
/// use obesity_pipeline::model_selection::StratifiedKFold;
///
/// let y = [0, 0, 0, 0, 1, 1, 1, 1, 2, 2];
/// let skfold = StratifiedKFold::new(2).with_random_state(42);
///
/// let splits = skfold.split(&y).unwrap();
/// assert_eq!(splits.len(), 2);
/// for (train, test) in &splits {
///     assert_eq!(train.len() + test.len(), 10);
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StratifiedKFold {
    n_splits: usize,
    shuffle: bool,
    random_state: Option<u64>,
}

impl StratifiedKFold {
    /// Create a new Stratified K-Fold cross-validator.
    ///
    /// `n_splits` must be at least 2; this is checked by [`StratifiedKFold::split`].
    #[must_use]
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            shuffle: false,
            random_state: None,
        }
    }

    /// Enable shuffling within each class before splitting.
    ///
    /// Without a random state the seed is 0, so splits stay reproducible.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Set random state for reproducible shuffling (enables shuffling).
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self.shuffle = true;
        self
    }

    /// Number of folds.
    #[must_use]
    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Generate stratified `(train, test)` indices for each fold.
    ///
    /// Both index lists are sorted ascending. Leftover rows of each class
    /// are dealt round-robin, continuing from where the previous class
    /// stopped, so fold sizes differ by at most one.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidHyperparameter`] if `n_splits < 2` or
    /// exceeds the number of samples.
    pub fn split(&self, y: &[usize]) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
        let n_samples = y.len();
        if self.n_splits < 2 || self.n_splits > n_samples {
            return Err(PipelineError::InvalidHyperparameter {
                param: "n_splits".to_string(),
                value: self.n_splits.to_string(),
                constraint: format!("in [2, {n_samples}]"),
            });
        }

        let mut class_indices = indices_by_class(y);
        if self.shuffle {
            let mut rng = StdRng::seed_from_u64(self.random_state.unwrap_or(0));
            for indices in class_indices.values_mut() {
                indices.shuffle(&mut rng);
            }
        }
        for (label, indices) in &class_indices {
            if indices.len() < self.n_splits {
                log::warn!(
                    "class {label} has {} rows, fewer than {} folds",
                    indices.len(),
                    self.n_splits
                );
            }
        }

        let mut fold_indices: Vec<Vec<usize>> = vec![Vec::new(); self.n_splits];
        let mut next_extra = 0;
        for indices in class_indices.values() {
            let fold_size = indices.len() / self.n_splits;
            let remainder = indices.len() % self.n_splits;

            let mut start = 0;
            for offset in 0..self.n_splits {
                let fold = (next_extra + offset) % self.n_splits;
                let current_size = fold_size + usize::from(offset < remainder);
                let end = start + current_size;
                fold_indices[fold].extend_from_slice(&indices[start..end]);
                start = end;
            }
            next_extra = (next_extra + remainder) % self.n_splits;
        }

        let mut result = Vec::with_capacity(self.n_splits);
        for i in 0..self.n_splits {
            let mut test_indices = fold_indices[i].clone();
            test_indices.sort_unstable();

            let mut train_indices = Vec::with_capacity(n_samples - test_indices.len());
            for (j, fold) in fold_indices.iter().enumerate() {
                if i != j {
                    train_indices.extend_from_slice(fold);
                }
            }
            train_indices.sort_unstable();

            result.push((train_indices, test_indices));
        }

        Ok(result)
    }
}

/// Stratified single train/test split over labels `y`.
///
/// For each class, `round(n_k * test_size)` shuffled rows go to the test
/// set and the rest to training. Returns `(train, test)`, both sorted.
///
/// ```
/// use obesity_pipeline::model_selection::train_test_split_stratified;
///
/// let y: Vec<usize> = (0..50).map(|i| i % 2).collect();
/// let (train, test) = train_test_split_stratified(&y, 0.2, 42).unwrap();
/// assert_eq!(test.len(), 10);
/// assert_eq!(train.len(), 40);
/// assert_eq!(test.iter().filter(|&&i| y[i] == 1).count(), 5);
/// ```
///
/// # Errors
///
/// Returns an error if `test_size` is outside (0, 1) or either side would
/// be empty.
pub fn train_test_split_stratified(
    y: &[usize],
    test_size: f32,
    random_state: u64,
) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(PipelineError::InvalidHyperparameter {
            param: "test_size".to_string(),
            value: test_size.to_string(),
            constraint: "in (0, 1)".to_string(),
        });
    }

    let mut rng = StdRng::seed_from_u64(random_state);
    let mut train = Vec::with_capacity(y.len());
    let mut test = Vec::new();
    for (_, mut indices) in indices_by_class(y) {
        indices.shuffle(&mut rng);
        let n_test = (indices.len() as f64 * f64::from(test_size)).round() as usize;
        test.extend_from_slice(&indices[..n_test]);
        train.extend_from_slice(&indices[n_test..]);
    }

    if train.is_empty() || test.is_empty() {
        return Err(PipelineError::Other(format!(
            "stratified split of {} rows with test_size {test_size} leaves an empty side",
            y.len()
        )));
    }
    train.sort_unstable();
    test.sort_unstable();
    Ok((train, test))
}
