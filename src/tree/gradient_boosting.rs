//! Gradient Boosting Classifier implementation.
//!
//! Multinomial deviance boosting with regression trees as weak learners.

use super::{DecisionTreeRegressor, PresortedFeatures};
use crate::error::{PipelineError, Result};
use crate::primitives::Matrix;
use crate::traits::Classifier;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Smallest class prior used for the initial raw score.
const MIN_PRIOR: f64 = 1e-12;

/// Gradient Boosting Classifier.
///
/// Uses gradient descent in function space on the multinomial log-loss.
///
/// # Algorithm
///
/// 1. Initialize every class's raw score with the log of its prior
/// 2. For each boosting stage, with `p = softmax(raw)`:
///    - For each class k, fit a regression tree to the residuals `y_k - p_k`
///    - Replace each leaf by one Newton step:
///      `(K-1)/K * sum(r) / sum(|r| * (1 - |r|))`
///    - Update `raw_k += learning_rate * tree_k(x)`
/// 3. Probabilities are `softmax(raw)`
///
/// With `subsample < 1.0`, each stage fits on a random subset of rows drawn
/// without replacement from an RNG seeded by `random_state`.
///
/// # Example
///
/// ```
/// use obesity_pipeline::prelude::*;
///
/// let x = Matrix::from_vec(6, 1, vec![0.0, 0.1, 0.2, 5.0, 5.1, 5.2]).unwrap();
/// let y = vec![0, 0, 0, 1, 1, 1];
///
/// let mut gbm = GradientBoostingClassifier::new().with_n_estimators(20);
/// gbm.fit(&x, &y).unwrap();
/// assert_eq!(gbm.predict(&x).unwrap(), y);
///
/// let proba = gbm.predict_proba(&x).unwrap();
/// assert!((proba[0].iter().sum::<f32>() - 1.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingClassifier {
    /// Number of boosting iterations
    n_estimators: usize,
    /// Learning rate (shrinkage parameter)
    learning_rate: f32,
    /// Maximum depth of each tree
    max_depth: usize,
    /// Minimum samples to split a node
    min_samples_split: usize,
    /// Minimum samples per leaf
    min_samples_leaf: usize,
    /// Fraction of rows drawn per stage
    subsample: f32,
    /// Seed for row subsampling
    random_state: u64,
    /// Output width; `None` infers `max(y) + 1`
    n_classes: Option<usize>,
    /// Initial raw score per class
    init_scores: Vec<f64>,
    /// `estimators[stage][class]`
    estimators: Vec<Vec<DecisionTreeRegressor>>,
    /// Width of the training matrix
    n_features: usize,
}

impl Default for GradientBoostingClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl GradientBoostingClassifier {
    /// Creates a new Gradient Boosting Classifier with default parameters.
    ///
    /// # Default Parameters
    ///
    /// - `n_estimators`: 100
    /// - `learning_rate`: 0.1
    /// - `max_depth`: 3
    /// - `min_samples_split`: 2, `min_samples_leaf`: 1
    /// - `subsample`: 1.0, `random_state`: 42
    #[must_use]
    pub fn new() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_split: 2,
            min_samples_leaf: 1,
            subsample: 1.0,
            random_state: 42,
            n_classes: None,
            init_scores: Vec::new(),
            estimators: Vec::new(),
            n_features: 0,
        }
    }

    /// Sets the number of boosting iterations.
    #[must_use]
    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    /// Sets the learning rate (shrinkage parameter).
    ///
    /// Lower values require more trees but often lead to better generalization.
    #[must_use]
    pub fn with_learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Sets the maximum depth of each tree.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the minimum number of samples required to split a node.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    /// Sets the minimum number of samples per leaf.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Sets the fraction of rows used per stage.
    #[must_use]
    pub fn with_subsample(mut self, subsample: f32) -> Self {
        self.subsample = subsample;
        self
    }

    /// Sets the seed for row subsampling.
    #[must_use]
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Fixes the number of output classes, so classes absent from a
    /// training subset still get a probability column.
    #[must_use]
    pub fn with_n_classes(mut self, n_classes: usize) -> Self {
        self.n_classes = Some(n_classes);
        self
    }

    /// Checks the configured hyperparameters without fitting.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidHyperparameter`] for the first bad value.
    pub fn validate(&self) -> Result<()> {
        let invalid = |param: &str, value: String, constraint: &str| {
            Err(PipelineError::InvalidHyperparameter {
                param: param.to_string(),
                value,
                constraint: constraint.to_string(),
            })
        };
        if self.n_estimators == 0 {
            return invalid("n_estimators", "0".into(), ">= 1");
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return invalid("learning_rate", self.learning_rate.to_string(), "> 0");
        }
        if self.max_depth == 0 {
            return invalid("max_depth", "0".into(), ">= 1");
        }
        if self.min_samples_split < 2 {
            return invalid(
                "min_samples_split",
                self.min_samples_split.to_string(),
                ">= 2",
            );
        }
        if self.min_samples_leaf == 0 {
            return invalid("min_samples_leaf", "0".into(), ">= 1");
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return invalid("subsample", self.subsample.to_string(), "in (0, 1]");
        }
        Ok(())
    }

    /// Raw (pre-softmax) scores for one row.
    fn raw_scores(&self, sample: &[f32]) -> Vec<f64> {
        let lr = f64::from(self.learning_rate);
        let mut raw = self.init_scores.clone();
        for stage in &self.estimators {
            for (k, tree) in stage.iter().enumerate() {
                raw[k] += lr * f64::from(tree.predict_row(sample));
            }
        }
        raw
    }

    fn check_input(&self, x: &Matrix<f32>) -> Result<()> {
        if self.estimators.is_empty() {
            return Err(PipelineError::NotFitted("GradientBoostingClassifier"));
        }
        if x.n_cols() != self.n_features {
            return Err(PipelineError::DimensionMismatch {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.n_cols()),
            });
        }
        Ok(())
    }

    /// Normalized total split improvement per feature; sums to 1 unless no
    /// tree ever split. `None` before `fit`.
    #[must_use]
    pub fn feature_importances(&self) -> Option<Vec<f32>> {
        if self.estimators.is_empty() {
            return None;
        }
        let mut importances = vec![0.0_f64; self.n_features];
        for tree in self.estimators.iter().flatten() {
            tree.accumulate_importances(&mut importances);
        }
        let total: f64 = importances.iter().sum();
        Some(
            importances
                .iter()
                .map(|&v| if total > 0.0 { (v / total) as f32 } else { 0.0 })
                .collect(),
        )
    }

    /// Number of fitted boosting stages.
    #[must_use]
    pub fn n_stages(&self) -> usize {
        self.estimators.len()
    }

    /// Initial raw score (log prior) per class.
    #[must_use]
    pub fn init_scores(&self) -> &[f64] {
        &self.init_scores
    }

    /// Number of output classes (0 before `fit`).
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.init_scores.len()
    }


    /// Returns the subsampling seed.
    #[must_use]
    pub fn random_state(&self) -> u64 {
        self.random_state
    }

    /// Width of the training matrix; 0 before `fit`.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Fitted trees, `[stage][class]`.
    #[must_use]
    pub fn estimators(&self) -> &[Vec<DecisionTreeRegressor>] {
        &self.estimators
    }

    /// Rows drawn for one stage, ascending.
    fn stage_rows(&self, n_samples: usize, rng: &mut StdRng) -> Vec<usize> {
        if self.subsample >= 1.0 {
            return (0..n_samples).collect();
        }
        let amount = ((f64::from(self.subsample) * n_samples as f64) as usize).clamp(1, n_samples);
        let mut rows = rand::seq::index::sample(rng, n_samples, amount).into_vec();
        rows.sort_unstable();
        rows
    }
}

impl Classifier for GradientBoostingClassifier {
    /// Trains the ensemble.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid hyperparameters, empty or mismatched
    /// input, non-finite features, or labels outside `n_classes`.
    fn fit(&mut self, x: &Matrix<f32>, y: &[usize]) -> Result<()> {
        self.validate()?;
        let (n_samples, n_features) = x.shape();
        if n_samples != y.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: format!("{n_samples} labels"),
                actual: format!("{} labels", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(PipelineError::EmptyDataset);
        }
        if x.as_slice().iter().any(|v| !v.is_finite()) {
            return Err("feature matrix contains non-finite values".into());
        }
        let inferred = y.iter().copied().max().map_or(0, |m| m + 1);
        let n_classes = self.n_classes.unwrap_or(inferred);
        if inferred > n_classes {
            return Err(PipelineError::Other(format!(
                "label {} out of range for {n_classes} classes",
                inferred - 1
            )));
        }
        if n_classes < 2 {
            return Err(PipelineError::InvalidHyperparameter {
                param: "n_classes".to_string(),
                value: n_classes.to_string(),
                constraint: ">= 2".to_string(),
            });
        }

        let mut counts = vec![0usize; n_classes];
        for &label in y {
            counts[label] += 1;
        }
        self.init_scores = counts
            .iter()
            .map(|&c| (c as f64 / n_samples as f64).max(MIN_PRIOR).ln())
            .collect();
        self.n_features = n_features;
        self.estimators = Vec::with_capacity(self.n_estimators);

        let presorted = PresortedFeatures::new(x);
        let mut rng = StdRng::seed_from_u64(self.random_state);
        let mut raw: Vec<Vec<f64>> = vec![self.init_scores.clone(); n_samples];
        let lr = f64::from(self.learning_rate);
        let k_factor = (n_classes - 1) as f64 / n_classes as f64;

        for stage in 0..self.n_estimators {
            let proba: Vec<Vec<f64>> = raw.iter().map(|r| softmax(r)).collect();
            let rows = self.stage_rows(n_samples, &mut rng);

            let mut trees = Vec::with_capacity(n_classes);
            for k in 0..n_classes {
                let residuals: Vec<f64> = (0..n_samples)
                    .map(|i| f64::from(u8::from(y[i] == k)) - proba[i][k])
                    .collect();

                let mut tree = DecisionTreeRegressor::new()
                    .with_max_depth(self.max_depth)
                    .with_min_samples_split(self.min_samples_split)
                    .with_min_samples_leaf(self.min_samples_leaf);
                tree.fit_presorted(&presorted, &residuals, &rows, |leaf_rows| {
                    newton_step(&residuals, leaf_rows, k_factor)
                })?;

                for (i, scores) in raw.iter_mut().enumerate() {
                    scores[k] += lr * f64::from(tree.predict_row(x.row(i)));
                }
                trees.push(tree);
            }
            self.estimators.push(trees);

            if (stage + 1) % 10 == 0 {
                log::debug!(
                    "boosting stage {}/{}: train deviance {:.5}",
                    stage + 1,
                    self.n_estimators,
                    deviance(&raw, y)
                );
            }
        }

        let (leaves, depth) = self
            .estimators
            .iter()
            .flatten()
            .filter_map(|tree| tree.tree.as_ref())
            .fold((0, 0), |(leaves, depth), root| {
                (leaves + root.n_leaves(), depth.max(root.depth()))
            });
        log::debug!(
            "fitted {} trees: {leaves} leaves, max depth {depth}",
            self.estimators.len() * n_classes
        );

        Ok(())
    }

    fn predict(&self, x: &Matrix<f32>) -> Result<Vec<usize>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.iter().map(|p| argmax(p)).collect())
    }

    /// Softmax of the raw scores, one distribution per row.
    fn predict_proba(&self, x: &Matrix<f32>) -> Result<Vec<Vec<f32>>> {
        self.check_input(x)?;
        Ok((0..x.n_rows())
            .map(|i| {
                softmax(&self.raw_scores(x.row(i)))
                    .into_iter()
                    .map(|p| p as f32)
                    .collect()
            })
            .collect())
    }
}

/// One Newton-Raphson step for the multinomial deviance.
fn newton_step(residuals: &[f64], rows: &[usize], k_factor: f64) -> f32 {
    let mut numerator = 0.0_f64;
    let mut denominator = 0.0_f64;
    for &i in rows {
        let r = residuals[i];
        numerator += r;
        denominator += r.abs() * (1.0 - r.abs());
    }
    if denominator.abs() < 1e-150 {
        0.0
    } else {
        (k_factor * numerator / denominator) as f32
    }
}

/// Max-shifted softmax.
fn softmax(raw: &[f64]) -> Vec<f64> {
    let max = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exp: Vec<f64> = raw.iter().map(|&r| (r - max).exp()).collect();
    let sum: f64 = exp.iter().sum();
    exp.into_iter().map(|e| e / sum).collect()
}

/// Mean multinomial deviance of the current raw scores.
fn deviance(raw: &[Vec<f64>], y: &[usize]) -> f64 {
    let total: f64 = raw
        .iter()
        .zip(y)
        .map(|(scores, &label)| {
            let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let log_sum = scores.iter().map(|&s| (s - max).exp()).sum::<f64>().ln() + max;
            log_sum - scores[label]
        })
        .sum();
    total / y.len() as f64
}

/// Index of the largest value; the first wins ties.
pub(crate) fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_softmax_sums_to_one() {
        let p = softmax(&[1000.0, 1000.0, -1000.0]);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((p[0] - 0.5).abs() < 1e-12);
        assert!(p[2] < 1e-300 || p[2] == 0.0);
    }

    #[test]
    fn test_newton_step_zero_denominator() {
        assert_eq!(newton_step(&[0.0, 0.0], &[0, 1], 0.5), 0.0);
    }

    #[test]
    fn test_newton_step_value() {
        // r = 0.5 for both rows: sum r = 1, sum |r|(1-|r|) = 0.5
        let v = newton_step(&[0.5, 0.5], &[0, 1], 0.5);
        assert!((v - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_argmax_first_wins_ties() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), 1);
        assert_eq!(argmax(&[]), 0);
    }

    #[test]
    fn test_deviance_of_uniform_scores() {
        let raw = vec![vec![0.0, 0.0]; 2];
        assert!((deviance(&raw, &[0, 1]) - 2.0_f64.ln()).abs() < 1e-12);
    }
}
