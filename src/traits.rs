//! Core traits for transformers and classifiers.
//!
//! These traits define the API contracts the pipeline composes.

use crate::error::Result;
use crate::primitives::Matrix;

/// Trait for data transformers (scalers, encoders).
///
/// ```
/// use obesity_pipeline::prelude::*;
///
/// let x = Matrix::from_vec(3, 1, vec![1.0, 2.0, 3.0]).unwrap();
/// let mut scaler = StandardScaler::new();
/// let scaled = scaler.fit_transform(&x).unwrap();
/// assert!(scaled.get(1, 0).abs() < 1e-6);
/// ```
pub trait Transformer {
    /// Fits the transformer to data.
    ///
    /// # Errors
    ///
    /// Returns an error if fitting fails.
    fn fit(&mut self, x: &Matrix<f32>) -> Result<()>;

    /// Transforms data using fitted parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if transformer is not fitted.
    fn transform(&self, x: &Matrix<f32>) -> Result<Matrix<f32>>;

    /// Fits and transforms in one step.
    ///
    /// # Errors
    ///
    /// Returns an error if fitting fails.
    fn fit_transform(&mut self, x: &Matrix<f32>) -> Result<Matrix<f32>> {
        self.fit(x)?;
        self.transform(x)
    }
}

/// Multiclass classifier over dense feature rows and class indices.
pub trait Classifier {
    /// Fits on features `x` and labels `y` (class indices `0..n_classes`).
    ///
    /// # Errors
    ///
    /// Returns an error on dimension mismatch, empty input, or bad labels.
    fn fit(&mut self, x: &Matrix<f32>, y: &[usize]) -> Result<()>;

    /// Most probable class index per row.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is not fitted or the width differs.
    fn predict(&self, x: &Matrix<f32>) -> Result<Vec<usize>>;

    /// Class probabilities per row; each inner vector sums to 1.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is not fitted or the width differs.
    fn predict_proba(&self, x: &Matrix<f32>) -> Result<Vec<Vec<f32>>>;

    /// Accuracy on `(x, y)`.
    ///
    /// # Errors
    ///
    /// Propagates prediction errors; fails if `y` and `x` differ in length.
    fn score(&self, x: &Matrix<f32>, y: &[usize]) -> Result<f32> {
        let predictions = self.predict(x)?;
        if predictions.len() != y.len() {
            return Err(crate::error::PipelineError::DimensionMismatch {
                expected: format!("{} labels", predictions.len()),
                actual: format!("{} labels", y.len()),
            });
        }
        Ok(crate::metrics::accuracy(&predictions, y))
    }
}
