//! Preprocessing transformers: numeric standardization and the name-keyed
//! feature encoder.
//!
//! # Example
//!
//! ```
//! use obesity_pipeline::prelude::*;
//! use obesity_pipeline::preprocessing::StandardScaler;
//!
//! // Height in meters, weight in kilograms
//! let data = Matrix::from_vec(4, 2, vec![
//!     1.60, 55.0,
//!     1.70, 70.0,
//!     1.80, 85.0,
//!     1.90, 100.0,
//! ]).expect("valid matrix dimensions");
//!
//! let mut scaler = StandardScaler::new();
//! let scaled = scaler.fit_transform(&data).expect("fit_transform should succeed");
//!
//! // Each column now has mean ≈ 0 and std ≈ 1
//! assert!(scaled.get(0, 0) < 0.0);
//! assert!((scaled.get(0, 0) - scaled.get(0, 1)).abs() < 1e-4);
//! ```

mod encoder;

pub use encoder::{EncodingNotes, FeatureEncoder, OneHotEncoder};

use crate::error::{PipelineError, Result};
use crate::primitives::Matrix;
use crate::traits::Transformer;
use serde::{Deserialize, Serialize};

/// Standard deviations at or below this are treated as zero variance.
const MIN_STD: f32 = 1e-10;

/// Standardizes features by removing mean and scaling to unit variance.
///
/// The standard score of a sample x is: z = (x - mean) / std
///
/// `NaN` cells are missing values: they are skipped when learning the
/// statistics and come out of [`Transformer::transform`] as `0.0`, i.e. the
/// training mean. Zero-variance columns are centered but not scaled.
///
/// # Example
///
/// ```
/// use obesity_pipeline::prelude::*;
/// use obesity_pipeline::preprocessing::StandardScaler;
///
/// let data = Matrix::from_vec(3, 2, vec![
///     0.0, 5.0,
///     1.0, f32::NAN,
///     2.0, 7.0,
/// ]).expect("valid matrix dimensions");
///
/// let mut scaler = StandardScaler::new();
/// let scaled = scaler.fit_transform(&data).expect("fit_transform should succeed");
///
/// assert!((scaler.mean()[1] - 6.0).abs() < 1e-6);
/// assert_eq!(scaled.get(1, 1), 0.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Mean of each feature (computed during fit).
    mean: Option<Vec<f32>>,
    /// Population standard deviation of each feature (computed during fit).
    std: Option<Vec<f32>>,
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardScaler {
    /// Creates an unfitted scaler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mean: None,
            std: None,
        }
    }

    /// Mean of each feature; empty before `fit`.
    #[must_use]
    pub fn mean(&self) -> &[f32] {
        self.mean.as_deref().unwrap_or(&[])
    }

    /// Standard deviation of each feature; empty before `fit`.
    #[must_use]
    pub fn std(&self) -> &[f32] {
        self.std.as_deref().unwrap_or(&[])
    }

    /// Returns true if the scaler has been fitted.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.mean.is_some()
    }

    /// Number of features seen during fit.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.mean().len()
    }

    /// Standardizes one row in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the scaler is not fitted or the row width differs.
    pub fn transform_row(&self, row: &mut [f32]) -> Result<()> {
        let (mean, std) = match (&self.mean, &self.std) {
            (Some(mean), Some(std)) => (mean, std),
            _ => return Err(PipelineError::NotFitted("StandardScaler")),
        };
        if row.len() != mean.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: format!("{} numeric features", mean.len()),
                actual: format!("{} numeric features", row.len()),
            });
        }
        for (j, val) in row.iter_mut().enumerate() {
            if val.is_nan() {
                *val = 0.0;
                continue;
            }
            *val -= mean[j];
            if std[j] > MIN_STD {
                *val /= std[j];
            }
        }
        Ok(())
    }
}

impl Transformer for StandardScaler {
    /// Computes the mean and standard deviation of each feature, skipping `NaN`.
    fn fit(&mut self, x: &Matrix<f32>) -> Result<()> {
        let (n_samples, n_features) = x.shape();

        if n_samples == 0 {
            return Err(PipelineError::EmptyDataset);
        }

        let mut mean = vec![0.0; n_features];
        let mut std = vec![0.0; n_features];
        for j in 0..n_features {
            let mut sum = 0.0_f64;
            let mut count = 0usize;
            for i in 0..n_samples {
                let v = x.get(i, j);
                if !v.is_nan() {
                    sum += f64::from(v);
                    count += 1;
                }
            }
            if count == 0 {
                log::warn!("numeric column {j} has no observed values");
                continue;
            }
            let m = sum / count as f64;

            // Population std (divide by n, not n-1) like sklearn
            let mut sum_sq = 0.0_f64;
            for i in 0..n_samples {
                let v = x.get(i, j);
                if !v.is_nan() {
                    let diff = f64::from(v) - m;
                    sum_sq += diff * diff;
                }
            }
            mean[j] = m as f32;
            std[j] = (sum_sq / count as f64).sqrt() as f32;
        }

        self.mean = Some(mean);
        self.std = Some(std);

        Ok(())
    }

    /// Standardizes the data using fitted mean and std.
    fn transform(&self, x: &Matrix<f32>) -> Result<Matrix<f32>> {
        if !self.is_fitted() {
            return Err(PipelineError::NotFitted("StandardScaler"));
        }
        let (n_samples, n_features) = x.shape();
        let mut result = x.as_slice().to_vec();
        if n_features > 0 {
            for row in result.chunks_mut(n_features) {
                self.transform_row(row)?;
            }
        }
        Ok(Matrix::from_vec(n_samples, n_features, result)?)
    }
}

#[cfg(test)]
mod tests;
