//! Covariance and correlation computations.
//!
//! # Mathematical Background
//!
//! ## Covariance
//!
//! ```text
//! Cov(X, Y) = (1/n) Σ (x_i - x̄)(y_i - ȳ)
//! ```
//!
//! ## Pearson Correlation
//!
//! ```text
//! ρ(X, Y) = Cov(X, Y) / (σ_X σ_Y)
//! ```
//!
//! Pairs where either value is `NaN` are dropped (pairwise deletion). A
//! variable with zero variance has no defined correlation, so it yields
//! `NaN` instead of an error.
//!
//! # Examples
//!
//! ```
//! use obesity_pipeline::stats::{corr, cov};
//!
//! let x = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let y = [2.0, 4.0, 6.0, 8.0, 10.0];
//!
//! assert!(cov(&x, &y).unwrap() > 0.0);
//! assert!((corr(&x, &y).unwrap() - 1.0).abs() < 1e-6);
//! ```

use crate::error::{PipelineError, Result};
use crate::primitives::Matrix;

/// Variance below this is treated as zero.
const MIN_VARIANCE: f64 = 1e-20;

/// Sums needed for covariance and correlation of one pair of variables.
struct PairMoments {
    n: usize,
    cov_sum: f64,
    x_var_sum: f64,
    y_var_sum: f64,
}

fn pair_moments(x: &[f32], y: &[f32]) -> Result<PairMoments> {
    if x.len() != y.len() {
        return Err(PipelineError::DimensionMismatch {
            expected: format!("{} values in x", x.len()),
            actual: format!("{} values in y", y.len()),
        });
    }
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter(|(a, b)| !a.is_nan() && !b.is_nan())
        .map(|(&a, &b)| (f64::from(a), f64::from(b)))
        .collect();
    if pairs.is_empty() {
        return Err(PipelineError::Other(
            "cannot compute covariance of empty vectors".into(),
        ));
    }

    let n = pairs.len() as f64;
    let x_mean = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let y_mean = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let mut moments = PairMoments {
        n: pairs.len(),
        cov_sum: 0.0,
        x_var_sum: 0.0,
        y_var_sum: 0.0,
    };
    for (xi, yi) in pairs {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        moments.cov_sum += dx * dy;
        moments.x_var_sum += dx * dx;
        moments.y_var_sum += dy * dy;
    }
    Ok(moments)
}

/// Population covariance of `x` and `y`.
///
/// # Errors
///
/// Returns an error if the lengths differ or no complete pair exists.
pub fn cov(x: &[f32], y: &[f32]) -> Result<f32> {
    let m = pair_moments(x, y)?;
    Ok((m.cov_sum / m.n as f64) as f32)
}

/// Pearson correlation of `x` and `y`, in [-1, 1].
///
/// Returns `NaN` if either variable has zero variance.
///
/// # Errors
///
/// Returns an error if the lengths differ or no complete pair exists.
pub fn corr(x: &[f32], y: &[f32]) -> Result<f32> {
    let m = pair_moments(x, y)?;
    if m.x_var_sum / (m.n as f64) < MIN_VARIANCE || m.y_var_sum / (m.n as f64) < MIN_VARIANCE {
        return Ok(f32::NAN);
    }
    let r = m.cov_sum / (m.x_var_sum.sqrt() * m.y_var_sum.sqrt());
    Ok(r.clamp(-1.0, 1.0) as f32)
}

/// Pearson correlation matrix of the columns of `data` (n samples × p features).
///
/// The diagonal is 1.0, except for zero-variance columns whose whole row
/// and column are `NaN`.
///
/// ```
/// use obesity_pipeline::primitives::Matrix;
/// use obesity_pipeline::stats::corr_matrix;
///
/// let data = Matrix::from_vec(3, 3, vec![
///     1.0, 2.0, 5.0,
///     2.0, 4.0, 5.0,
///     3.0, 6.0, 5.0,
/// ]).unwrap();
///
/// let c = corr_matrix(&data).unwrap();
/// assert!((c.get(0, 1) - 1.0).abs() < 1e-6);
/// assert!(c.get(0, 2).is_nan());
/// assert!(c.get(2, 2).is_nan());
/// ```
///
/// # Errors
///
/// Returns an error if `data` has no rows or no columns.
pub fn corr_matrix(data: &Matrix<f32>) -> Result<Matrix<f32>> {
    let (n, p) = data.shape();
    if n == 0 || p == 0 {
        return Err(PipelineError::Other(
            "cannot compute correlation matrix for empty data".into(),
        ));
    }

    let columns: Vec<Vec<f32>> = (0..p).map(|j| data.column(j)).collect();
    let mut values = vec![0.0_f32; p * p];
    for i in 0..p {
        for j in 0..=i {
            let r = if i == j {
                let self_corr = corr(&columns[i], &columns[i]).unwrap_or(f32::NAN);
                if self_corr.is_nan() {
                    f32::NAN
                } else {
                    1.0
                }
            } else {
                corr(&columns[i], &columns[j]).unwrap_or(f32::NAN)
            };
            values[i * p + j] = r;
            values[j * p + i] = r;
        }
    }
    Ok(Matrix::from_vec(p, p, values)?)
}
