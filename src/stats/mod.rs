//! Descriptive statistics over `f32` samples.
//!
//! - Quantiles and percentiles using the R-7 method (Hyndman & Fan 1996)
//! - Five-number summary (min, Q1, median, Q3, max)
//! - Covariance and Pearson correlation matrices
//!
//! `NaN` samples are treated as missing and dropped before any statistic
//! is computed.
//!
//! # Examples
//!
//! ```
//! use obesity_pipeline::stats::DescriptiveStats;
//!
//! let data = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(&data);
//!
//! assert_eq!(stats.quantile(0.5).unwrap(), 3.0);
//! assert_eq!(stats.quantile(0.0).unwrap(), 1.0);
//! assert_eq!(stats.quantile(1.0).unwrap(), 5.0);
//! ```

pub mod covariance;

pub use covariance::{corr, corr_matrix, cov};

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};

/// Descriptive statistics over the non-`NaN` values of a slice.
#[derive(Debug, Clone)]
pub struct DescriptiveStats {
    sorted: Vec<f32>,
}

/// Five-number summary: minimum, Q1, median, Q3, maximum.
///
/// This is the foundation for box plots and outlier detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FiveNumberSummary {
    /// Smallest value
    pub min: f32,
    /// 25th percentile
    pub q1: f32,
    /// 50th percentile
    pub median: f32,
    /// 75th percentile
    pub q3: f32,
    /// Largest value
    pub max: f32,
}

impl FiveNumberSummary {
    /// Interquartile range, `q3 - q1`.
    #[must_use]
    pub fn iqr(&self) -> f32 {
        self.q3 - self.q1
    }
}

impl DescriptiveStats {
    /// Collects and sorts the observed values of `data`.
    #[must_use]
    pub fn new(data: &[f32]) -> Self {
        let mut sorted: Vec<f32> = data.iter().copied().filter(|v| !v.is_nan()).collect();
        sorted.sort_by(f32::total_cmp);
        Self { sorted }
    }

    /// Number of observed values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    /// Returns true if no value was observed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Arithmetic mean, `NaN` when empty.
    #[must_use]
    pub fn mean(&self) -> f32 {
        if self.sorted.is_empty() {
            return f32::NAN;
        }
        let sum: f64 = self.sorted.iter().map(|&v| f64::from(v)).sum();
        (sum / self.sorted.len() as f64) as f32
    }

    /// Quantile by linear interpolation between order statistics (R-7).
    ///
    /// `h = (n - 1) * q`, result `x[floor(h)] + (h - floor(h)) * (x[ceil(h)] - x[floor(h)])`.
    ///
    /// # Errors
    ///
    /// Returns an error if no value was observed or `q` is outside [0, 1].
    pub fn quantile(&self, q: f64) -> Result<f32> {
        if self.sorted.is_empty() {
            return Err(PipelineError::Other(
                "cannot compute quantile of empty sample".into(),
            ));
        }
        if !(0.0..=1.0).contains(&q) {
            return Err(PipelineError::Other(format!(
                "quantile must be in [0, 1], got {q}"
            )));
        }
        Ok(self.interpolate(q))
    }

    /// Several percentiles (0-100) at once.
    ///
    /// ```
    /// use obesity_pipeline::stats::DescriptiveStats;
    ///
    /// let stats = DescriptiveStats::new(&[1.0, 2.0, 3.0, 4.0, 5.0]);
    /// let p = stats.percentiles(&[25.0, 50.0, 75.0]).unwrap();
    /// assert_eq!(p, vec![2.0, 3.0, 4.0]);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if no value was observed or a percentile is outside [0, 100].
    pub fn percentiles(&self, percentiles: &[f64]) -> Result<Vec<f32>> {
        percentiles.iter().map(|&p| self.quantile(p / 100.0)).collect()
    }

    /// Min, quartiles, and max.
    ///
    /// # Errors
    ///
    /// Returns an error if no value was observed.
    pub fn five_number_summary(&self) -> Result<FiveNumberSummary> {
        Ok(FiveNumberSummary {
            min: self.quantile(0.0)?,
            q1: self.quantile(0.25)?,
            median: self.quantile(0.5)?,
            q3: self.quantile(0.75)?,
            max: self.quantile(1.0)?,
        })
    }

    fn interpolate(&self, q: f64) -> f32 {
        let n = self.sorted.len();
        let h = (n - 1) as f64 * q;
        let lo = h.floor() as usize;
        let hi = h.ceil() as usize;
        if lo == hi {
            return self.sorted[lo];
        }
        let fraction = (h - lo as f64) as f32;
        self.sorted[lo] + fraction * (self.sorted[hi] - self.sorted[lo])
    }
}
