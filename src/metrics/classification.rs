//! Classification metrics for evaluating classifier performance.
//!
//! Provides accuracy, per-class precision/recall/F1 and the confusion
//! matrix for multi-class classification over class indices.

use crate::primitives::Matrix;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Compute classification accuracy.
///
/// accuracy = `correct_predictions` / `total_predictions`
///
/// Returns 0.0 for empty input.
///
/// # Panics
///
/// Panics if the slices have different lengths.
///
/// # Examples
///
/// ```
/// use obesity_pipeline::metrics::accuracy;
///
/// let y_true = vec![0, 1, 2, 0, 1, 2];
/// let y_pred = vec![0, 2, 1, 0, 0, 1];
/// let acc = accuracy(&y_pred, &y_true);
/// assert!((acc - 0.333333).abs() < 0.001);
/// ```
#[must_use]
pub fn accuracy(y_pred: &[usize], y_true: &[usize]) -> f32 {
    assert_eq!(y_pred.len(), y_true.len(), "Vectors must have same length");
    if y_true.is_empty() {
        return 0.0;
    }

    let correct = y_pred
        .iter()
        .zip(y_true.iter())
        .filter(|(p, t)| p == t)
        .count();

    correct as f32 / y_true.len() as f32
}

/// Counts of true (rows) against predicted (columns) class indices.
///
/// # Examples
///
/// ```
/// use obesity_pipeline::metrics::ConfusionMatrix;
///
/// let y_true = vec![0, 0, 1, 1, 2, 2];
/// let y_pred = vec![0, 1, 1, 1, 2, 0];
/// let cm = ConfusionMatrix::new(&y_pred, &y_true, 3);
/// assert_eq!(cm.get(0, 1), 1);
/// assert_eq!(cm.get(1, 1), 2);
/// assert_eq!(cm.total(), 6);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    counts: Matrix<usize>,
}

impl ConfusionMatrix {
    /// Tallies predictions over `n_classes` classes; indices at or above
    /// `n_classes` widen the matrix.
    ///
    /// # Panics
    ///
    /// Panics if the slices have different lengths.
    #[must_use]
    pub fn new(y_pred: &[usize], y_true: &[usize], n_classes: usize) -> Self {
        assert_eq!(y_pred.len(), y_true.len(), "Vectors must have same length");
        let n_classes = y_true
            .iter()
            .chain(y_pred.iter())
            .map(|&c| c + 1)
            .max()
            .unwrap_or(0)
            .max(n_classes);

        let mut counts = Matrix::zeros(n_classes, n_classes);
        for (&true_label, &pred_label) in y_true.iter().zip(y_pred.iter()) {
            let current = counts.get(true_label, pred_label);
            counts.set(true_label, pred_label, current + 1);
        }
        Self { counts }
    }

    /// Number of classes (rows and columns).
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.counts.n_rows()
    }

    /// Count of samples with true class `actual` predicted as `predicted`.
    #[must_use]
    pub fn get(&self, actual: usize, predicted: usize) -> usize {
        self.counts.get(actual, predicted)
    }

    /// Total number of samples.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.as_slice().iter().sum()
    }

    /// Underlying count matrix.
    #[must_use]
    pub fn as_matrix(&self) -> &Matrix<usize> {
        &self.counts
    }

    /// Metrics for class `k`, with zero-division results set to 0.
    #[must_use]
    pub fn class_metrics(&self, k: usize) -> ClassMetrics {
        let n = self.n_classes();
        let tp = self.get(k, k);
        let support: usize = (0..n).map(|j| self.get(k, j)).sum();
        let predicted: usize = (0..n).map(|i| self.get(i, k)).sum();
        let precision = ratio(tp, predicted);
        let recall = ratio(tp, support);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        ClassMetrics {
            precision,
            recall,
            f1,
            support,
        }
    }

    /// Renders the matrix with `labels` naming the rows; columns are
    /// numbered in the same order.
    #[must_use]
    pub fn render(&self, labels: &[&str]) -> String {
        let n = self.n_classes();
        let name = |k: usize| labels.get(k).copied().unwrap_or("?");
        let label_width = (0..n).map(|k| name(k).len() + 5).max().unwrap_or(0);
        let cell = self
            .counts
            .as_slice()
            .iter()
            .map(|c| c.to_string().len())
            .max()
            .unwrap_or(1)
            .max(3);

        let mut out = format!("{:label_width$}", "true \\ pred");
        for k in 0..n {
            out.push_str(&format!(" {:>cell$}", format!("[{k}]")));
        }
        out.push('\n');
        for i in 0..n {
            out.push_str(&format!("{:label_width$}", format!("[{i}] {}", name(i))));
            for j in 0..n {
                out.push_str(&format!(" {:>cell$}", self.get(i, j)));
            }
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<String> = (0..self.n_classes()).map(|k| k.to_string()).collect();
        let refs: Vec<&str> = labels.iter().map(String::as_str).collect();
        f.write_str(&self.render(&refs))
    }
}

fn ratio(num: usize, den: usize) -> f32 {
    if den == 0 {
        0.0
    } else {
        num as f32 / den as f32
    }
}

/// Precision, recall, F1 and support of one class (or an average).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    /// TP / (TP + FP)
    pub precision: f32,
    /// TP / (TP + FN)
    pub recall: f32,
    /// Harmonic mean of precision and recall
    pub f1: f32,
    /// Number of true samples
    pub support: usize,
}

/// Per-class metrics plus accuracy and macro/weighted averages.
///
/// Classes with neither support nor predictions are left out, as are
/// they from the averages.
///
/// ```
/// use obesity_pipeline::metrics::ClassificationReport;
///
/// let labels = ["low", "mid", "high"];
/// let y_true = vec![0, 0, 1, 1];
/// let y_pred = vec![0, 1, 1, 1];
/// let report = ClassificationReport::new(&y_pred, &y_true, &labels);
/// assert_eq!(report.rows().len(), 2);
/// assert!((report.accuracy() - 0.75).abs() < 1e-6);
/// assert!((report.rows()[1].1.precision - 2.0 / 3.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    rows: Vec<(String, ClassMetrics)>,
    accuracy: f32,
    macro_avg: ClassMetrics,
    weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    /// Builds the report; `labels[k]` names class index `k`.
    ///
    /// # Panics
    ///
    /// Panics if the slices have different lengths.
    #[must_use]
    pub fn new(y_pred: &[usize], y_true: &[usize], labels: &[&str]) -> Self {
        let cm = ConfusionMatrix::new(y_pred, y_true, labels.len());
        Self::from_confusion(&cm, labels)
    }

    /// Builds the report from an existing confusion matrix.
    #[must_use]
    pub fn from_confusion(cm: &ConfusionMatrix, labels: &[&str]) -> Self {
        let n = cm.n_classes();
        let present = (0..n).filter(|&k| {
            let support: usize = (0..n).map(|j| cm.get(k, j)).sum();
            let predicted: usize = (0..n).map(|i| cm.get(i, k)).sum();
            support + predicted > 0
        });
        let rows: Vec<(String, ClassMetrics)> = present
            .map(|k| {
                let name = labels.get(k).map_or_else(|| k.to_string(), |s| (*s).to_string());
                (name, cm.class_metrics(k))
            })
            .collect();

        let total = cm.total();
        let correct: usize = (0..n).map(|k| cm.get(k, k)).sum();
        let accuracy = ratio(correct, total);

        let count = rows.len().max(1) as f32;
        let macro_avg = ClassMetrics {
            precision: rows.iter().map(|(_, m)| m.precision).sum::<f32>() / count,
            recall: rows.iter().map(|(_, m)| m.recall).sum::<f32>() / count,
            f1: rows.iter().map(|(_, m)| m.f1).sum::<f32>() / count,
            support: total,
        };
        let weight = |m: &ClassMetrics, v: f32| {
            if total == 0 {
                0.0
            } else {
                v * m.support as f32 / total as f32
            }
        };
        let weighted_avg = ClassMetrics {
            precision: rows.iter().map(|(_, m)| weight(m, m.precision)).sum(),
            recall: rows.iter().map(|(_, m)| weight(m, m.recall)).sum(),
            f1: rows.iter().map(|(_, m)| weight(m, m.f1)).sum(),
            support: total,
        };

        Self {
            rows,
            accuracy,
            macro_avg,
            weighted_avg,
        }
    }

    /// `(label, metrics)` per reported class, in class order.
    #[must_use]
    pub fn rows(&self) -> &[(String, ClassMetrics)] {
        &self.rows
    }

    /// Overall accuracy.
    #[must_use]
    pub fn accuracy(&self) -> f32 {
        self.accuracy
    }

    /// Unweighted mean over reported classes.
    #[must_use]
    pub fn macro_avg(&self) -> ClassMetrics {
        self.macro_avg
    }

    /// Support-weighted mean over reported classes.
    #[must_use]
    pub fn weighted_avg(&self) -> ClassMetrics {
        self.weighted_avg
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .rows
            .iter()
            .map(|(name, _)| name.len())
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(0);
        let line = |f: &mut fmt::Formatter<'_>, name: &str, m: &ClassMetrics| {
            writeln!(
                f,
                "{name:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                m.precision, m.recall, m.f1, m.support
            )
        };

        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for (name, m) in &self.rows {
            line(f, name, m)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        line(f, "macro avg", &self.macro_avg)?;
        line(f, "weighted avg", &self.weighted_avg)
    }
}
