//! Evaluation metrics for the classifier.
//!
//! Accuracy, per-class precision/recall/F1 with macro and weighted
//! averages, and the confusion matrix.

pub mod classification;

pub use classification::{
    accuracy, ClassMetrics, ClassificationReport, ConfusionMatrix,
};
