//! Error types for pipeline operations.
//!
//! Unknown categorical values and malformed numerics are deliberately absent
//! from this enum: they are absorbed by the encoder (see
//! [`crate::preprocessing`]) and only ever surface as log warnings.

use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Main error type for training, evaluation, and inference.
///
/// # Examples
///
/// ```
/// use obesity_pipeline::error::PipelineError;
///
/// let err = PipelineError::DimensionMismatch {
///     expected: "31 features".to_string(),
///     actual: "30 features".to_string(),
/// };
/// assert!(err.to_string().contains("dimension mismatch"));
/// ```
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The serialized pipeline could not be located, read, or decoded.
    ///
    /// Fatal to any inference consumer.
    #[error("model artifact unavailable at {path}: {reason}")]
    MissingArtifact {
        /// Path that was tried
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// Artifact bytes failed structural validation.
    #[error("corrupt model artifact: {0}")]
    CorruptArtifact(String),

    /// Dataset is missing one or more required columns.
    #[error("dataset schema mismatch: missing columns {missing:?} (available: {available:?})")]
    SchemaMismatch {
        /// Columns that could not be found
        missing: Vec<String>,
        /// Header as read from the file
        available: Vec<String>,
    },

    /// A target cell did not name one of the seven categories.
    #[error("unrecognized obesity label {value:?} at data row {row}")]
    InvalidLabel {
        /// 1-based data row (header excluded)
        row: usize,
        /// Raw cell contents
        value: String,
    },

    /// A typed patient record failed field validation.
    #[error("invalid patient record: field '{field}' {reason}")]
    InvalidRecord {
        /// Canonical field name
        field: String,
        /// What is wrong with it
        reason: String,
    },

    /// Matrix or vector dimensions don't match for the operation.
    #[error("Matrix dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions description
        expected: String,
        /// Actual dimensions found
        actual: String,
    },

    /// Invalid hyperparameter value provided.
    #[error("Invalid hyperparameter: {param} = {value}, expected {constraint}")]
    InvalidHyperparameter {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// A transformer or estimator was used before `fit`.
    #[error("{0} is not fitted")]
    NotFitted(&'static str),

    /// No rows to fit on.
    #[error("cannot fit on an empty dataset")]
    EmptyDataset,

    /// CSV reader error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error (file not found, permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (config or inference request) error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic error with string message.
    #[error("{0}")]
    Other(String),
}

impl PipelineError {
    /// Exit code used by the `obesity` binary for this error.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::MissingArtifact { .. } | Self::CorruptArtifact(_) => ExitCode::from(3),
            Self::SchemaMismatch { .. } | Self::InvalidLabel { .. } | Self::Csv(_) => {
                ExitCode::from(4)
            }
            Self::InvalidHyperparameter { .. } => ExitCode::from(5),
            Self::InvalidRecord { .. } => ExitCode::from(6),
            Self::Io(_) => ExitCode::from(7),
            Self::Json(_) => ExitCode::from(8),
            _ => ExitCode::from(1),
        }
    }
}

impl From<bincode::Error> for PipelineError {
    fn from(err: bincode::Error) -> Self {
        PipelineError::Serialization(err.to_string())
    }
}

impl From<&str> for PipelineError {
    fn from(msg: &str) -> Self {
        PipelineError::Other(msg.to_string())
    }
}

impl From<String> for PipelineError {
    fn from(msg: String) -> Self {
        PipelineError::Other(msg)
    }
}
