//! Core compute primitives.
//!
//! Encoded feature batches are dense row-major [`Matrix<f32>`] values; the
//! confusion matrix reuses the same container as `Matrix<usize>`.

mod matrix;

pub use matrix::Matrix;
