//! Obesity category prediction in pure Rust.
//!
//! A fitted pipeline pairs a name-keyed [`preprocessing::FeatureEncoder`]
//! (standardized numerics plus one-hot categoricals with a fixed vocabulary)
//! with a multinomial [`tree::GradientBoostingClassifier`]. It is trained once
//! offline, written to a single checksummed artifact, and loaded read-only
//! for inference.
//!
//! # Quick Start
//!
//! ```
//! use obesity_pipeline::prelude::*;
//! use obesity_pipeline::data::synthetic::bmi_labelled;
//!
//! let dataset = bmi_labelled(140, 7);
//! let spec = PipelineSpec { n_estimators: 50, ..PipelineSpec::default() };
//! let pipeline = FittedPipeline::fit(&dataset, &spec).unwrap();
//!
//! let row = FeatureRow::from_pairs([
//!     ("gender", "Female"), ("age", "23"), ("height", "1.60"), ("weight", "150"),
//! ]);
//! let prediction = pipeline.predict_row(&row).unwrap();
//! assert_eq!(prediction.probabilities.len(), 7);
//! assert!(prediction.category.is_obese());
//! ```
//!
//! # Modules
//!
//! - [`primitives`]: Dense row-major matrix
//! - [`data`]: Patient records, categorical domains, labelled CSV datasets
//! - [`preprocessing`]: Standard scaler and the name-keyed feature encoder
//! - [`tree`]: Regression trees and gradient boosting
//! - [`model_selection`]: Stratified k-fold and stratified holdout splits
//! - [`metrics`]: Accuracy, confusion matrix, classification report
//! - [`pipeline`]: Encoder plus classifier as one fitted unit
//! - [`evaluation`]: Cross-validation and holdout reporting
//! - [`training`]: Evaluate, refit on all rows, export
//! - [`serialization`]: Checksummed binary artifact format
//! - [`loading`]: Lazily loaded, shared read-only artifact handle
//! - [`config`]: Training configuration (JSON plus environment)
//! - [`clinical`]: BMI bands, ideal weight, risk factors, recommendations
//! - [`stats`]: Quantiles and correlation
//! - [`analytics`]: Filtered descriptive statistics over a dataset

pub mod analytics;
pub mod clinical;
pub mod config;
pub mod data;
pub mod error;
pub mod evaluation;
pub mod loading;
pub mod metrics;
pub mod model_selection;
pub mod pipeline;
pub mod prelude;
pub mod preprocessing;
pub mod primitives;
pub mod serialization;
pub mod stats;
pub mod traits;
pub mod training;
pub mod tree;

pub use error::{PipelineError, Result};
pub use pipeline::{FittedPipeline, PipelineSpec, Prediction};
pub use primitives::Matrix;
pub use traits::{Classifier, Transformer};
