//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use obesity_pipeline::prelude::*;
//!
//! let x = Matrix::from_vec(4, 1, vec![1.0, 2.0, 10.0, 11.0]).unwrap();
//! let mut model = GradientBoostingClassifier::new()
//!     .with_n_estimators(10)
//!     .with_n_classes(2);
//! model.fit(&x, &[0, 0, 1, 1]).unwrap();
//! assert_eq!(model.predict(&x).unwrap(), vec![0, 0, 1, 1]);
//! ```

pub use crate::clinical::ClinicalSummary;
pub use crate::data::{FeatureRow, LabeledDataset, ObesityCategory, PatientRecord};
pub use crate::error::{PipelineError, Result};
pub use crate::loading::ArtifactHandle;
pub use crate::metrics::{accuracy, ClassificationReport, ConfusionMatrix};
pub use crate::pipeline::{FittedPipeline, PipelineSpec, Prediction};
pub use crate::preprocessing::{FeatureEncoder, StandardScaler};
pub use crate::primitives::Matrix;
pub use crate::traits::{Classifier, Transformer};
pub use crate::tree::GradientBoostingClassifier;
