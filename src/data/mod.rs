//! Input data model: schema, categorical domains, records, and the
//! labelled training table.
//!
//! Raw text from CSV files, JSON requests, or CLI flags is normalized here
//! into canonical attribute names and tokens. Nothing downstream sees
//! dataset spellings.

pub mod category;
pub mod dataset;
pub mod record;
pub mod schema;
pub mod synthetic;

pub use category::{CategoricalValue, Frequency, Gender, ObesityCategory, Transport, YesNo};
pub use dataset::LabeledDataset;
pub use record::{FeatureRow, FeatureValue, PatientRecord};
