//! Name-keyed encoding of patient rows into fixed-width feature vectors.

use super::StandardScaler;
use crate::data::record::FeatureRow;
use crate::data::schema::{CATEGORICAL_FEATURES, NUMERIC_FEATURES};
use crate::error::{PipelineError, Result};
use crate::primitives::Matrix;
use crate::traits::Transformer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What the encoder had to absorb for one row.
///
/// None of these are errors: missing numerics are imputed with the training
/// mean and unknown or missing categories produce an all-zero block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingNotes {
    /// Numeric attributes that were absent or unparsable.
    pub missing_numeric: Vec<String>,
    /// Categorical attributes that were absent.
    pub missing_categories: Vec<String>,
    /// `(attribute, value)` pairs outside the training vocabulary.
    pub unknown_categories: Vec<(String, String)>,
}

impl EncodingNotes {
    /// Returns true if every attribute was present and known.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.missing_numeric.is_empty()
            && self.missing_categories.is_empty()
            && self.unknown_categories.is_empty()
    }

    /// Emits one warning per absorbed attribute.
    pub fn log_warnings(&self) {
        for name in &self.missing_numeric {
            log::warn!("numeric field '{name}' missing or malformed; imputed with training mean");
        }
        for name in &self.missing_categories {
            log::warn!("categorical field '{name}' missing; encoded as all-zero block");
        }
        for (name, value) in &self.unknown_categories {
            log::warn!("unknown category {value:?} for '{name}'; encoded as all-zero block");
        }
    }
}

/// Observed vocabulary of one categorical attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CategoryBlock {
    name: String,
    /// Sorted; the position is the column offset within the block.
    vocabulary: Vec<String>,
}

/// One-hot encoder with an explicit vocabulary table.
///
/// Each attribute maps to the sorted set of values seen during `fit`; a value
/// outside that set encodes as an all-zero block and never adds a column.
///
/// ```
/// use obesity_pipeline::data::FeatureRow;
/// use obesity_pipeline::preprocessing::OneHotEncoder;
///
/// let rows = vec![
///     FeatureRow::from_pairs([("transport", "Walking")]),
///     FeatureRow::from_pairs([("transport", "Automobile")]),
/// ];
/// let mut encoder = OneHotEncoder::new(&["transport"]);
/// encoder.fit(&rows).unwrap();
/// assert_eq!(encoder.n_columns(), 2);
///
/// let mut out = Vec::new();
/// let unknown = FeatureRow::from_pairs([("transport", "Hoverboard")]);
/// encoder.encode_into(&unknown, &mut out, &mut Default::default());
/// assert_eq!(out, vec![0.0, 0.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    blocks: Vec<CategoryBlock>,
    fitted: bool,
}

impl OneHotEncoder {
    /// Creates an unfitted encoder over the given attributes, in block order.
    #[must_use]
    pub fn new(attributes: &[&str]) -> Self {
        Self {
            blocks: attributes
                .iter()
                .map(|name| CategoryBlock {
                    name: (*name).to_string(),
                    vocabulary: Vec::new(),
                })
                .collect(),
            fitted: false,
        }
    }

    /// Learns each attribute's vocabulary from `rows`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyDataset`] if `rows` is empty.
    pub fn fit(&mut self, rows: &[FeatureRow]) -> Result<()> {
        if rows.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }
        for block in &mut self.blocks {
            let observed: BTreeSet<&str> = rows
                .iter()
                .filter_map(|row| row.category(&block.name))
                .collect();
            if observed.is_empty() {
                log::warn!("categorical attribute '{}' never observed", block.name);
            }
            block.vocabulary = observed.into_iter().map(str::to_string).collect();
        }
        self.fitted = true;
        Ok(())
    }

    /// Returns true once `fit` has run.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    /// Total number of indicator columns.
    #[must_use]
    pub fn n_columns(&self) -> usize {
        self.blocks.iter().map(|b| b.vocabulary.len()).sum()
    }

    /// Attribute names, in block order.
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().map(|b| b.name.as_str())
    }

    /// Sorted training vocabulary of `attribute`.
    #[must_use]
    pub fn vocabulary(&self, attribute: &str) -> Option<&[String]> {
        self.blocks
            .iter()
            .find(|b| b.name == attribute)
            .map(|b| b.vocabulary.as_slice())
    }

    /// Column names of the form `attribute=value`.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.blocks
            .iter()
            .flat_map(|b| b.vocabulary.iter().map(move |v| format!("{}={v}", b.name)))
            .collect()
    }

    /// Appends this row's indicator blocks to `out`, recording anything absorbed.
    pub fn encode_into(&self, row: &FeatureRow, out: &mut Vec<f32>, notes: &mut EncodingNotes) {
        for block in &self.blocks {
            let start = out.len();
            out.resize(start + block.vocabulary.len(), 0.0);
            match row.category(&block.name) {
                Some(value) => match block
                    .vocabulary
                    .binary_search_by(|v| v.as_str().cmp(value))
                {
                    Ok(pos) => out[start + pos] = 1.0,
                    Err(_) => notes
                        .unknown_categories
                        .push((block.name.clone(), value.to_string())),
                },
                None => notes.missing_categories.push(block.name.clone()),
            }
        }
    }
}

/// Full row encoder: standardized numeric block followed by one-hot blocks.
///
/// Columns are keyed by attribute name, so the order in which a row's
/// fields were supplied never affects the output vector.
///
/// ```
/// use obesity_pipeline::data::FeatureRow;
/// use obesity_pipeline::preprocessing::FeatureEncoder;
///
/// let rows = vec![
///     FeatureRow::from_pairs([("age", "20"), ("gender", "Male")]),
///     FeatureRow::from_pairs([("age", "30"), ("gender", "Female")]),
/// ];
/// let mut encoder = FeatureEncoder::with_columns(&["age"], &["gender"]);
/// encoder.fit(&rows).unwrap();
/// assert_eq!(encoder.dimension(), 3);
///
/// let (vector, notes) = encoder.encode(&rows[1]).unwrap();
/// assert!(notes.is_clean());
/// assert_eq!(vector, vec![1.0, 1.0, 0.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureEncoder {
    numeric: Vec<String>,
    scaler: StandardScaler,
    categorical: OneHotEncoder,
}

impl Default for FeatureEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureEncoder {
    /// Encoder over the sixteen patient attributes.
    #[must_use]
    pub fn new() -> Self {
        Self::with_columns(&NUMERIC_FEATURES, &CATEGORICAL_FEATURES)
    }

    /// Encoder over an explicit column selection.
    #[must_use]
    pub fn with_columns(numeric: &[&str], categorical: &[&str]) -> Self {
        Self {
            numeric: numeric.iter().map(|s| (*s).to_string()).collect(),
            scaler: StandardScaler::new(),
            categorical: OneHotEncoder::new(categorical),
        }
    }

    /// Learns numeric statistics and categorical vocabularies.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyDataset`] if `rows` is empty.
    pub fn fit(&mut self, rows: &[FeatureRow]) -> Result<()> {
        let raw = self.numeric_matrix(rows)?;
        self.scaler.fit(&raw)?;
        self.categorical.fit(rows)?;
        log::debug!(
            "encoder fitted: {} numeric + {} indicator columns",
            self.numeric.len(),
            self.categorical.n_columns()
        );
        Ok(())
    }

    /// Fits, then encodes the same rows.
    ///
    /// # Errors
    ///
    /// Propagates [`FeatureEncoder::fit`] errors.
    pub fn fit_transform(&mut self, rows: &[FeatureRow]) -> Result<Matrix<f32>> {
        self.fit(rows)?;
        self.transform(rows)
    }

    /// Returns true once `fit` has run.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.scaler.is_fitted() && self.categorical.is_fitted()
    }

    /// Width of every encoded vector.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.numeric.len() + self.categorical.n_columns()
    }

    /// Numeric attribute names, in column order.
    #[must_use]
    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric
    }

    /// Fitted numeric scaler.
    #[must_use]
    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    /// Fitted categorical vocabulary table.
    #[must_use]
    pub fn categorical(&self) -> &OneHotEncoder {
        &self.categorical
    }

    /// Names of all encoded columns.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        let mut names = self.numeric.clone();
        names.extend(self.categorical.column_names());
        names
    }

    /// Encodes one row.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NotFitted`] before `fit`.
    pub fn encode(&self, row: &FeatureRow) -> Result<(Vec<f32>, EncodingNotes)> {
        if !self.is_fitted() {
            return Err(PipelineError::NotFitted("FeatureEncoder"));
        }
        let mut notes = EncodingNotes::default();
        let mut out = Vec::with_capacity(self.dimension());
        for name in &self.numeric {
            let value = row.number(name);
            if value.is_nan() {
                notes.missing_numeric.push(name.clone());
            }
            out.push(value);
        }
        self.scaler.transform_row(&mut out)?;
        self.categorical.encode_into(row, &mut out, &mut notes);
        Ok((out, notes))
    }

    /// Encodes a batch into a row-major matrix.
    ///
    /// Absorbed values are summarized in a single log line.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NotFitted`] before `fit`.
    pub fn transform(&self, rows: &[FeatureRow]) -> Result<Matrix<f32>> {
        let dim = self.dimension();
        let mut data = Vec::with_capacity(rows.len() * dim);
        let mut degraded = 0usize;
        for row in rows {
            let (vector, notes) = self.encode(row)?;
            if !notes.is_clean() {
                degraded += 1;
            }
            data.extend(vector);
        }
        if degraded > 0 {
            log::debug!("{degraded} of {} rows had missing or unknown values", rows.len());
        }
        Ok(Matrix::from_vec(rows.len(), dim, data)?)
    }

    fn numeric_matrix(&self, rows: &[FeatureRow]) -> Result<Matrix<f32>> {
        if rows.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }
        let data: Vec<f32> = rows
            .iter()
            .flat_map(|row| self.numeric.iter().map(move |name| row.number(name)))
            .collect();
        Ok(Matrix::from_vec(rows.len(), self.numeric.len(), data)?)
    }
}
