//! Labelled training table loaded from CSV.

use super::category::ObesityCategory;
use super::record::{FeatureRow, FeatureValue};
use super::schema::{self, FEATURES};
use crate::error::{PipelineError, Result};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;

/// Rows of raw attributes paired with their obesity category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledDataset {
    rows: Vec<FeatureRow>,
    labels: Vec<ObesityCategory>,
}

impl LabeledDataset {
    /// Creates a dataset from parallel rows and labels.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::DimensionMismatch`] if the lengths differ.
    pub fn new(rows: Vec<FeatureRow>, labels: Vec<ObesityCategory>) -> Result<Self> {
        if rows.len() != labels.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: format!("{} labels", rows.len()),
                actual: format!("{} labels", labels.len()),
            });
        }
        Ok(Self { rows, labels })
    }

    /// Loads a CSV file with a header row.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Io`] if the file cannot be opened, otherwise the
    /// errors of [`LabeledDataset::from_reader`].
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let dataset = Self::from_reader(file)?;
        log::info!(
            "loaded {} labelled rows from {}",
            dataset.len(),
            path.display()
        );
        Ok(dataset)
    }

    /// Reads a CSV stream with a header row.
    ///
    /// Headers are matched case-insensitively against canonical names and
    /// their dataset aliases; extra columns are ignored. Missing numeric
    /// cells become `NaN` and are imputed by the encoder.
    ///
    /// # Errors
    ///
    /// * [`PipelineError::SchemaMismatch`] listing every absent attribute
    /// * [`PipelineError::InvalidLabel`] for a target cell outside the seven categories
    /// * [`PipelineError::Csv`] for malformed CSV
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let available: Vec<String> = headers.iter().map(str::to_string).collect();

        let mut columns = Vec::with_capacity(FEATURES.len());
        let mut missing = Vec::new();
        for spec in &FEATURES {
            match headers.iter().position(|h| spec.matches_header(h)) {
                Some(idx) => columns.push((spec.name, idx)),
                None => missing.push(spec.name.to_string()),
            }
        }
        let target = headers.iter().position(schema::is_target_header);
        if target.is_none() {
            missing.push(schema::TARGET_ALIASES[0].to_string());
        }
        let target = match target {
            Some(idx) if missing.is_empty() => idx,
            _ => return Err(PipelineError::SchemaMismatch { missing, available }),
        };

        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for (i, record) in csv_reader.records().enumerate() {
            let record = record?;
            let raw_label = record.get(target).unwrap_or_default();
            let label = ObesityCategory::parse(raw_label).ok_or_else(|| {
                PipelineError::InvalidLabel {
                    row: i + 1,
                    value: raw_label.to_string(),
                }
            })?;
            let mut row = FeatureRow::new();
            for &(name, idx) in &columns {
                row.set_raw(name, record.get(idx).unwrap_or_default());
            }
            rows.push(row);
            labels.push(label);
        }

        Ok(Self { rows, labels })
    }

    /// Writes the table as CSV with the public dataset's headers.
    ///
    /// Categorical cells hold canonical tokens and missing numerics are left
    /// empty, so [`LabeledDataset::from_reader`] reads the output back as is.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Csv`] or [`PipelineError::Io`] on write failure.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        let mut header: Vec<&str> = FEATURES
            .iter()
            .map(|spec| spec.header_aliases.first().copied().unwrap_or(spec.name))
            .collect();
        header.push(schema::TARGET_ALIASES[1]);
        csv_writer.write_record(&header)?;

        for (row, label) in self.iter() {
            let mut record: Vec<String> = Vec::with_capacity(header.len());
            for spec in &FEATURES {
                let cell = match row.get(spec.name) {
                    Some(FeatureValue::Number(v)) if v.is_finite() => v.to_string(),
                    Some(FeatureValue::Category(token)) => token.clone(),
                    _ => String::new(),
                };
                record.push(cell);
            }
            record.push(label.dataset_label().to_string());
            csv_writer.write_record(&record)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Writes the table to a CSV file.
    ///
    /// # Errors
    ///
    /// See [`LabeledDataset::to_writer`].
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())?;
        self.to_writer(std::io::BufWriter::new(file))
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the dataset has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Attribute rows.
    #[must_use]
    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    /// Labels, parallel to [`LabeledDataset::rows`].
    #[must_use]
    pub fn labels(&self) -> &[ObesityCategory] {
        &self.labels
    }

    /// Labels as class indices.
    #[must_use]
    pub fn label_indices(&self) -> Vec<usize> {
        self.labels.iter().map(|c| c.index()).collect()
    }

    /// Iterates `(row, label)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&FeatureRow, ObesityCategory)> {
        self.rows.iter().zip(self.labels.iter().copied())
    }

    /// Copies the rows at `indices`, in that order.
    #[must_use]
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }

    /// Row count per category, in severity order; absent categories are omitted.
    #[must_use]
    pub fn class_counts(&self) -> BTreeMap<ObesityCategory, usize> {
        let mut counts = BTreeMap::new();
        for &label in &self.labels {
            *counts.entry(label).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Gender,Age,Height,Weight,family_history_with_overweight,FAVC,FCVC,NCP,CAEC,SMOKE,CH2O,SCC,FAF,TUE,CALC,MTRANS,NObeyesdad";

    fn csv_with(rows: &[&str]) -> String {
        let mut text = String::from(HEADER);
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        text
    }

    #[test]
    fn test_reads_dataset_spelling() {
        let text = csv_with(&[
            "Female,21,1.62,64,yes,no,2,3,Sometimes,no,2,no,0,1,no,Public_Transportation,Normal_Weight",
            "Male,23,1.80,77,yes,no,2,3,Sometimes,no,2,no,2,1,Frequently,Walking,Normal_Weight",
            "Male,27,1.80,87,no,no,3,3,Sometimes,no,2,no,2,0,Frequently,Walking,Overweight_Level_I",
        ]);
        let ds = LabeledDataset::from_reader(text.as_bytes()).expect("valid csv");
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.labels()[2], ObesityCategory::OverweightI);
        let row = &ds.rows()[0];
        assert_eq!(row.category("transport"), Some("public_transit"));
        assert_eq!(row.category("calc"), Some("never"));
        assert_eq!(row.category("family_history"), Some("yes"));
        assert!((row.number("height") - 1.62).abs() < 1e-6);
        assert_eq!(ds.label_indices(), vec![1, 1, 2]);
    }

    #[test]
    fn test_missing_columns_all_reported() {
        let text = "Gender,Age,Weight\nMale,20,70\n";
        let err = LabeledDataset::from_reader(text.as_bytes()).unwrap_err();
        match err {
            PipelineError::SchemaMismatch { missing, available } => {
                assert!(missing.contains(&"height".to_string()));
                assert!(missing.contains(&"transport".to_string()));
                assert!(missing.contains(&"Obesity".to_string()));
                assert_eq!(missing.len(), 14);
                assert_eq!(available, vec!["Gender", "Age", "Weight"]);
            }
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_label_reports_row() {
        let text = csv_with(&[
            "Female,21,1.62,64,yes,no,2,3,Sometimes,no,2,no,0,1,no,Walking,Normal_Weight",
            "Female,21,1.62,64,yes,no,2,3,Sometimes,no,2,no,0,1,no,Walking,Chunky",
        ]);
        let err = LabeledDataset::from_reader(text.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidLabel { row: 2, ref value } if value == "Chunky"
        ));
    }

    #[test]
    fn test_empty_numeric_cell_is_missing() {
        let text = csv_with(&[
            "Female,,1.62,64,yes,no,2,3,Sometimes,no,2,no,0,1,no,Walking,Normal_Weight",
        ]);
        let ds = LabeledDataset::from_reader(text.as_bytes()).expect("valid csv");
        assert!(ds.rows()[0].number("age").is_nan());
    }

    #[test]
    fn test_subset_and_counts() {
        let text = csv_with(&[
            "Female,21,1.62,64,yes,no,2,3,Sometimes,no,2,no,0,1,no,Walking,Normal_Weight",
            "Male,40,1.70,120,yes,yes,2,3,Sometimes,no,2,no,0,1,no,Automobile,Obesity_Type_II",
            "Male,41,1.71,121,yes,yes,2,3,Sometimes,no,2,no,0,1,no,Automobile,Obesity_Type_II",
        ]);
        let ds = LabeledDataset::from_reader(text.as_bytes()).expect("valid csv");
        let counts = ds.class_counts();
        assert_eq!(counts[&ObesityCategory::ObesityII], 2);
        assert_eq!(counts.len(), 2);
        let sub = ds.subset(&[2, 0]);
        assert_eq!(sub.labels(), &[ObesityCategory::ObesityII, ObesityCategory::NormalWeight]);
    }

    #[test]
    fn test_new_rejects_length_mismatch() {
        assert!(LabeledDataset::new(vec![FeatureRow::new()], vec![]).is_err());
    }

    #[test]
    fn test_written_csv_reads_back() {
        let text = csv_with(&[
            "Female,,1.62,64,yes,no,2,3,Sometimes,no,2,no,0,1,no,Bike,Normal_Weight",
            "Male,40,1.70,120,yes,yes,2,3,Always,no,2,no,0,1,no,Automobile,Obesity_Type_II",
        ]);
        let ds = LabeledDataset::from_reader(text.as_bytes()).expect("valid csv");
        let mut out = Vec::new();
        ds.to_writer(&mut out).expect("write to memory");
        let written = String::from_utf8(out).expect("utf8");
        assert!(written.starts_with("Gender,Age,Height,Weight,family_history_with_overweight"));
        assert!(written.contains("Obesity_Type_II"));

        let back = LabeledDataset::from_reader(written.as_bytes()).expect("valid csv");
        assert_eq!(back.labels(), ds.labels());
        assert!(back.rows()[0].number("age").is_nan());
        assert_eq!(back.rows()[0].category("transport"), Some("bicycle"));
        assert_eq!(back.rows()[1], ds.rows()[1]);
    }
}
