//! The fitted preprocessing-plus-classifier pipeline.
//!
//! A [`FittedPipeline`] owns everything inference needs: the frozen feature
//! encoder, the boosted ensemble, and the class order of its outputs. It is
//! immutable once built; [`FittedPipeline::save`] and
//! [`FittedPipeline::load`] move it through the artifact container in
//! [`crate::serialization`].

use crate::data::{FeatureRow, LabeledDataset, ObesityCategory, PatientRecord};
use crate::error::{PipelineError, Result};
use crate::evaluation::EvaluationSummary;
use crate::preprocessing::{EncodingNotes, FeatureEncoder};
use crate::primitives::Matrix;
use crate::serialization;
use crate::traits::Classifier;
use crate::tree::{argmax, GradientBoostingClassifier};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Booster hyperparameters shared by evaluation and the shipped fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSpec {
    /// Boosting stages
    pub n_estimators: usize,
    /// Shrinkage applied to every tree
    pub learning_rate: f32,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Minimum rows to split a node
    pub min_samples_split: usize,
    /// Minimum rows per leaf
    pub min_samples_leaf: usize,
    /// Fraction of rows drawn per stage
    pub subsample: f32,
    /// Seed for row subsampling
    pub random_state: u64,
}

impl Default for PipelineSpec {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_split: 2,
            min_samples_leaf: 1,
            subsample: 1.0,
            random_state: 42,
        }
    }
}

impl PipelineSpec {
    /// Unfitted classifier configured from this spec, always seven classes wide.
    #[must_use]
    pub fn classifier(&self) -> GradientBoostingClassifier {
        GradientBoostingClassifier::new()
            .with_n_estimators(self.n_estimators)
            .with_learning_rate(self.learning_rate)
            .with_max_depth(self.max_depth)
            .with_min_samples_split(self.min_samples_split)
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_subsample(self.subsample)
            .with_random_state(self.random_state)
            .with_n_classes(ObesityCategory::COUNT)
    }

    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidHyperparameter`] for the first bad value.
    pub fn validate(&self) -> Result<()> {
        self.classifier().validate()
    }
}

/// Provenance stored alongside the fitted state.
///
/// Contains no timestamps or host details, so two identical fits serialize
/// to identical bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineMetadata {
    /// Version of this crate that produced the artifact
    pub crate_version: String,
    /// Hyperparameters of the shipped fit
    pub spec: PipelineSpec,
    /// Rows the shipped fit was trained on
    pub n_training_rows: usize,
    /// Training rows per class, in class order
    pub class_counts: Vec<usize>,
    /// Evaluation run before the final refit, if one was made
    pub evaluation: Option<EvaluationSummary>,
}

/// Result of one inference call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Highest-probability class
    pub category: ObesityCategory,
    /// One probability per class, in [`ObesityCategory::ALL`] order
    pub probabilities: Vec<f32>,
    /// Values the encoder had to absorb
    pub notes: EncodingNotes,
}

impl Prediction {
    /// Probability of the predicted class.
    #[must_use]
    pub fn confidence(&self) -> f32 {
        self.probability(self.category)
    }

    /// Probability assigned to `category`.
    #[must_use]
    pub fn probability(&self, category: ObesityCategory) -> f32 {
        self.probabilities
            .get(category.index())
            .copied()
            .unwrap_or(0.0)
    }

    /// `(category, probability)` pairs, most probable first.
    ///
    /// Equal probabilities keep severity order.
    #[must_use]
    pub fn ranked(&self) -> Vec<(ObesityCategory, f32)> {
        let mut ranked: Vec<(ObesityCategory, f32)> = ObesityCategory::ALL
            .iter()
            .map(|&c| (c, self.probability(c)))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}

/// Frozen encoder plus fitted classifier.
///
/// # Example
///
/// ```no_run
/// use obesity_pipeline::data::FeatureRow;
/// use obesity_pipeline::pipeline::FittedPipeline;
///
/// let pipeline = FittedPipeline::load("obesity_pipeline.obp").unwrap();
/// let row = FeatureRow::from_pairs([("weight", "150"), ("height", "1.60")]);
/// let prediction = pipeline.predict_row(&row).unwrap();
/// println!("{} ({:.1}%)", prediction.category, prediction.confidence() * 100.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPipeline {
    encoder: FeatureEncoder,
    classifier: GradientBoostingClassifier,
    classes: Vec<ObesityCategory>,
    metadata: PipelineMetadata,
}

impl FittedPipeline {
    /// Fits the encoder and classifier on every row of `dataset`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyDataset`] for an empty dataset,
    /// [`PipelineError::InvalidHyperparameter`] for a bad spec, or any
    /// classifier fit error.
    pub fn fit(dataset: &LabeledDataset, spec: &PipelineSpec) -> Result<Self> {
        if dataset.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }
        spec.validate()?;

        let mut encoder = FeatureEncoder::new();
        let x = encoder.fit_transform(dataset.rows())?;
        let y = dataset.label_indices();

        let mut classifier = spec.classifier();
        classifier.fit(&x, &y)?;

        let counts = dataset.class_counts();
        let class_counts = ObesityCategory::ALL
            .iter()
            .map(|c| counts.get(c).copied().unwrap_or(0))
            .collect();

        log::debug!(
            "fitted pipeline on {} rows x {} encoded columns",
            dataset.len(),
            encoder.dimension()
        );

        Ok(Self {
            encoder,
            classifier,
            classes: ObesityCategory::ALL.to_vec(),
            metadata: PipelineMetadata {
                crate_version: env!("CARGO_PKG_VERSION").to_string(),
                spec: spec.clone(),
                n_training_rows: dataset.len(),
                class_counts,
                evaluation: None,
            },
        })
    }

    /// Attaches the evaluation that preceded this fit.
    #[must_use]
    pub fn with_evaluation(mut self, evaluation: EvaluationSummary) -> Self {
        self.metadata.evaluation = Some(evaluation);
        self
    }

    /// Frozen feature encoder.
    #[must_use]
    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    /// Fitted ensemble.
    #[must_use]
    pub fn classifier(&self) -> &GradientBoostingClassifier {
        &self.classifier
    }

    /// Output class order.
    #[must_use]
    pub fn classes(&self) -> &[ObesityCategory] {
        &self.classes
    }

    /// Provenance and recorded evaluation.
    #[must_use]
    pub fn metadata(&self) -> &PipelineMetadata {
        &self.metadata
    }

    /// Encodes one row with the frozen statistics and vocabularies.
    ///
    /// # Errors
    ///
    /// Returns an error only if the encoder is unfitted.
    pub fn encode(&self, row: &FeatureRow) -> Result<(Vec<f32>, EncodingNotes)> {
        self.encoder.encode(row)
    }

    /// Predicts one name-keyed row.
    ///
    /// Missing, malformed, or unknown values degrade the prediction and are
    /// logged; they never fail it.
    ///
    /// # Errors
    ///
    /// Returns an error only if the pipeline state is inconsistent.
    pub fn predict_row(&self, row: &FeatureRow) -> Result<Prediction> {
        let (vector, notes) = self.encoder.encode(row)?;
        notes.log_warnings();
        let x = Matrix::from_vec(1, vector.len(), vector)?;
        let probabilities = self
            .classifier
            .predict_proba(&x)?
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::Other("classifier returned no rows".into()))?;
        self.prediction(probabilities, notes)
    }

    /// Validates and predicts a typed record.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidRecord`] for out-of-range fields.
    pub fn predict(&self, record: &PatientRecord) -> Result<Prediction> {
        record.validate()?;
        self.predict_row(&record.to_row())
    }

    /// Class probabilities of one row, in [`FittedPipeline::classes`] order.
    ///
    /// # Errors
    ///
    /// See [`FittedPipeline::predict_row`].
    pub fn predict_proba(&self, row: &FeatureRow) -> Result<Vec<f32>> {
        Ok(self.predict_row(row)?.probabilities)
    }

    /// Predicts a batch; a degraded row never aborts the others.
    ///
    /// # Errors
    ///
    /// Returns an error only if the pipeline state is inconsistent.
    pub fn predict_batch(&self, rows: &[FeatureRow]) -> Result<Vec<Prediction>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let mut data = Vec::with_capacity(rows.len() * self.encoder.dimension());
        let mut all_notes = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            let (vector, notes) = self.encoder.encode(row)?;
            if !notes.is_clean() {
                log::warn!("record {i}: encoded with absorbed values");
                notes.log_warnings();
            }
            data.extend(vector);
            all_notes.push(notes);
        }
        let x = Matrix::from_vec(rows.len(), self.encoder.dimension(), data)?;
        let proba = self.classifier.predict_proba(&x)?;
        proba
            .into_iter()
            .zip(all_notes)
            .map(|(p, notes)| self.prediction(p, notes))
            .collect()
    }

    /// Predicted class indices for a batch, without per-row notes.
    ///
    /// # Errors
    ///
    /// Returns an error only if the pipeline state is inconsistent.
    pub fn predict_indices(&self, rows: &[FeatureRow]) -> Result<Vec<usize>> {
        let x = self.encoder.transform(rows)?;
        self.classifier.predict(&x)
    }

    /// `(column name, importance)` pairs, most important first.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<(String, f32)> {
        let Some(importances) = self.classifier.feature_importances() else {
            return Vec::new();
        };
        let mut pairs: Vec<(String, f32)> = self
            .encoder
            .column_names()
            .into_iter()
            .zip(importances)
            .collect();
        pairs.sort_by(|a, b| b.1.total_cmp(&a.1));
        pairs
    }

    /// Serializes into the artifact container.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Serialization`] if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serialization::encode(self)
    }

    /// Reconstructs a pipeline from artifact bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::CorruptArtifact`] if the container is invalid
    /// or the decoded state is inconsistent.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let pipeline: Self = serialization::decode(bytes)?;
        pipeline.check_consistency()?;
        Ok(pipeline)
    }

    /// Writes the artifact to `path`; returns the byte count.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Io`] on filesystem failure.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        serialization::write_artifact(path, self)
    }

    /// Loads the artifact at `path`.
    ///
    /// # Errors
    ///
    /// Any failure, including an unreadable, empty, or corrupt file, is
    /// reported as [`PipelineError::MissingArtifact`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let pipeline: Self = serialization::read_artifact(path)?;
        pipeline
            .check_consistency()
            .map_err(|e| PipelineError::MissingArtifact {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        log::info!(
            "loaded pipeline from {} ({} classes, {} features)",
            path.display(),
            pipeline.classes.len(),
            pipeline.encoder.dimension()
        );
        Ok(pipeline)
    }

    fn prediction(&self, probabilities: Vec<f32>, notes: EncodingNotes) -> Result<Prediction> {
        let category = self
            .classes
            .get(argmax(&probabilities))
            .copied()
            .ok_or_else(|| PipelineError::Other("prediction outside class list".into()))?;
        Ok(Prediction {
            category,
            probabilities,
            notes,
        })
    }

    fn check_consistency(&self) -> Result<()> {
        let corrupt = |msg: String| Err(PipelineError::CorruptArtifact(msg));
        if !self.encoder.is_fitted() {
            return corrupt("encoder is not fitted".into());
        }
        if self.classifier.n_stages() == 0 {
            return corrupt("classifier has no fitted stages".into());
        }
        if self.classes != ObesityCategory::ALL {
            return corrupt(format!("unexpected class list {:?}", self.classes));
        }
        if self.classifier.n_classes() != self.classes.len() {
            return corrupt(format!(
                "classifier emits {} classes, artifact lists {}",
                self.classifier.n_classes(),
                self.classes.len()
            ));
        }
        if self.classifier.n_features() != self.encoder.dimension() {
            return corrupt(format!(
                "classifier expects {} features, encoder produces {}",
                self.classifier.n_features(),
                self.encoder.dimension()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic::bmi_labelled as bmi_dataset;

    fn small_spec() -> PipelineSpec {
        PipelineSpec {
            n_estimators: 15,
            ..PipelineSpec::default()
        }
    }

    #[test]
    fn test_fit_and_predict_row() {
        let dataset = bmi_dataset(140, 7);
        let pipeline = FittedPipeline::fit(&dataset, &small_spec()).unwrap();
        assert_eq!(pipeline.classes(), ObesityCategory::ALL);
        assert_eq!(pipeline.metadata().n_training_rows, 140);
        assert_eq!(pipeline.metadata().class_counts.iter().sum::<usize>(), 140);

        let prediction = pipeline.predict_row(&dataset.rows()[0]).unwrap();
        assert_eq!(prediction.probabilities.len(), 7);
        let sum: f32 = prediction.probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(prediction.notes.is_clean());
    }

    #[test]
    fn test_batch_matches_single() {
        let dataset = bmi_dataset(70, 3);
        let pipeline = FittedPipeline::fit(&dataset, &small_spec()).unwrap();
        let batch = pipeline.predict_batch(&dataset.rows()[..5]).unwrap();
        for (row, from_batch) in dataset.rows()[..5].iter().zip(&batch) {
            assert_eq!(&pipeline.predict_row(row).unwrap(), from_batch);
        }
        assert!(pipeline.predict_batch(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_degraded_row_still_predicts() {
        let dataset = bmi_dataset(70, 5);
        let pipeline = FittedPipeline::fit(&dataset, &small_spec()).unwrap();
        let row = FeatureRow::from_pairs([
            ("weight", "abc"),
            ("height", "1.70"),
            ("transport", "Hoverboard"),
        ]);
        let prediction = pipeline.predict_row(&row).unwrap();
        assert_eq!(prediction.notes.missing_numeric.len(), 7);
        assert_eq!(prediction.notes.unknown_categories.len(), 1);
        assert_eq!(prediction.probabilities.len(), 7);
    }

    #[test]
    fn test_ranked_is_descending() {
        let prediction = Prediction {
            category: ObesityCategory::OverweightI,
            probabilities: vec![0.05, 0.1, 0.5, 0.2, 0.1, 0.05, 0.0],
            notes: EncodingNotes::default(),
        };
        let ranked = prediction.ranked();
        assert_eq!(ranked[0], (ObesityCategory::OverweightI, 0.5));
        assert_eq!(ranked[1].0, ObesityCategory::OverweightII);
        assert_eq!(ranked[2].0, ObesityCategory::NormalWeight);
        assert_eq!(ranked[6].0, ObesityCategory::ObesityIII);
        assert!((prediction.confidence() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_bytes_roundtrip_is_identical() {
        let dataset = bmi_dataset(70, 11);
        let pipeline = FittedPipeline::fit(&dataset, &small_spec()).unwrap();
        let restored = FittedPipeline::from_bytes(&pipeline.to_bytes().unwrap()).unwrap();
        assert_eq!(restored, pipeline);
    }

    #[test]
    fn test_invalid_spec_rejected() {
        let dataset = bmi_dataset(70, 1);
        let spec = PipelineSpec {
            learning_rate: 0.0,
            ..PipelineSpec::default()
        };
        assert!(matches!(
            FittedPipeline::fit(&dataset, &spec),
            Err(PipelineError::InvalidHyperparameter { .. })
        ));
    }

    #[test]
    fn test_feature_importances_named_and_sorted() {
        let dataset = bmi_dataset(140, 2);
        let pipeline = FittedPipeline::fit(&dataset, &small_spec()).unwrap();
        let importances = pipeline.feature_importances();
        assert_eq!(importances.len(), pipeline.encoder().dimension());
        assert!(importances.windows(2).all(|w| w[0].1 >= w[1].1));
        let top: Vec<&str> = importances[..2].iter().map(|(n, _)| n.as_str()).collect();
        assert!(top.contains(&"weight") || top.contains(&"height"));
    }
}
