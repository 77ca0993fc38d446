//! Artifact round-trip, determinism, and load-failure tests.

mod common;

use obesity_pipeline::config::TrainingConfig;
use obesity_pipeline::data::synthetic::bmi_labelled;
use obesity_pipeline::loading::ArtifactHandle;
use obesity_pipeline::pipeline::FittedPipeline;
use obesity_pipeline::serialization::ARTIFACT_MAGIC;
use obesity_pipeline::training::{fit_for_export, train_and_export};
use obesity_pipeline::PipelineError;
use proptest::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn saved_pipeline_reproduces_probabilities_exactly() {
    let pipeline = common::trained_pipeline();
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.obp");
    let written = pipeline.save(&path).unwrap();
    assert_eq!(written as u64, fs::metadata(&path).unwrap().len());

    let loaded = FittedPipeline::load(&path).unwrap();
    assert_eq!(&loaded, pipeline);
    for row in common::training_set().rows().iter().take(30) {
        let a = pipeline.predict_proba(row).unwrap();
        let b = loaded.predict_proba(row).unwrap();
        assert_eq!(a, b);
    }
    let record = common::scenario_a();
    assert_eq!(
        pipeline.predict(&record).unwrap(),
        loaded.predict(&record).unwrap()
    );
}

#[test]
fn identical_training_yields_identical_bytes() {
    let dataset = bmi_labelled(105, 3);
    let config = TrainingConfig {
        booster: common::quick_spec(),
        cv_folds: 3,
        ..TrainingConfig::default()
    };
    let a = fit_for_export(&dataset, &config).unwrap().to_bytes().unwrap();
    let b = fit_for_export(&dataset, &config).unwrap().to_bytes().unwrap();
    assert_eq!(a, b);
    assert_eq!(&a[..4], ARTIFACT_MAGIC);
}

#[test]
fn identical_training_runs_write_identical_files() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("obesity.csv");
    bmi_labelled(70, 9).write_csv(&csv).unwrap();

    let run = |name: &str| {
        let config = TrainingConfig {
            dataset: csv.clone(),
            artifact: dir.path().join(name),
            booster: common::quick_spec(),
            evaluate: false,
            ..TrainingConfig::default()
        };
        train_and_export(&config).unwrap();
        fs::read(dir.path().join(name)).unwrap()
    };
    assert_eq!(run("first.obp"), run("second.obp"));
}

#[test]
fn zero_byte_artifact_is_missing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.obp");
    fs::write(&path, b"").unwrap();
    assert!(matches!(
        FittedPipeline::load(&path),
        Err(PipelineError::MissingArtifact { .. })
    ));
}

#[test]
fn absent_artifact_is_missing() {
    let dir = tempdir().unwrap();
    let err = FittedPipeline::load(dir.path().join("nope.obp")).unwrap_err();
    match err {
        PipelineError::MissingArtifact { path, .. } => assert!(path.ends_with("nope.obp")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn handle_refuses_corrupt_artifact() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.obp");
    common::trained_pipeline().save(&path).unwrap();
    let mut bytes = fs::read(&path).unwrap();
    let mid = bytes.len() / 2;
    bytes[mid] ^= 0x5A;
    fs::write(&path, &bytes).unwrap();

    let handle = ArtifactHandle::new(&path);
    assert!(matches!(
        handle.get(),
        Err(PipelineError::MissingArtifact { .. })
    ));
    assert!(!handle.is_loaded());
}

#[test]
fn handle_recovers_once_artifact_appears() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("late.obp");
    let handle = ArtifactHandle::new(&path);
    assert!(handle.get().is_err());

    common::trained_pipeline().save(&path).unwrap();
    let first = handle.get().unwrap() as *const FittedPipeline;
    let second = handle.get().unwrap() as *const FittedPipeline;
    assert_eq!(first, second);
    assert!(handle.is_loaded());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn truncated_artifact_is_rejected(cut in 0usize..4096) {
        let bytes = common::trained_pipeline().to_bytes().unwrap();
        let keep = cut % bytes.len();
        let dir = tempdir().unwrap();
        let path = dir.path().join("truncated.obp");
        fs::write(&path, &bytes[..keep]).unwrap();
        let is_missing = matches!(
            FittedPipeline::load(&path),
            Err(PipelineError::MissingArtifact { .. })
        );
        prop_assert!(is_missing);
    }
}
