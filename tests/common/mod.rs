//! Shared fixtures for integration tests.

#![allow(dead_code)]

use obesity_pipeline::data::synthetic::bmi_labelled;
use obesity_pipeline::data::{Frequency, Gender, LabeledDataset, PatientRecord, Transport, YesNo};
use obesity_pipeline::pipeline::{FittedPipeline, PipelineSpec};
use std::sync::OnceLock;

/// Small but learnable booster settings.
pub fn quick_spec() -> PipelineSpec {
    PipelineSpec {
        n_estimators: 30,
        ..PipelineSpec::default()
    }
}

/// BMI-labelled training table, identical across calls.
pub fn training_set() -> LabeledDataset {
    bmi_labelled(210, 11)
}

/// Pipeline fit once per test binary on [`training_set`].
pub fn trained_pipeline() -> &'static FittedPipeline {
    static PIPELINE: OnceLock<FittedPipeline> = OnceLock::new();
    PIPELINE.get_or_init(|| {
        FittedPipeline::fit(&training_set(), &quick_spec()).expect("synthetic data fits")
    })
}

/// Young woman, 1.70 m, 70 kg (BMI about 24.2).
pub fn scenario_a() -> PatientRecord {
    PatientRecord {
        gender: Gender::Female,
        age: 23.0,
        height: 1.70,
        weight: 70.0,
        family_history: YesNo::Yes,
        favc: YesNo::Yes,
        fcvc: 2.0,
        ncp: 3.0,
        caec: Frequency::Sometimes,
        smoke: YesNo::No,
        ch2o: 2.0,
        scc: YesNo::No,
        faf: 1.0,
        tue: 1.0,
        calc: Frequency::Sometimes,
        transport: Transport::PublicTransit,
    }
}

/// Scenario A with a heavy build: 1.60 m, 150 kg (BMI about 58.6).
pub fn scenario_b() -> PatientRecord {
    PatientRecord {
        height: 1.60,
        weight: 150.0,
        ..scenario_a()
    }
}
