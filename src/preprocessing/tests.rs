//! Tests for preprocessing module.

use super::*;
use crate::data::FeatureRow;

fn patient(age: &str, height: &str, gender: &str, transport: &str) -> FeatureRow {
    FeatureRow::from_pairs([
        ("age", age),
        ("height", height),
        ("gender", gender),
        ("transport", transport),
    ])
}

fn small_encoder() -> (FeatureEncoder, Vec<FeatureRow>) {
    let rows = vec![
        patient("20", "1.60", "Female", "Walking"),
        patient("30", "1.70", "Male", "Automobile"),
        patient("40", "1.80", "Male", "Public_Transportation"),
    ];
    let mut encoder = FeatureEncoder::with_columns(&["age", "height"], &["gender", "transport"]);
    encoder.fit(&rows).expect("fit should succeed");
    (encoder, rows)
}

#[test]
fn test_new() {
    let scaler = StandardScaler::new();
    assert!(!scaler.is_fitted());
    assert!(scaler.mean().is_empty());
}

#[test]
fn test_fit_basic() {
    let data = Matrix::from_vec(3, 2, vec![1.0, 10.0, 2.0, 20.0, 3.0, 30.0])
        .expect("valid matrix dimensions");

    let mut scaler = StandardScaler::new();
    scaler
        .fit(&data)
        .expect("fit should succeed with valid data");

    assert!(scaler.is_fitted());

    let mean = scaler.mean();
    assert!((mean[0] - 2.0).abs() < 1e-6);
    assert!((mean[1] - 20.0).abs() < 1e-6);

    // Population std: sqrt(2/3)
    let std = scaler.std();
    let expected_std = (2.0_f32 / 3.0).sqrt();
    assert!((std[0] - expected_std).abs() < 1e-4);
    assert!((std[1] - expected_std * 10.0).abs() < 1e-3);
}

#[test]
fn test_fit_skips_nan() {
    let data = Matrix::from_vec(4, 1, vec![1.0, f32::NAN, 3.0, f32::NAN]).unwrap();
    let mut scaler = StandardScaler::new();
    scaler.fit(&data).unwrap();
    assert!((scaler.mean()[0] - 2.0).abs() < 1e-6);
    assert!((scaler.std()[0] - 1.0).abs() < 1e-6);
}

#[test]
fn test_transform_imputes_missing_as_zero() {
    let data = Matrix::from_vec(3, 1, vec![1.0, 2.0, 3.0]).unwrap();
    let mut scaler = StandardScaler::new();
    scaler.fit(&data).unwrap();
    let probe = Matrix::from_vec(1, 1, vec![f32::NAN]).unwrap();
    assert_eq!(scaler.transform(&probe).unwrap().get(0, 0), 0.0);
}

#[test]
fn test_constant_column_centered_not_scaled() {
    let data = Matrix::from_vec(3, 1, vec![5.0, 5.0, 5.0]).unwrap();
    let mut scaler = StandardScaler::new();
    let scaled = scaler.fit_transform(&data).unwrap();
    for i in 0..3 {
        assert_eq!(scaled.get(i, 0), 0.0);
    }
    let probe = Matrix::from_vec(1, 1, vec![7.0]).unwrap();
    assert!((scaler.transform(&probe).unwrap().get(0, 0) - 2.0).abs() < 1e-6);
}

#[test]
fn test_transform_not_fitted() {
    let data = Matrix::from_vec(2, 1, vec![1.0, 2.0]).unwrap();
    let scaler = StandardScaler::new();
    assert!(matches!(
        scaler.transform(&data),
        Err(PipelineError::NotFitted(_))
    ));
}

#[test]
fn test_transform_dimension_mismatch() {
    let train = Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    let mut scaler = StandardScaler::new();
    scaler.fit(&train).unwrap();
    let probe = Matrix::from_vec(1, 3, vec![1.0, 2.0, 3.0]).unwrap();
    assert!(matches!(
        scaler.transform(&probe),
        Err(PipelineError::DimensionMismatch { .. })
    ));
}

#[test]
fn test_missing_cell_imputes_training_mean() {
    let train = Matrix::from_vec(3, 1, vec![10.0, 20.0, f32::NAN]).unwrap();
    let mut scaler = StandardScaler::new();
    let scaled = scaler.fit_transform(&train).unwrap();
    assert!((scaler.mean()[0] - 15.0).abs() < 1e-6);
    assert!((scaler.std()[0] - 5.0).abs() < 1e-6);

    let at_mean = Matrix::from_vec(1, 1, vec![15.0]).unwrap();
    let at_mean = scaler.transform(&at_mean).unwrap();
    assert_eq!(scaled.get(2, 0), at_mean.get(0, 0));
    assert_eq!(scaled.get(2, 0), 0.0);
}

#[test]
fn test_fit_empty_rejected() {
    let data = Matrix::from_vec(0, 2, vec![]).unwrap();
    let mut scaler = StandardScaler::new();
    assert!(matches!(scaler.fit(&data), Err(PipelineError::EmptyDataset)));
}

#[test]
fn test_vocabulary_sorted() {
    let (encoder, _) = small_encoder();
    assert_eq!(
        encoder.categorical().vocabulary("transport").unwrap(),
        &["automobile", "public_transit", "walking"]
    );
    assert_eq!(encoder.dimension(), 2 + 2 + 3);
    assert_eq!(
        encoder.column_names(),
        vec![
            "age",
            "height",
            "gender=female",
            "gender=male",
            "transport=automobile",
            "transport=public_transit",
            "transport=walking",
        ]
    );
}

#[test]
fn test_encode_known_row() {
    let (encoder, rows) = small_encoder();
    let (vector, notes) = encoder.encode(&rows[1]).unwrap();
    assert!(notes.is_clean());
    assert_eq!(vector.len(), 7);
    assert!(vector[0].abs() < 1e-6);
    assert_eq!(&vector[2..], &[0.0, 1.0, 1.0, 0.0, 0.0]);
}

#[test]
fn test_unknown_category_zero_block() {
    let (encoder, _) = small_encoder();
    let row = patient("25", "1.75", "Female", "Hoverboard");
    let (vector, notes) = encoder.encode(&row).unwrap();
    assert_eq!(vector.len(), encoder.dimension());
    assert_eq!(&vector[4..], &[0.0, 0.0, 0.0]);
    assert_eq!(
        notes.unknown_categories,
        vec![("transport".to_string(), "hoverboard".to_string())]
    );
}

#[test]
fn test_missing_fields_degrade() {
    let (encoder, _) = small_encoder();
    let row = FeatureRow::from_pairs([("age", "abc"), ("gender", "Male")]);
    let (vector, notes) = encoder.encode(&row).unwrap();
    assert_eq!(vector[0], 0.0);
    assert_eq!(vector[1], 0.0);
    assert_eq!(notes.missing_numeric, vec!["age", "height"]);
    assert_eq!(notes.missing_categories, vec!["transport"]);
    assert!(!notes.is_clean());
}

#[test]
fn test_transform_matches_encode() {
    let (encoder, rows) = small_encoder();
    let matrix = encoder.transform(&rows).unwrap();
    assert_eq!(matrix.shape(), (3, encoder.dimension()));
    for (i, row) in rows.iter().enumerate() {
        let (vector, _) = encoder.encode(row).unwrap();
        assert_eq!(matrix.row(i), vector.as_slice());
    }
}

#[test]
fn test_encoder_not_fitted() {
    let encoder = FeatureEncoder::new();
    assert!(!encoder.is_fitted());
    assert!(encoder.encode(&FeatureRow::new()).is_err());
}

#[test]
fn test_default_encoder_columns() {
    let encoder = FeatureEncoder::new();
    assert_eq!(encoder.numeric_columns().len(), 8);
    assert_eq!(encoder.categorical().attributes().count(), 8);
}
