//! Property-based tests using proptest.
//!
//! These tests verify the probability, unknown-category, and field-order
//! invariants of a fitted pipeline.

mod common;

use obesity_pipeline::data::{FeatureRow, ObesityCategory};
use proptest::prelude::*;

const NUMERIC: [(&str, f32, f32); 8] = [
    ("age", 14.0, 61.0),
    ("height", 1.45, 1.98),
    ("weight", 39.0, 173.0),
    ("fcvc", 1.0, 3.0),
    ("ncp", 1.0, 4.0),
    ("ch2o", 1.0, 3.0),
    ("faf", 0.0, 3.0),
    ("tue", 0.0, 2.0),
];

const CATEGORICAL: [(&str, &[&str]); 8] = [
    ("gender", &["Male", "Female"]),
    ("family_history", &["yes", "no"]),
    ("favc", &["yes", "no"]),
    ("caec", &["no", "Sometimes", "Frequently", "Always"]),
    ("smoke", &["yes", "no"]),
    ("scc", &["yes", "no"]),
    ("calc", &["no", "Sometimes", "Frequently", "Always"]),
    ("transport", &["Public_Transportation", "Walking", "Automobile", "Motorbike", "Bike"]),
];

// Strategy for complete raw requests as (field, text) pairs
fn request_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
    let numeric: Vec<_> = NUMERIC
        .iter()
        .map(|&(name, lo, hi)| (lo..hi).prop_map(move |v| (name.to_string(), format!("{v:.3}"))))
        .collect();
    let categorical: Vec<_> = CATEGORICAL
        .iter()
        .map(|&(name, values)| {
            proptest::sample::select(values).prop_map(move |v| (name.to_string(), v.to_string()))
        })
        .collect();
    (numeric, categorical).prop_map(|(mut a, b)| {
        a.extend(b);
        a
    })
}

fn to_row(pairs: &[(String, String)]) -> FeatureRow {
    FeatureRow::from_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn probabilities_form_a_simplex(pairs in request_strategy()) {
        let proba = common::trained_pipeline().predict_proba(&to_row(&pairs)).unwrap();
        prop_assert_eq!(proba.len(), ObesityCategory::COUNT);
        prop_assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
        let total: f32 = proba.iter().sum();
        prop_assert!((total - 1.0).abs() < 1e-6, "sum = {}", total);
    }

    #[test]
    fn malformed_numerics_still_yield_a_simplex(
        pairs in request_strategy(),
        field in 0usize..8,
        junk in "[a-z?#]{1,6}",
    ) {
        let mut pairs = pairs;
        pairs[field].1 = junk;
        let prediction = common::trained_pipeline().predict_row(&to_row(&pairs)).unwrap();
        prop_assert!(prediction.notes.missing_numeric.contains(&pairs[field].0));
        let total: f32 = prediction.probabilities.iter().sum();
        prop_assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn unseen_category_zeroes_its_block(
        pairs in request_strategy(),
        field in 8usize..16,
        unseen in "zz[a-z]{3,8}",
    ) {
        let pipeline = common::trained_pipeline();
        let mut pairs = pairs;
        pairs[field].1 = unseen;
        let attribute = pairs[field].0.clone();

        let (vector, notes) = pipeline.encode(&to_row(&pairs)).unwrap();
        prop_assert_eq!(vector.len(), pipeline.encoder().dimension());
        prop_assert_eq!(notes.unknown_categories.len(), 1);

        let prefix = format!("{attribute}=");
        let names = pipeline.encoder().column_names();
        let block: Vec<f32> = names
            .iter()
            .zip(&vector)
            .filter(|(name, _)| name.starts_with(&prefix))
            .map(|(_, v)| *v)
            .collect();
        prop_assert!(!block.is_empty());
        prop_assert!(block.iter().all(|v| *v == 0.0));

        let proba = pipeline.predict_proba(&to_row(&pairs)).unwrap();
        prop_assert_eq!(proba.len(), ObesityCategory::COUNT);
    }

    #[test]
    fn field_order_does_not_matter(
        pairs in request_strategy(),
        order in Just((0..16).collect::<Vec<usize>>()).prop_shuffle(),
    ) {
        let pipeline = common::trained_pipeline();
        let permuted: Vec<(String, String)> = order.iter().map(|&i| pairs[i].clone()).collect();
        let (a, _) = pipeline.encode(&to_row(&pairs)).unwrap();
        let (b, _) = pipeline.encode(&to_row(&permuted)).unwrap();
        prop_assert_eq!(a, b);
    }
}
