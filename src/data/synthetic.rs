//! Seeded synthetic patient tables.
//!
//! Rows are labelled by a BMI band with a gap around every class
//! boundary, so a boosted ensemble can learn the labels from height and
//! weight alone. The lifestyle attributes are uniform noise. Used for demos,
//! smoke tests, and the crate's own test suite.
//!
//! ```
//! use obesity_pipeline::data::synthetic::bmi_labelled;
//!
//! let dataset = bmi_labelled(70, 42);
//! assert_eq!(dataset.len(), 70);
//! assert_eq!(dataset.class_counts().len(), 7);
//! assert_eq!(bmi_labelled(70, 42), dataset);
//! ```

use super::category::{CategoricalValue, Frequency, Gender, ObesityCategory, Transport, YesNo};
use super::dataset::LabeledDataset;
use super::record::FeatureRow;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// BMI interval sampled for each class, in severity order.
const BMI_BANDS: [(f32, f32); 7] = [
    (15.0, 18.2),
    (18.8, 24.6),
    (25.2, 27.3),
    (27.7, 29.7),
    (30.3, 34.7),
    (35.3, 39.7),
    (40.3, 50.0),
];

/// `n` rows cycling through the seven classes, reproducible from `seed`.
#[must_use]
pub fn bmi_labelled(n: usize, seed: u64) -> LabeledDataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rows = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);

    for i in 0..n {
        let class = ObesityCategory::ALL[i % ObesityCategory::COUNT];
        let (lo, hi) = BMI_BANDS[class.index()];
        let height: f32 = rng.gen_range(1.50..1.95);
        let bmi: f32 = rng.gen_range(lo..hi);

        let mut row = FeatureRow::new();
        row.set_number("age", rng.gen_range(16.0..60.0));
        row.set_number("height", height);
        row.set_number("weight", bmi * height * height);
        row.set_number("fcvc", rng.gen_range(1.0..3.0));
        row.set_number("ncp", rng.gen_range(1.0..4.0));
        row.set_number("ch2o", rng.gen_range(1.0..3.0));
        row.set_number("faf", rng.gen_range(0.0..3.0));
        row.set_number("tue", rng.gen_range(0.0..2.0));
        row.set_category("gender", pick::<Gender>(&mut rng));
        row.set_category("family_history", pick::<YesNo>(&mut rng));
        row.set_category("favc", pick::<YesNo>(&mut rng));
        row.set_category("caec", pick::<Frequency>(&mut rng));
        row.set_category("smoke", pick::<YesNo>(&mut rng));
        row.set_category("scc", pick::<YesNo>(&mut rng));
        row.set_category("calc", pick::<Frequency>(&mut rng));
        row.set_category("transport", pick::<Transport>(&mut rng));

        rows.push(row);
        labels.push(class);
    }

    LabeledDataset::new(rows, labels).unwrap_or_default()
}

fn pick<T: CategoricalValue>(rng: &mut StdRng) -> &'static str {
    T::ALL.choose(rng).map_or("", |v| v.token())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_follow_bmi_bands() {
        let dataset = bmi_labelled(140, 9);
        for (row, label) in dataset.iter() {
            let (lo, hi) = BMI_BANDS[label.index()];
            let bmi = row.bmi();
            assert!(bmi >= lo - 0.01 && bmi <= hi + 0.01, "{label}: {bmi}");
        }
    }

    #[test]
    fn test_rows_are_complete() {
        let dataset = bmi_labelled(14, 0);
        for row in dataset.rows() {
            assert_eq!(row.len(), 16);
        }
    }

    #[test]
    fn test_seed_changes_rows() {
        assert_ne!(bmi_labelled(14, 1), bmi_labelled(14, 2));
    }
}
