//! Descriptive analytics over a labelled patient table.
//!
//! Filters rows by gender, age, and family history, then summarizes the
//! remaining patients: headline metrics, category distribution, obesity share
//! by family history, per-category lifestyle means, a Pearson correlation
//! matrix, and per-category five-number summaries.

use crate::data::{CategoricalValue, FeatureRow, Gender, LabeledDataset, ObesityCategory, YesNo};
use crate::error::Result;
use crate::primitives::Matrix;
use crate::stats::{corr_matrix, DescriptiveStats, FiveNumberSummary};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Columns of the correlation matrix, in order.
pub const CORRELATION_COLUMNS: [&str; 9] = [
    "age", "height", "weight", "bmi", "fcvc", "ncp", "ch2o", "faf", "tue",
];

/// Row filter; `None` fields accept everything.
///
/// ```
/// use obesity_pipeline::analytics::DatasetFilter;
/// use obesity_pipeline::data::{FeatureRow, Gender};
///
/// let filter = DatasetFilter {
///     genders: Some(vec![Gender::Female]),
///     age_range: Some((18.0, 30.0)),
///     ..DatasetFilter::default()
/// };
/// let row = FeatureRow::from_pairs([("gender", "Female"), ("age", "30")]);
/// assert!(filter.matches(&row));
/// let row = FeatureRow::from_pairs([("gender", "Male"), ("age", "25")]);
/// assert!(!filter.matches(&row));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetFilter {
    /// Accepted genders
    pub genders: Option<Vec<Gender>>,
    /// Inclusive age bounds
    pub age_range: Option<(f32, f32)>,
    /// Accepted family-history answers
    pub family_history: Option<Vec<YesNo>>,
}

impl DatasetFilter {
    /// Returns true if `row` passes every set criterion.
    #[must_use]
    pub fn matches(&self, row: &FeatureRow) -> bool {
        if let Some(genders) = &self.genders {
            if !token_in(row, "gender", genders) {
                return false;
            }
        }
        if let Some((lo, hi)) = self.age_range {
            let age = row.number("age");
            if !(age >= lo && age <= hi) {
                return false;
            }
        }
        if let Some(answers) = &self.family_history {
            if !token_in(row, "family_history", answers) {
                return false;
            }
        }
        true
    }

    /// Rows of `dataset` that pass, in their original order.
    #[must_use]
    pub fn apply(&self, dataset: &LabeledDataset) -> LabeledDataset {
        let keep: Vec<usize> = dataset
            .rows()
            .iter()
            .enumerate()
            .filter(|(_, row)| self.matches(row))
            .map(|(i, _)| i)
            .collect();
        dataset.subset(&keep)
    }
}

fn token_in<T: CategoricalValue>(row: &FeatureRow, name: &str, accepted: &[T]) -> bool {
    row.category(name)
        .is_some_and(|token| accepted.iter().any(|v| v.token() == token))
}

/// Headline figures of the filtered set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyMetrics {
    /// Rows after filtering
    pub total_patients: usize,
    /// Mean age over rows with an age
    pub mean_age: f32,
    /// Mean BMI over rows with height and weight
    pub mean_bmi: f32,
    /// Fraction labelled Obesity I, II or III
    pub obesity_share: f32,
}

/// Named-column correlation matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    /// Column names, row and column order of `values`
    pub columns: Vec<String>,
    /// Pearson coefficients; `NaN` where undefined
    pub values: Matrix<f32>,
}

impl CorrelationMatrix {
    /// Coefficient between two named columns.
    #[must_use]
    pub fn get(&self, a: &str, b: &str) -> Option<f32> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        Some(self.values.get(i, j))
    }
}

/// Everything computed for a non-empty filtered set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    /// Headline figures
    pub metrics: KeyMetrics,
    /// Row count of every category, in severity order
    pub distribution: Vec<(ObesityCategory, usize)>,
    /// Percentage of obese rows within each family-history group
    pub obesity_share_by_family_history: Vec<(String, f32)>,
    /// Mean water intake per present category
    pub mean_ch2o: Vec<(ObesityCategory, f32)>,
    /// Mean physical activity per present category
    pub mean_faf: Vec<(ObesityCategory, f32)>,
    /// Pearson correlations over [`CORRELATION_COLUMNS`]
    pub correlation: CorrelationMatrix,
    /// BMI five-number summary per present category
    pub bmi_by_category: Vec<(ObesityCategory, FiveNumberSummary)>,
    /// Age five-number summary per present category
    pub age_by_category: Vec<(ObesityCategory, FiveNumberSummary)>,
    /// Physical activity five-number summary per present category
    pub faf_by_category: Vec<(ObesityCategory, FiveNumberSummary)>,
}

/// Outcome of [`analyze`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DatasetAnalysis {
    /// No row passed the filter
    Empty,
    /// Summary of the rows that passed
    Summary(Box<DatasetSummary>),
}

/// Filters `dataset` and summarizes what remains.
///
/// An empty result is [`DatasetAnalysis::Empty`], not an error.
///
/// # Errors
///
/// Returns an error only if an internal statistic fails on non-empty data.
pub fn analyze(dataset: &LabeledDataset, filter: &DatasetFilter) -> Result<DatasetAnalysis> {
    let filtered = filter.apply(dataset);
    log::debug!("{} of {} rows pass the filter", filtered.len(), dataset.len());
    if filtered.is_empty() {
        return Ok(DatasetAnalysis::Empty);
    }
    Ok(DatasetAnalysis::Summary(Box::new(summarize(&filtered)?)))
}

fn summarize(dataset: &LabeledDataset) -> Result<DatasetSummary> {
    let column = |name: &str| -> Vec<f32> {
        dataset
            .rows()
            .iter()
            .map(|row| if name == "bmi" { row.bmi() } else { row.number(name) })
            .collect()
    };

    let total = dataset.len();
    let obese = dataset.labels().iter().filter(|c| c.is_obese()).count();
    let metrics = KeyMetrics {
        total_patients: total,
        mean_age: DescriptiveStats::new(&column("age")).mean(),
        mean_bmi: DescriptiveStats::new(&column("bmi")).mean(),
        obesity_share: obese as f32 / total as f32,
    };

    let counts = dataset.class_counts();
    let distribution = ObesityCategory::ALL
        .iter()
        .map(|c| (*c, counts.get(c).copied().unwrap_or(0)))
        .collect();

    let mut groups: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for (row, label) in dataset.iter() {
        let key = row.category("family_history").unwrap_or("unknown").to_string();
        let entry = groups.entry(key).or_default();
        entry.0 += 1;
        entry.1 += usize::from(label.is_obese());
    }
    let obesity_share_by_family_history = groups
        .into_iter()
        .map(|(group, (n, obese))| (group, 100.0 * obese as f32 / n as f32))
        .collect();

    let by_category = |name: &str| -> Vec<(ObesityCategory, Vec<f32>)> {
        let values = column(name);
        ObesityCategory::ALL
            .iter()
            .filter_map(|&c| {
                let group: Vec<f32> = dataset
                    .labels()
                    .iter()
                    .zip(&values)
                    .filter(|(label, _)| **label == c)
                    .map(|(_, v)| *v)
                    .collect();
                (!group.is_empty()).then_some((c, group))
            })
            .collect()
    };
    let means = |name: &str| -> Vec<(ObesityCategory, f32)> {
        by_category(name)
            .into_iter()
            .map(|(c, values)| (c, DescriptiveStats::new(&values).mean()))
            .collect()
    };
    let summaries = |name: &str| -> Vec<(ObesityCategory, FiveNumberSummary)> {
        by_category(name)
            .into_iter()
            .filter_map(|(c, values)| {
                DescriptiveStats::new(&values)
                    .five_number_summary()
                    .ok()
                    .map(|s| (c, s))
            })
            .collect()
    };

    let mut data = Vec::with_capacity(total * CORRELATION_COLUMNS.len());
    let columns: Vec<Vec<f32>> = CORRELATION_COLUMNS.iter().map(|c| column(*c)).collect();
    for i in 0..total {
        data.extend(columns.iter().map(|col| col[i]));
    }
    let values = corr_matrix(&Matrix::from_vec(total, CORRELATION_COLUMNS.len(), data)?)?;

    Ok(DatasetSummary {
        metrics,
        distribution,
        obesity_share_by_family_history,
        mean_ch2o: means("ch2o"),
        mean_faf: means("faf"),
        correlation: CorrelationMatrix {
            columns: CORRELATION_COLUMNS.iter().map(|c| (*c).to_string()).collect(),
            values,
        },
        bmi_by_category: summaries("bmi"),
        age_by_category: summaries("age"),
        faf_by_category: summaries("faf"),
    })
}

impl fmt::Display for DatasetAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "No patients match the selected filters."),
            Self::Summary(summary) => write!(f, "{summary}"),
        }
    }
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.metrics;
        writeln!(f, "Total patients:      {}", m.total_patients)?;
        writeln!(f, "Mean age:            {:.1} years", m.mean_age)?;
        writeln!(f, "Mean BMI:            {:.2}", m.mean_bmi)?;
        writeln!(f, "Obesity (I-III):     {:.1}%", m.obesity_share * 100.0)?;

        writeln!(f, "\nCategory distribution:")?;
        for (category, count) in &self.distribution {
            writeln!(f, "  {:<14} {count:>6}", category.label())?;
        }

        writeln!(f, "\nObesity share by family history:")?;
        for (group, pct) in &self.obesity_share_by_family_history {
            writeln!(f, "  {group:<14} {pct:>6.1}%")?;
        }

        writeln!(f, "\nMean CH2O / FAF by category:")?;
        for ((category, ch2o), (_, faf)) in self.mean_ch2o.iter().zip(&self.mean_faf) {
            writeln!(f, "  {:<14} {ch2o:>6.2} {faf:>6.2}", category.label())?;
        }

        writeln!(f, "\nCorrelation matrix:")?;
        write!(f, "  {:<7}", "")?;
        for name in &self.correlation.columns {
            write!(f, "{name:>7}")?;
        }
        writeln!(f)?;
        for (i, name) in self.correlation.columns.iter().enumerate() {
            write!(f, "  {name:<7}")?;
            for j in 0..self.correlation.columns.len() {
                write!(f, "{:>7.2}", self.correlation.values.get(i, j))?;
            }
            writeln!(f)?;
        }

        for (title, rows) in [
            ("BMI", &self.bmi_by_category),
            ("Age", &self.age_by_category),
            ("FAF", &self.faf_by_category),
        ] {
            writeln!(f, "\n{title} by category (min / Q1 / median / Q3 / max):")?;
            for (category, s) in rows {
                writeln!(
                    f,
                    "  {:<14} {:>7.2} {:>7.2} {:>7.2} {:>7.2} {:>7.2}",
                    category.label(),
                    s.min,
                    s.q1,
                    s.median,
                    s.q3,
                    s.max
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic::bmi_labelled;

    fn summary(analysis: DatasetAnalysis) -> DatasetSummary {
        match analysis {
            DatasetAnalysis::Summary(summary) => *summary,
            DatasetAnalysis::Empty => panic!("expected a summary"),
        }
    }

    #[test]
    fn test_unfiltered_metrics() {
        let dataset = bmi_labelled(70, 1);
        let s = summary(analyze(&dataset, &DatasetFilter::default()).unwrap());
        assert_eq!(s.metrics.total_patients, 70);
        assert!((s.metrics.obesity_share - 3.0 / 7.0).abs() < 1e-6);
        assert_eq!(s.distribution.len(), 7);
        assert!(s.distribution.iter().all(|(_, n)| *n == 10));
        assert_eq!(s.bmi_by_category.len(), 7);
        assert!(s.bmi_by_category[0].1.max < s.bmi_by_category[6].1.min);
    }

    #[test]
    fn test_empty_filter_result() {
        let dataset = bmi_labelled(14, 1);
        let filter = DatasetFilter {
            age_range: Some((200.0, 300.0)),
            ..DatasetFilter::default()
        };
        let analysis = analyze(&dataset, &filter).unwrap();
        assert_eq!(analysis, DatasetAnalysis::Empty);
        assert!(analysis.to_string().contains("No patients"));
    }

    #[test]
    fn test_gender_filter() {
        let dataset = bmi_labelled(70, 5);
        let filter = DatasetFilter {
            genders: Some(vec![Gender::Male]),
            ..DatasetFilter::default()
        };
        let filtered = filter.apply(&dataset);
        assert!(filtered.len() < dataset.len());
        assert!(filtered
            .rows()
            .iter()
            .all(|r| r.category("gender") == Some("male")));
    }

    #[test]
    fn test_family_history_share() {
        let rows = vec![
            FeatureRow::from_pairs([("family_history", "yes")]),
            FeatureRow::from_pairs([("family_history", "yes")]),
            FeatureRow::from_pairs([("family_history", "no")]),
        ];
        let labels = vec![
            ObesityCategory::ObesityI,
            ObesityCategory::NormalWeight,
            ObesityCategory::NormalWeight,
        ];
        let dataset = LabeledDataset::new(rows, labels).unwrap();
        let s = summary(analyze(&dataset, &DatasetFilter::default()).unwrap());
        assert_eq!(
            s.obesity_share_by_family_history,
            vec![("no".to_string(), 0.0), ("yes".to_string(), 50.0)]
        );
        // no numeric columns at all: every correlation is undefined
        assert!(s.correlation.get("age", "weight").unwrap().is_nan());
        assert!(s.metrics.mean_age.is_nan());
    }

    #[test]
    fn test_bmi_tracks_weight() {
        let dataset = bmi_labelled(140, 3);
        let s = summary(analyze(&dataset, &DatasetFilter::default()).unwrap());
        assert!(s.correlation.get("bmi", "weight").unwrap() > 0.7);
        assert!((s.correlation.get("tue", "tue").unwrap() - 1.0).abs() < 1e-6);
        assert!(s.correlation.get("bmi", "unknown").is_none());
    }
}
