//! Patient records: the strict typed form and the name-keyed encoder input.

use super::category::{CategoricalValue, Frequency, Gender, Transport, YesNo};
use super::schema::{self, FeatureKind};
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single attribute value as seen by the encoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    /// Numeric value; `NaN` marks a missing or malformed cell.
    Number(f32),
    /// Canonical categorical token (or a normalized unknown spelling).
    Category(String),
}

/// Name-keyed attribute map consumed by the feature encoder.
///
/// Keys are canonical attribute names, so insertion order never affects
/// the encoded vector.
///
/// ```
/// use obesity_pipeline::data::FeatureRow;
///
/// let a = FeatureRow::from_pairs([("age", "23"), ("gender", "Female")]);
/// let b = FeatureRow::from_pairs([("gender", "female"), ("age", "23.0")]);
/// assert_eq!(a, b);
/// assert!(FeatureRow::from_pairs([("age", "n/a")]).number("age").is_nan());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    values: BTreeMap<String, FeatureValue>,
}

impl FeatureRow {
    /// Creates an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a numeric attribute.
    pub fn set_number(&mut self, name: &str, value: f32) {
        self.values
            .insert(name.to_string(), FeatureValue::Number(value));
    }

    /// Inserts a categorical attribute; the caller supplies the canonical token.
    pub fn set_category(&mut self, name: &str, token: impl Into<String>) {
        self.values
            .insert(name.to_string(), FeatureValue::Category(token.into()));
    }

    /// Parses one raw `(name, text)` cell according to the schema.
    ///
    /// Numeric text that fails to parse becomes `NaN`; categorical text is
    /// normalized by the attribute's domain. Names outside the schema are
    /// kept as lower-cased category tokens and ignored by the encoder.
    pub fn set_raw(&mut self, name: &str, raw: &str) {
        let spec =
            schema::resolve(name).or_else(|| schema::feature(&schema::normalize_key(name)));
        let key = spec.map_or_else(|| schema::normalize_key(name), |f| f.name.to_string());
        match spec.map(|f| f.kind) {
            Some(FeatureKind::Numeric) => {
                let value = parse_numeric(raw).unwrap_or_else(|| {
                    log::warn!("malformed numeric value {raw:?} for '{key}', treating as missing");
                    f32::NAN
                });
                self.set_number(&key, value);
            }
            Some(FeatureKind::Categorical(domain)) => {
                let token = domain.normalize(raw);
                self.set_category(&key, token);
            }
            None => self.set_category(&key, schema::normalize_key(raw)),
        }
    }

    /// Builds a row from raw text cells.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut row = Self::new();
        for (name, raw) in pairs {
            row.set_raw(name, raw);
        }
        row
    }

    /// Builds a row from a JSON object of named fields.
    ///
    /// Numbers may be JSON numbers or strings; anything else in a numeric
    /// slot is treated as missing.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is not a JSON object.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| PipelineError::Other("inference request must be a JSON object".into()))?;
        let mut row = Self::new();
        for (name, field) in object {
            match field {
                serde_json::Value::Number(n) => {
                    row.set_raw(name, &n.to_string());
                }
                serde_json::Value::String(s) => row.set_raw(name, s),
                serde_json::Value::Bool(b) => row.set_raw(name, if *b { "yes" } else { "no" }),
                other => row.set_raw(name, &other.to_string()),
            }
        }
        Ok(row)
    }

    /// Looks up an attribute.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.values.get(name)
    }

    /// Numeric attribute, `NaN` when absent or categorical.
    #[must_use]
    pub fn number(&self, name: &str) -> f32 {
        match self.values.get(name) {
            Some(FeatureValue::Number(v)) => *v,
            _ => f32::NAN,
        }
    }

    /// Categorical token, `None` when absent or numeric.
    #[must_use]
    pub fn category(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(FeatureValue::Category(token)) => Some(token.as_str()),
            _ => None,
        }
    }

    /// Number of attributes present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no attribute is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates attributes in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Body mass index from `weight` and `height`, `NaN` if either is missing.
    #[must_use]
    pub fn bmi(&self) -> f32 {
        crate::clinical::bmi(self.number("weight"), self.number("height"))
    }
}

/// Parses a numeric cell, accepting `,` as decimal separator.
#[must_use]
pub fn parse_numeric(raw: &str) -> Option<f32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let value: f32 = trimmed.replace(',', ".").parse().ok()?;
    value.is_finite().then_some(value)
}

/// One fully specified patient, validated at the boundary.
///
/// Field names match the canonical attribute names, so the JSON form of
/// this struct is also a valid inference request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    /// Gender
    pub gender: Gender,
    /// Age in years
    pub age: f32,
    /// Height in meters
    pub height: f32,
    /// Weight in kilograms
    pub weight: f32,
    /// Family history of overweight
    pub family_history: YesNo,
    /// Frequent consumption of high-caloric food
    pub favc: YesNo,
    /// Vegetable consumption frequency (0-3)
    pub fcvc: f32,
    /// Number of main meals (1-4)
    pub ncp: f32,
    /// Eating between meals
    pub caec: Frequency,
    /// Smoker
    pub smoke: YesNo,
    /// Daily water intake in liters (1-3)
    pub ch2o: f32,
    /// Calorie monitoring
    pub scc: YesNo,
    /// Physical activity frequency (0-3)
    pub faf: f32,
    /// Daily screen time (0-3)
    pub tue: f32,
    /// Alcohol consumption
    pub calc: Frequency,
    /// Primary transportation
    pub transport: Transport,
}

/// Plausible range per numeric attribute.
const NUMERIC_BOUNDS: [(&str, f32, f32); 8] = [
    ("age", 0.0, 120.0),
    ("height", 1.0, 2.5),
    ("weight", 20.0, 300.0),
    ("fcvc", 0.0, 3.0),
    ("ncp", 1.0, 4.0),
    ("ch2o", 0.0, 3.0),
    ("faf", 0.0, 3.0),
    ("tue", 0.0, 3.0),
];

impl PatientRecord {
    /// Checks every numeric field against its plausible range.
    ///
    /// Age must be strictly positive.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidRecord`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        for (name, lo, hi) in NUMERIC_BOUNDS {
            let value = self.numeric(name);
            let ok = value.is_finite()
                && value <= hi
                && if name == "age" { value > lo } else { value >= lo };
            if !ok {
                return Err(PipelineError::InvalidRecord {
                    field: name.to_string(),
                    reason: format!("= {value} outside plausible range [{lo}, {hi}]"),
                });
            }
        }
        Ok(())
    }

    fn numeric(&self, name: &str) -> f32 {
        match name {
            "age" => self.age,
            "height" => self.height,
            "weight" => self.weight,
            "fcvc" => self.fcvc,
            "ncp" => self.ncp,
            "ch2o" => self.ch2o,
            "faf" => self.faf,
            "tue" => self.tue,
            _ => f32::NAN,
        }
    }

    /// Converts to the name-keyed encoder input.
    #[must_use]
    pub fn to_row(&self) -> FeatureRow {
        let mut row = FeatureRow::new();
        for name in schema::NUMERIC_FEATURES {
            row.set_number(name, self.numeric(name));
        }
        row.set_category("gender", self.gender.token());
        row.set_category("family_history", self.family_history.token());
        row.set_category("favc", self.favc.token());
        row.set_category("caec", self.caec.token());
        row.set_category("smoke", self.smoke.token());
        row.set_category("scc", self.scc.token());
        row.set_category("calc", self.calc.token());
        row.set_category("transport", self.transport.token());
        row
    }

    /// Body mass index.
    #[must_use]
    pub fn bmi(&self) -> f32 {
        crate::clinical::bmi(self.weight, self.height)
    }
}

impl TryFrom<&FeatureRow> for PatientRecord {
    type Error = PipelineError;

    /// Strict conversion: every attribute must be present and in-domain.
    fn try_from(row: &FeatureRow) -> Result<Self> {
        fn cat<T: CategoricalValue>(row: &FeatureRow, name: &str) -> Result<T> {
            let token = row.category(name).ok_or_else(|| PipelineError::InvalidRecord {
                field: name.to_string(),
                reason: "is missing".to_string(),
            })?;
            T::parse(token).ok_or_else(|| PipelineError::InvalidRecord {
                field: name.to_string(),
                reason: format!("has unknown value {token:?}"),
            })
        }
        fn num(row: &FeatureRow, name: &str) -> Result<f32> {
            let value = row.number(name);
            if value.is_nan() {
                return Err(PipelineError::InvalidRecord {
                    field: name.to_string(),
                    reason: "is missing or not a number".to_string(),
                });
            }
            Ok(value)
        }

        let record = Self {
            gender: cat(row, "gender")?,
            age: num(row, "age")?,
            height: num(row, "height")?,
            weight: num(row, "weight")?,
            family_history: cat(row, "family_history")?,
            favc: cat(row, "favc")?,
            fcvc: num(row, "fcvc")?,
            ncp: num(row, "ncp")?,
            caec: cat(row, "caec")?,
            smoke: cat(row, "smoke")?,
            ch2o: num(row, "ch2o")?,
            scc: cat(row, "scc")?,
            faf: num(row, "faf")?,
            tue: num(row, "tue")?,
            calc: cat(row, "calc")?,
            transport: cat(row, "transport")?,
        };
        record.validate()?;
        Ok(record)
    }
}
