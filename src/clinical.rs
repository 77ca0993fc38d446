//! Clinical reading of a prediction: BMI band, healthy weight range,
//! confidence level, risk factors, and recommended actions.
//!
//! Everything here is rule-based and independent of the fitted model; the
//! BMI band in particular may disagree with the predicted category.

use crate::data::{Frequency, ObesityCategory, PatientRecord, Transport};
use crate::pipeline::Prediction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Healthy BMI interval used for the ideal weight range.
const HEALTHY_BMI: (f32, f32) = (18.5, 24.9);

/// Distance from the healthy midpoint still counted as near ideal, in kg.
const NEAR_IDEAL_KG: f32 = 5.0;

/// Body mass index, `weight / height²`.
///
/// `NaN` for a non-positive or non-finite height or a non-finite weight.
///
/// ```
/// use obesity_pipeline::clinical::bmi;
///
/// assert!((bmi(70.0, 1.70) - 24.22).abs() < 0.01);
/// assert!(bmi(70.0, 0.0).is_nan());
/// ```
#[must_use]
pub fn bmi(weight: f32, height: f32) -> f32 {
    if !(height.is_finite() && height > 0.0 && weight.is_finite()) {
        return f32::NAN;
    }
    weight / (height * height)
}

/// WHO-style BMI band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiBand {
    /// BMI < 18.5
    Underweight,
    /// 18.5 <= BMI < 25
    Normal,
    /// 25 <= BMI < 30
    Overweight,
    /// 30 <= BMI < 35
    ObesityI,
    /// 35 <= BMI < 40
    ObesityII,
    /// BMI >= 40
    ObesityIII,
}

impl BmiBand {
    /// Band of `bmi`; `None` for `NaN`.
    #[must_use]
    pub fn from_bmi(bmi: f32) -> Option<Self> {
        if bmi.is_nan() {
            return None;
        }
        Some(if bmi < 18.5 {
            Self::Underweight
        } else if bmi < 25.0 {
            Self::Normal
        } else if bmi < 30.0 {
            Self::Overweight
        } else if bmi < 35.0 {
            Self::ObesityI
        } else if bmi < 40.0 {
            Self::ObesityII
        } else {
            Self::ObesityIII
        })
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Underweight => "Underweight",
            Self::Normal => "Normal",
            Self::Overweight => "Overweight",
            Self::ObesityI => "Obesity I",
            Self::ObesityII => "Obesity II",
            Self::ObesityIII => "Obesity III",
        }
    }
}

/// Where a weight sits relative to the healthy range midpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightStatus {
    /// Within 5 kg of the midpoint
    NearIdeal,
    /// More than 5 kg above
    Above,
    /// More than 5 kg below
    Below,
}

/// Weight range giving a healthy BMI at a given height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IdealWeight {
    /// 18.5 · h²
    pub min: f32,
    /// 24.9 · h²
    pub max: f32,
    /// Midpoint of the range
    pub midpoint: f32,
}

impl IdealWeight {
    /// Range for `height` meters; `None` for a non-positive or non-finite height.
    #[must_use]
    pub fn for_height(height: f32) -> Option<Self> {
        if !(height.is_finite() && height > 0.0) {
            return None;
        }
        let h2 = height * height;
        let min = HEALTHY_BMI.0 * h2;
        let max = HEALTHY_BMI.1 * h2;
        Some(Self {
            min,
            max,
            midpoint: (min + max) / 2.0,
        })
    }

    /// Signed distance from the midpoint, in kg.
    #[must_use]
    pub fn difference(&self, weight: f32) -> f32 {
        weight - self.midpoint
    }

    /// Classifies `weight` against the midpoint.
    #[must_use]
    pub fn status(&self, weight: f32) -> WeightStatus {
        let diff = self.difference(weight);
        if diff.abs() <= NEAR_IDEAL_KG {
            WeightStatus::NearIdeal
        } else if diff > 0.0 {
            WeightStatus::Above
        } else {
            WeightStatus::Below
        }
    }
}

/// How sure the model is, from its top probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// >= 0.80
    High,
    /// >= 0.60
    Moderate,
    /// Below 0.60; a detailed medical assessment is advised
    Low,
}

impl Confidence {
    /// Level for a top-class probability in [0, 1].
    #[must_use]
    pub fn from_probability(p: f32) -> Self {
        if p >= 0.8 {
            Self::High
        } else if p >= 0.6 {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    /// One-line interpretation.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::High => "high confidence: the model is very sure of this prediction",
            Self::Moderate => "moderate confidence: consider additional clinical context",
            Self::Low => "low confidence: a detailed medical assessment is recommended",
        }
    }
}

/// How strongly a risk factor weighs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Worth attention
    Moderate,
    /// Clearly harmful
    Elevated,
    /// Major factor
    High,
}

/// Lifestyle or physiological risk factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    /// BMI >= 30
    HighBmi,
    /// Family history of overweight
    FamilyHistory,
    /// Frequent high-caloric food
    HighCaloricFood,
    /// Vegetable frequency below 2
    LowVegetables,
    /// Physical activity below 1
    Sedentary,
    /// Water intake below 2 liters
    LowHydration,
    /// Screen time of 1.5 or more
    ScreenTime,
    /// Smoker
    Smoking,
    /// Alcohol frequently or always
    FrequentAlcohol,
    /// Commutes by car
    CarTransport,
}

impl RiskFactor {
    /// Factors present in `record`, in a fixed order.
    ///
    /// ```
    /// use obesity_pipeline::clinical::RiskFactor;
    /// use obesity_pipeline::data::PatientRecord;
    ///
    /// let record: PatientRecord = serde_json::from_str(r#"{
    ///     "gender": "male", "age": 30, "height": 1.75, "weight": 100,
    ///     "family_history": "yes", "favc": "no", "fcvc": 2.5, "ncp": 3,
    ///     "caec": "sometimes", "smoke": "no", "ch2o": 2.5, "scc": "no",
    ///     "faf": 0.5, "tue": 1.0, "calc": "never", "transport": "walking"
    /// }"#).unwrap();
    /// let factors = RiskFactor::identify(&record);
    /// assert_eq!(factors, vec![RiskFactor::HighBmi, RiskFactor::FamilyHistory, RiskFactor::Sedentary]);
    /// ```
    #[must_use]
    pub fn identify(record: &PatientRecord) -> Vec<Self> {
        let checks = [
            (record.bmi() >= 30.0, Self::HighBmi),
            (record.family_history.is_yes(), Self::FamilyHistory),
            (record.favc.is_yes(), Self::HighCaloricFood),
            (record.fcvc < 2.0, Self::LowVegetables),
            (record.faf < 1.0, Self::Sedentary),
            (record.ch2o < 2.0, Self::LowHydration),
            (record.tue >= 1.5, Self::ScreenTime),
            (record.smoke.is_yes(), Self::Smoking),
            (
                matches!(record.calc, Frequency::Frequently | Frequency::Always),
                Self::FrequentAlcohol,
            ),
            (record.transport == Transport::Automobile, Self::CarTransport),
        ];
        checks
            .into_iter()
            .filter_map(|(present, factor)| present.then_some(factor))
            .collect()
    }

    /// Weight of this factor.
    #[must_use]
    pub const fn severity(self) -> Severity {
        match self {
            Self::HighBmi | Self::Sedentary | Self::Smoking => Severity::High,
            Self::FrequentAlcohol => Severity::Elevated,
            _ => Severity::Moderate,
        }
    }

    /// Display text.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::HighBmi => "elevated BMI (>= 30)",
            Self::FamilyHistory => "family history of obesity",
            Self::HighCaloricFood => "frequent high-caloric food",
            Self::LowVegetables => "low vegetable consumption",
            Self::Sedentary => "sedentary lifestyle (insufficient physical activity)",
            Self::LowHydration => "inadequate hydration",
            Self::ScreenTime => "excessive screen time",
            Self::Smoking => "smoking",
            Self::FrequentAlcohol => "frequent alcohol consumption",
            Self::CarTransport => "low physical activity in transport",
        }
    }
}

/// Action plan group of a predicted category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// Underweight
    GainWeight,
    /// Normal weight
    Maintain,
    /// Overweight I and II
    ReduceWeight,
    /// Obesity I to III
    MedicalFollowUp,
}

impl Recommendation {
    /// Group for `category`.
    #[must_use]
    pub const fn for_category(category: ObesityCategory) -> Self {
        match category {
            ObesityCategory::Underweight => Self::GainWeight,
            ObesityCategory::NormalWeight => Self::Maintain,
            ObesityCategory::OverweightI | ObesityCategory::OverweightII => Self::ReduceWeight,
            ObesityCategory::ObesityI | ObesityCategory::ObesityII | ObesityCategory::ObesityIII => {
                Self::MedicalFollowUp
            }
        }
    }

    /// Recommended actions, most important first.
    #[must_use]
    pub const fn actions(self) -> &'static [&'static str] {
        match self {
            Self::GainWeight => &[
                "consult a nutritionist for an adequate meal plan",
                "evaluate the need for nutritional supplementation",
                "investigate possible medical causes",
                "monitor healthy weight gain",
            ],
            Self::Maintain => &[
                "keep healthy eating habits",
                "continue regular physical activity",
                "maintain adequate hydration",
                "schedule regular preventive check-ups",
            ],
            Self::ReduceWeight => &[
                "adopt a balanced diet with a moderate caloric deficit",
                "increase physical activity to 150 minutes per week",
                "increase water intake",
                "monitor weight and measurements regularly",
                "consider nutritional follow-up",
            ],
            Self::MedicalFollowUp => &[
                "priority medical consultation for a complete assessment",
                "multidisciplinary follow-up (physician, nutritionist, physical educator)",
                "individualized and supervised meal plan",
                "adapted and progressive exercise program",
                "evaluate the need for drug treatment",
                "consider psychological support",
                "frequent monitoring of metabolic health",
            ],
        }
    }
}

/// A prediction together with its rule-based clinical reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalSummary {
    /// Model output
    pub prediction: Prediction,
    /// Body mass index
    pub bmi: f32,
    /// Band of [`ClinicalSummary::bmi`]
    pub bmi_band: Option<BmiBand>,
    /// Healthy weight range at the patient's height
    pub ideal_weight: Option<IdealWeight>,
    /// Patient weight against that range
    pub weight_status: Option<WeightStatus>,
    /// Level of the top probability
    pub confidence: Confidence,
    /// Factors present in the record
    pub risk_factors: Vec<RiskFactor>,
    /// Action plan for the predicted category
    pub recommendation: Recommendation,
}

impl ClinicalSummary {
    /// Builds the summary of `prediction` for `record`.
    #[must_use]
    pub fn new(record: &PatientRecord, prediction: Prediction) -> Self {
        let bmi = record.bmi();
        let ideal_weight = IdealWeight::for_height(record.height);
        Self {
            bmi,
            bmi_band: BmiBand::from_bmi(bmi),
            weight_status: ideal_weight.map(|range| range.status(record.weight)),
            ideal_weight,
            confidence: Confidence::from_probability(prediction.confidence()),
            risk_factors: RiskFactor::identify(record),
            recommendation: Recommendation::for_category(prediction.category),
            prediction,
        }
    }

    /// Probability table, most probable first.
    #[must_use]
    pub fn ranked_probabilities(&self) -> Vec<(ObesityCategory, f32)> {
        self.prediction.ranked()
    }
}

impl fmt::Display for ClinicalSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Predicted category: {} ({:.1}%)",
            self.prediction.category,
            self.prediction.confidence() * 100.0
        )?;
        writeln!(f, "Confidence: {}", self.confidence.description())?;
        match self.bmi_band {
            Some(band) => writeln!(f, "BMI: {:.2} ({})", self.bmi, band.label())?,
            None => writeln!(f, "BMI: unavailable")?,
        }
        if let (Some(range), Some(status)) = (self.ideal_weight, self.weight_status) {
            let status = match status {
                WeightStatus::NearIdeal => "near ideal",
                WeightStatus::Above => "above ideal",
                WeightStatus::Below => "below ideal",
            };
            writeln!(
                f,
                "Ideal weight: {:.1} - {:.1} kg ({status})",
                range.min, range.max
            )?;
        }

        writeln!(f, "\nProbabilities:")?;
        for (category, p) in self.ranked_probabilities() {
            writeln!(f, "  {:<14} {:>6.2}%", category.label(), p * 100.0)?;
        }

        writeln!(f, "\nRisk factors:")?;
        if self.risk_factors.is_empty() {
            writeln!(f, "  none identified")?;
        }
        for factor in &self.risk_factors {
            writeln!(f, "  - {}", factor.description())?;
        }

        writeln!(f, "\nRecommended actions:")?;
        for action in self.recommendation.actions() {
            writeln!(f, "  - {action}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Gender, YesNo};
    use crate::preprocessing::EncodingNotes;

    fn record(weight: f32, height: f32) -> PatientRecord {
        PatientRecord {
            gender: Gender::Female,
            age: 23.0,
            height,
            weight,
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

    fn prediction(category: ObesityCategory, top: f32) -> Prediction {
        let rest = (1.0 - top) / 6.0;
        let mut probabilities = vec![rest; 7];
        probabilities[category.index()] = top;
        Prediction {
            category,
            probabilities,
            notes: EncodingNotes::default(),
        }
    }

    #[test]
    fn test_bmi_bands() {
        assert_eq!(BmiBand::from_bmi(18.49), Some(BmiBand::Underweight));
        assert_eq!(BmiBand::from_bmi(18.5), Some(BmiBand::Normal));
        assert_eq!(BmiBand::from_bmi(24.22), Some(BmiBand::Normal));
        assert_eq!(BmiBand::from_bmi(29.99), Some(BmiBand::Overweight));
        assert_eq!(BmiBand::from_bmi(30.0), Some(BmiBand::ObesityI));
        assert_eq!(BmiBand::from_bmi(39.9), Some(BmiBand::ObesityII));
        assert_eq!(BmiBand::from_bmi(58.6), Some(BmiBand::ObesityIII));
        assert_eq!(BmiBand::from_bmi(f32::NAN), None);
    }

    #[test]
    fn test_ideal_weight() {
        let range = IdealWeight::for_height(1.70).unwrap();
        assert!((range.min - 53.465).abs() < 1e-3);
        assert!((range.max - 71.961).abs() < 1e-3);
        assert_eq!(range.status(62.0), WeightStatus::NearIdeal);
        assert_eq!(range.status(70.0), WeightStatus::Above);
        assert_eq!(range.status(55.0), WeightStatus::Below);
        assert!(IdealWeight::for_height(0.0).is_none());
    }

    #[test]
    fn test_confidence_thresholds() {
        assert_eq!(Confidence::from_probability(0.8), Confidence::High);
        assert_eq!(Confidence::from_probability(0.79), Confidence::Moderate);
        assert_eq!(Confidence::from_probability(0.6), Confidence::Moderate);
        assert_eq!(Confidence::from_probability(0.59), Confidence::Low);
    }

    #[test]
    fn test_risk_factors_for_scenario_record() {
        let factors = RiskFactor::identify(&record(70.0, 1.70));
        assert_eq!(
            factors,
            vec![RiskFactor::FamilyHistory, RiskFactor::HighCaloricFood]
        );
    }

    #[test]
    fn test_all_risk_factors() {
        let mut r = record(150.0, 1.60);
        r.fcvc = 1.0;
        r.faf = 0.0;
        r.ch2o = 1.0;
        r.tue = 2.0;
        r.smoke = YesNo::Yes;
        r.calc = Frequency::Always;
        r.transport = Transport::Automobile;
        let factors = RiskFactor::identify(&r);
        assert_eq!(factors.len(), 10);
        assert_eq!(factors[0], RiskFactor::HighBmi);
        assert_eq!(factors[0].severity(), Severity::High);
        assert_eq!(RiskFactor::FrequentAlcohol.severity(), Severity::Elevated);
    }

    #[test]
    fn test_recommendation_groups() {
        assert_eq!(
            Recommendation::for_category(ObesityCategory::OverweightII),
            Recommendation::ReduceWeight
        );
        assert_eq!(
            Recommendation::for_category(ObesityCategory::ObesityI),
            Recommendation::MedicalFollowUp
        );
        assert_eq!(Recommendation::MedicalFollowUp.actions().len(), 7);
    }

    #[test]
    fn test_summary_text() {
        let summary = ClinicalSummary::new(
            &record(70.0, 1.70),
            prediction(ObesityCategory::NormalWeight, 0.7),
        );
        assert_eq!(summary.bmi_band, Some(BmiBand::Normal));
        assert_eq!(summary.confidence, Confidence::Moderate);
        assert_eq!(summary.weight_status, Some(WeightStatus::Above));
        assert_eq!(
            summary.ranked_probabilities()[0].0,
            ObesityCategory::NormalWeight
        );
        let text = summary.to_string();
        assert!(text.contains("Predicted category: Normal Weight (70.0%)"));
        assert!(text.contains("BMI: 24.22 (Normal)"));
        assert!(text.contains("keep healthy eating habits"));
    }
}
