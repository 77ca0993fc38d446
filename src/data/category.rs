//! Strongly typed categorical attributes and the obesity target label.

use super::schema::{normalize_key, Domain};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Common behaviour of the finite-domain attribute enums.
pub trait CategoricalValue: Sized + Copy + 'static {
    /// Domain the enum represents.
    const DOMAIN: Domain;
    /// All values in declaration order.
    const ALL: &'static [Self];

    /// Canonical token, identical to the encoder vocabulary entry.
    fn token(self) -> &'static str;

    /// Parses any accepted spelling; `None` for values outside the domain.
    fn parse(raw: &str) -> Option<Self> {
        let canonical = Self::DOMAIN.normalize(raw);
        Self::ALL.iter().copied().find(|v| v.token() == canonical)
    }
}

/// Biological gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    /// Male
    Male,
    /// Female
    Female,
}

impl CategoricalValue for Gender {
    const DOMAIN: Domain = Domain::Gender;
    const ALL: &'static [Self] = &[Self::Male, Self::Female];

    fn token(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

/// Binary answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YesNo {
    /// Yes
    Yes,
    /// No
    No,
}

impl YesNo {
    /// Returns true for [`YesNo::Yes`].
    #[must_use]
    pub fn is_yes(self) -> bool {
        self == Self::Yes
    }
}

impl CategoricalValue for YesNo {
    const DOMAIN: Domain = Domain::YesNo;
    const ALL: &'static [Self] = &[Self::Yes, Self::No];

    fn token(self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
        }
    }
}

/// Ordinal frequency used by snacking (CAEC) and alcohol (CALC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// Never
    Never,
    /// Sometimes
    Sometimes,
    /// Frequently
    Frequently,
    /// Always
    Always,
}

impl CategoricalValue for Frequency {
    const DOMAIN: Domain = Domain::Frequency;
    const ALL: &'static [Self] = &[
        Self::Never,
        Self::Sometimes,
        Self::Frequently,
        Self::Always,
    ];

    fn token(self) -> &'static str {
        match self {
            Self::Never => "never",
            Self::Sometimes => "sometimes",
            Self::Frequently => "frequently",
            Self::Always => "always",
        }
    }
}

/// Primary transportation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    /// Public transportation
    PublicTransit,
    /// Walking
    Walking,
    /// Car
    Automobile,
    /// Motorbike
    Motorcycle,
    /// Bike
    Bicycle,
}

impl CategoricalValue for Transport {
    const DOMAIN: Domain = Domain::Transport;
    const ALL: &'static [Self] = &[
        Self::PublicTransit,
        Self::Walking,
        Self::Automobile,
        Self::Motorcycle,
        Self::Bicycle,
    ];

    fn token(self) -> &'static str {
        match self {
            Self::PublicTransit => "public_transit",
            Self::Walking => "walking",
            Self::Automobile => "automobile",
            Self::Motorcycle => "motorcycle",
            Self::Bicycle => "bicycle",
        }
    }
}

/// Seven ordered obesity categories, in increasing severity.
///
/// The discriminant is the class index used by the classifier.
///
/// ```
/// use obesity_pipeline::data::ObesityCategory;
///
/// let c = ObesityCategory::parse("Obesity_Type_II").expect("dataset spelling");
/// assert_eq!(c, ObesityCategory::ObesityII);
/// assert_eq!(c.index(), 5);
/// assert!(c.is_obese());
/// assert!(ObesityCategory::Underweight < ObesityCategory::NormalWeight);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ObesityCategory {
    /// Insufficient weight
    Underweight = 0,
    /// Normal weight
    NormalWeight = 1,
    /// Overweight level I
    OverweightI = 2,
    /// Overweight level II
    #[serde(rename = "overweight_ii")]
    OverweightII = 3,
    /// Obesity type I
    ObesityI = 4,
    /// Obesity type II
    #[serde(rename = "obesity_ii")]
    ObesityII = 5,
    /// Obesity type III
    #[serde(rename = "obesity_iii")]
    ObesityIII = 6,
}

impl ObesityCategory {
    /// Number of categories.
    pub const COUNT: usize = 7;

    /// All categories in severity order.
    pub const ALL: [Self; 7] = [
        Self::Underweight,
        Self::NormalWeight,
        Self::OverweightI,
        Self::OverweightII,
        Self::ObesityI,
        Self::ObesityII,
        Self::ObesityIII,
    ];

    /// Class index (0 = Underweight, 6 = Obesity III).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Inverse of [`ObesityCategory::index`].
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Underweight => "Underweight",
            Self::NormalWeight => "Normal Weight",
            Self::OverweightI => "Overweight I",
            Self::OverweightII => "Overweight II",
            Self::ObesityI => "Obesity I",
            Self::ObesityII => "Obesity II",
            Self::ObesityIII => "Obesity III",
        }
    }

    /// Spelling used by the public dataset's target column.
    #[must_use]
    pub const fn dataset_label(self) -> &'static str {
        match self {
            Self::Underweight => "Insufficient_Weight",
            Self::NormalWeight => "Normal_Weight",
            Self::OverweightI => "Overweight_Level_I",
            Self::OverweightII => "Overweight_Level_II",
            Self::ObesityI => "Obesity_Type_I",
            Self::ObesityII => "Obesity_Type_II",
            Self::ObesityIII => "Obesity_Type_III",
        }
    }

    /// Parses dataset, Portuguese, or snake-case spellings.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match normalize_key(raw).as_str() {
            "insufficient_weight" | "underweight" | "baixo_peso" => Some(Self::Underweight),
            "normal_weight" | "peso_normal" => Some(Self::NormalWeight),
            "overweight_level_i" | "overweight_i" | "sobrepeso_i" => Some(Self::OverweightI),
            "overweight_level_ii" | "overweight_ii" | "sobrepeso_ii" => Some(Self::OverweightII),
            "obesity_type_i" | "obesity_i" | "obesidade_i" => Some(Self::ObesityI),
            "obesity_type_ii" | "obesity_ii" | "obesidade_ii" => Some(Self::ObesityII),
            "obesity_type_iii" | "obesity_iii" | "obesidade_iii" => Some(Self::ObesityIII),
            _ => None,
        }
    }

    /// Obesity I, II or III.
    #[must_use]
    pub const fn is_obese(self) -> bool {
        matches!(self, Self::ObesityI | Self::ObesityII | Self::ObesityIII)
    }

    /// Overweight I or II.
    #[must_use]
    pub const fn is_overweight(self) -> bool {
        matches!(self, Self::OverweightI | Self::OverweightII)
    }
}

impl fmt::Display for ObesityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
