//! Column schema and categorical spelling normalization.
//!
//! Every attribute is addressed by a canonical lower-case name. Dataset
//! headers and value spellings (English dataset codes, Portuguese form
//! labels) are mapped onto these canonical forms before anything is encoded.

/// Finite value domain of a categorical attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    /// male / female
    Gender,
    /// yes / no
    YesNo,
    /// never / sometimes / frequently / always
    Frequency,
    /// primary transportation mode
    Transport,
}

impl Domain {
    /// Canonical tokens of this domain, in declaration order.
    #[must_use]
    pub const fn tokens(self) -> &'static [&'static str] {
        match self {
            Self::Gender => &["male", "female"],
            Self::YesNo => &["yes", "no"],
            Self::Frequency => &["never", "sometimes", "frequently", "always"],
            Self::Transport => &[
                "public_transit",
                "walking",
                "automobile",
                "motorcycle",
                "bicycle",
            ],
        }
    }

    /// Maps a raw spelling onto this domain's canonical token.
    ///
    /// Spellings outside the alias table come back as their normalized key
    /// (trimmed, lower-cased, separators folded to `_`), so the encoder's
    /// unknown-category rule applies to them instead of an arbitrary remap.
    ///
    /// ```
    /// use obesity_pipeline::data::schema::Domain;
    ///
    /// assert_eq!(Domain::Frequency.normalize("no"), "never");
    /// assert_eq!(Domain::YesNo.normalize("no"), "no");
    /// assert_eq!(Domain::Transport.normalize("Public_Transportation"), "public_transit");
    /// assert_eq!(Domain::Transport.normalize("Hoverboard"), "hoverboard");
    /// ```
    #[must_use]
    pub fn normalize(self, raw: &str) -> String {
        let key = normalize_key(raw);
        let canonical = match self {
            Self::Gender => match key.as_str() {
                "male" | "m" | "masculino" => Some("male"),
                "female" | "f" | "feminino" => Some("female"),
                _ => None,
            },
            Self::YesNo => match key.as_str() {
                "yes" | "y" | "sim" | "true" => Some("yes"),
                "no" | "n" | "não" | "nao" | "false" => Some("no"),
                _ => None,
            },
            Self::Frequency => match key.as_str() {
                "never" | "no" | "não" | "nao" | "nunca" => Some("never"),
                "sometimes" | "às_vezes" | "as_vezes" => Some("sometimes"),
                "frequently" | "frequentemente" => Some("frequently"),
                "always" | "sempre" => Some("always"),
                _ => None,
            },
            Self::Transport => match key.as_str() {
                "public_transit"
                | "public_transportation"
                | "transporte_público"
                | "transporte_publico" => Some("public_transit"),
                "walking" | "caminhada" => Some("walking"),
                "automobile" | "car" | "automóvel" | "automovel" => Some("automobile"),
                "motorcycle" | "motorbike" | "motocicleta" => Some("motorcycle"),
                "bicycle" | "bike" | "bicicleta" => Some("bicycle"),
                _ => None,
            },
        };
        canonical.map_or(key, str::to_string)
    }
}

/// Whether an attribute is standardized or one-hot encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    /// Continuous value, standardized with frozen mean/std.
    Numeric,
    /// Finite-domain value, one-hot encoded against the training vocabulary.
    Categorical(Domain),
}

/// One input attribute: canonical name, accepted dataset headers, kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSpec {
    /// Canonical name used as the encoding key
    pub name: &'static str,
    /// Dataset header spellings, English and Portuguese (matched after [`normalize_key`])
    pub header_aliases: &'static [&'static str],
    /// Encoding kind
    pub kind: FeatureKind,
}

impl FeatureSpec {
    const fn numeric(name: &'static str, header_aliases: &'static [&'static str]) -> Self {
        Self {
            name,
            header_aliases,
            kind: FeatureKind::Numeric,
        }
    }

    const fn categorical(
        name: &'static str,
        header_aliases: &'static [&'static str],
        domain: Domain,
    ) -> Self {
        Self {
            name,
            header_aliases,
            kind: FeatureKind::Categorical(domain),
        }
    }

    /// Returns true if `header` names this attribute.
    #[must_use]
    pub fn matches_header(&self, header: &str) -> bool {
        let header = normalize_key(header);
        header == self.name
            || self
                .header_aliases
                .iter()
                .any(|alias| header == normalize_key(alias))
    }
}

/// The 16 input attributes in dataset column order.
pub const FEATURES: [FeatureSpec; 16] = [
    FeatureSpec::categorical("gender", &["Gender", "Gênero"], Domain::Gender),
    FeatureSpec::numeric("age", &["Age", "Idade"]),
    FeatureSpec::numeric("height", &["Height", "Altura"]),
    FeatureSpec::numeric("weight", &["Weight", "Peso"]),
    FeatureSpec::categorical(
        "family_history",
        &["family_history_with_overweight", "Histórico Familiar"],
        Domain::YesNo,
    ),
    FeatureSpec::categorical("favc", &["FAVC"], Domain::YesNo),
    FeatureSpec::numeric("fcvc", &["FCVC"]),
    FeatureSpec::numeric("ncp", &["NCP"]),
    FeatureSpec::categorical("caec", &["CAEC"], Domain::Frequency),
    FeatureSpec::categorical("smoke", &["SMOKE", "Fuma"], Domain::YesNo),
    FeatureSpec::numeric("ch2o", &["CH2O", "Água por dia"]),
    FeatureSpec::categorical("scc", &["SCC", "SNC", "Conta Calorias"], Domain::YesNo),
    FeatureSpec::numeric("faf", &["FAF", "Atividade Física"]),
    FeatureSpec::numeric("tue", &["TUE", "Tempo em Telas"]),
    FeatureSpec::categorical("calc", &["CALC", "Álcool"], Domain::Frequency),
    FeatureSpec::categorical("transport", &["MTRANS", "Transporte"], Domain::Transport),
];

/// Numeric attributes in encoded-column order.
pub const NUMERIC_FEATURES: [&str; 8] = [
    "age", "height", "weight", "fcvc", "ncp", "ch2o", "faf", "tue",
];

/// Categorical attributes in encoded-block order.
pub const CATEGORICAL_FEATURES: [&str; 8] = [
    "gender",
    "family_history",
    "favc",
    "caec",
    "smoke",
    "scc",
    "calc",
    "transport",
];

/// Accepted spellings of the target column header.
pub const TARGET_ALIASES: [&str; 4] = ["Obesity", "NObeyesdad", "obesity_level", "Obesidade"];

/// Looks up an attribute by canonical name.
#[must_use]
pub fn feature(name: &str) -> Option<&'static FeatureSpec> {
    FEATURES.iter().find(|spec| spec.name == name)
}

/// Looks up an attribute by canonical name or any dataset header alias.
///
/// ```
/// use obesity_pipeline::data::schema::resolve;
///
/// assert_eq!(resolve("MTRANS").map(|f| f.name), Some("transport"));
/// assert_eq!(resolve("family_history_with_overweight").map(|f| f.name), Some("family_history"));
/// assert!(resolve("shoe_size").is_none());
/// ```
#[must_use]
pub fn resolve(header: &str) -> Option<&'static FeatureSpec> {
    FEATURES.iter().find(|spec| spec.matches_header(header))
}

/// Returns true if `header` names the target column.
#[must_use]
pub fn is_target_header(header: &str) -> bool {
    let header = normalize_key(header);
    TARGET_ALIASES
        .iter()
        .any(|alias| header == normalize_key(alias))
}

/// Trims, lower-cases, and folds spaces and hyphens to underscores.
#[must_use]
pub fn normalize_key(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_lists_partition_schema() {
        let mut names: Vec<&str> = NUMERIC_FEATURES
            .iter()
            .chain(CATEGORICAL_FEATURES.iter())
            .copied()
            .collect();
        names.sort_unstable();
        let mut schema: Vec<&str> = FEATURES.iter().map(|f| f.name).collect();
        schema.sort_unstable();
        assert_eq!(names, schema);
    }

    #[test]
    fn test_numeric_list_matches_kinds() {
        for name in NUMERIC_FEATURES {
            let spec = feature(name).expect("numeric feature is in schema");
            assert_eq!(spec.kind, FeatureKind::Numeric);
        }
        for name in CATEGORICAL_FEATURES {
            let spec = feature(name).expect("categorical feature is in schema");
            assert!(matches!(spec.kind, FeatureKind::Categorical(_)));
        }
    }

    #[test]
    fn test_header_aliases_case_insensitive() {
        let fh = feature("family_history").expect("in schema");
        assert!(fh.matches_header("Family_History_With_Overweight"));
        assert!(fh.matches_header("family_history"));
        assert!(!fh.matches_header("history"));
        assert!(feature("scc").expect("in schema").matches_header("SNC"));
        assert!(feature("transport").expect("in schema").matches_header(" MTRANS "));
    }

    #[test]
    fn test_portuguese_headers() {
        assert_eq!(resolve("Gênero").map(|f| f.name), Some("gender"));
        assert_eq!(resolve("Histórico Familiar").map(|f| f.name), Some("family_history"));
        assert_eq!(resolve("ÁGUA POR DIA").map(|f| f.name), Some("ch2o"));
        assert_eq!(resolve("atividade física").map(|f| f.name), Some("faf"));
        assert_eq!(resolve("Conta Calorias").map(|f| f.name), Some("scc"));
        assert_eq!(resolve("Transporte").map(|f| f.name), Some("transport"));
        assert!(is_target_header("Obesidade"));
    }

    #[test]
    fn test_target_header() {
        assert!(is_target_header("NObeyesdad"));
        assert!(is_target_header("obesity"));
        assert!(!is_target_header("Weight"));
    }

    #[test]
    fn test_portuguese_spellings() {
        assert_eq!(Domain::Gender.normalize("Feminino"), "female");
        assert_eq!(Domain::YesNo.normalize("Não"), "no");
        assert_eq!(Domain::YesNo.normalize("Sim"), "yes");
        assert_eq!(Domain::Frequency.normalize("Às vezes"), "sometimes");
        assert_eq!(Domain::Transport.normalize("Transporte público"), "public_transit");
        assert_eq!(Domain::Transport.normalize("Motocicleta"), "motorcycle");
    }

    #[test]
    fn test_dataset_spellings() {
        assert_eq!(Domain::Gender.normalize("Male"), "male");
        assert_eq!(Domain::Frequency.normalize("Sometimes"), "sometimes");
        assert_eq!(Domain::Frequency.normalize("no"), "never");
        assert_eq!(Domain::Transport.normalize("Motorbike"), "motorcycle");
        assert_eq!(Domain::Transport.normalize("Bike"), "bicycle");
    }

    #[test]
    fn test_every_canonical_token_is_fixed_point() {
        for domain in [
            Domain::Gender,
            Domain::YesNo,
            Domain::Frequency,
            Domain::Transport,
        ] {
            for token in domain.tokens() {
                assert_eq!(domain.normalize(token), *token);
            }
        }
    }

    #[test]
    fn test_unknown_spelling_is_not_remapped() {
        assert_eq!(Domain::Gender.normalize("  Other "), "other");
        assert_eq!(Domain::Frequency.normalize("Rarely"), "rarely");
    }
}
