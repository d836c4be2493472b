use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Display;
use std::str::FromStr;

/// Skin type declared by the guest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkinType {
    Normal,
    Dry,
    Oily,
    Combination,
    Sensitive,
}

impl SkinType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkinType::Normal => "normal",
            SkinType::Dry => "dry",
            SkinType::Oily => "oily",
            SkinType::Combination => "combination",
            SkinType::Sensitive => "sensitive",
        }
    }

    /// Local name of the skin-type individual in the ontology
    pub fn ontology_node(&self) -> &'static str {
        match self {
            SkinType::Normal => "NormalSkin",
            SkinType::Dry => "DrySkin",
            SkinType::Oily => "OilySkin",
            SkinType::Combination => "CombinationSkin",
            SkinType::Sensitive => "SensitiveSkin",
        }
    }
}

impl Display for SkinType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SkinType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Ok(SkinType::Normal),
            "dry" => Ok(SkinType::Dry),
            "oily" => Ok(SkinType::Oily),
            "combination" => Ok(SkinType::Combination),
            "sensitive" => Ok(SkinType::Sensitive),
            other => Err(format!("unknown skin type: {}", other)),
        }
    }
}

/// Ingredient sensitivity that maps onto one of the catalog's safety flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    Fragrance,
    Alcohol,
    Paraben,
    Sulfate,
    Silicone,
}

impl Sensitivity {
    /// Recognizes free-text sensitivity declarations ("fragrances", "Sulphates", ...)
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim().to_lowercase();
        if raw.contains("fragrance") || raw.contains("parfum") || raw.contains("perfume") {
            Some(Sensitivity::Fragrance)
        } else if raw.contains("alcohol") {
            Some(Sensitivity::Alcohol)
        } else if raw.contains("paraben") {
            Some(Sensitivity::Paraben)
        } else if raw.contains("sulfate") || raw.contains("sulphate") {
            Some(Sensitivity::Sulfate)
        } else if raw.contains("silicone") {
            Some(Sensitivity::Silicone)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sensitivity::Fragrance => "fragrance",
            Sensitivity::Alcohol => "alcohol",
            Sensitivity::Paraben => "paraben",
            Sensitivity::Sulfate => "sulfate",
            Sensitivity::Silicone => "silicone",
        }
    }
}

/// Immutable, request-scoped description of the guest
///
/// Concerns and sensitivities are normalized (trimmed, lowercased, deduplicated)
/// and kept in sorted sets so every downstream step iterates them in the same
/// order for the same input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuestProfile {
    pub skin_type: SkinType,
    pub concerns: BTreeSet<String>,
    pub sensitivities: BTreeSet<String>,
}

impl GuestProfile {
    pub fn new<C, S>(skin_type: SkinType, concerns: C, sensitivities: S) -> Self
    where
        C: IntoIterator,
        C::Item: AsRef<str>,
        S: IntoIterator,
        S::Item: AsRef<str>,
    {
        Self {
            skin_type,
            concerns: normalize_set(concerns),
            sensitivities: normalize_set(sensitivities),
        }
    }

    /// Declared sensitivities that correspond to a catalog safety flag
    pub fn declared_sensitivities(&self) -> Vec<Sensitivity> {
        let recognized: BTreeSet<Sensitivity> = self
            .sensitivities
            .iter()
            .filter_map(|raw| {
                let parsed = Sensitivity::parse(raw);
                if parsed.is_none() {
                    tracing::debug!(sensitivity = %raw, "Ignoring unrecognized sensitivity");
                }
                parsed
            })
            .collect();
        recognized.into_iter().collect()
    }
}

fn normalize_set<I>(values: I) -> BTreeSet<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    values
        .into_iter()
        .map(|v| v.as_ref().trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Body of a recommendation request
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationRequest {
    pub skin_type: SkinType,
    #[serde(default)]
    pub concerns: Vec<String>,
    #[serde(default)]
    pub sensitivities: Vec<String>,
}

impl From<RecommendationRequest> for GuestProfile {
    fn from(request: RecommendationRequest) -> Self {
        GuestProfile::new(request.skin_type, request.concerns, request.sensitivities)
    }
}
