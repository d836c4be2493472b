use serde::Serialize;

use super::{IngredientMatch, IngredientPair, Sensitivity};

/// Tri-state catalog flag; `NULL` in the catalog reads as `Unknown`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyFlag {
    True,
    False,
    #[default]
    Unknown,
}

impl From<Option<bool>> for SafetyFlag {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => SafetyFlag::True,
            Some(false) => SafetyFlag::False,
            None => SafetyFlag::Unknown,
        }
    }
}

/// The five independent "free-from" flags carried by every catalog product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SafetyFlags {
    pub fragrance_free: SafetyFlag,
    pub alcohol_free: SafetyFlag,
    pub paraben_free: SafetyFlag,
    pub sulfate_free: SafetyFlag,
    pub silicone_free: SafetyFlag,
}

impl SafetyFlags {
    pub fn flag_for(&self, sensitivity: Sensitivity) -> SafetyFlag {
        match sensitivity {
            Sensitivity::Fragrance => self.fragrance_free,
            Sensitivity::Alcohol => self.alcohol_free,
            Sensitivity::Paraben => self.paraben_free,
            Sensitivity::Sulfate => self.sulfate_free,
            Sensitivity::Silicone => self.silicone_free,
        }
    }

    /// Hard safety filter: a product is excluded only when a declared
    /// sensitivity's flag is explicitly `False`. `Unknown` always passes.
    pub fn admits(&self, sensitivities: &[Sensitivity]) -> bool {
        sensitivities
            .iter()
            .all(|s| self.flag_for(*s) != SafetyFlag::False)
    }
}

/// Active product as read from the catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogProduct {
    pub id: i64,
    pub name: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub url: Option<String>,
    pub image_path: Option<String>,
    pub ingredient_list: String,
    #[serde(flatten)]
    pub safety: SafetyFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyStatus {
    Safe,
    Excellent,
    CautionNeeded,
}

/// Outcome of the pairwise interaction check for one candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafetyAnalysis {
    pub conflicts_detected: usize,
    pub synergies_found: usize,
    pub overall_safety_status: SafetyStatus,
    pub conflicts: Vec<IngredientPair>,
    pub synergies: Vec<IngredientPair>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl SafetyAnalysis {
    pub fn from_relations(
        conflicts: Vec<IngredientPair>,
        synergies: Vec<IngredientPair>,
        notes: Vec<String>,
    ) -> Self {
        let overall_safety_status = if !conflicts.is_empty() {
            SafetyStatus::CautionNeeded
        } else if !synergies.is_empty() {
            SafetyStatus::Excellent
        } else {
            SafetyStatus::Safe
        };

        Self {
            conflicts_detected: conflicts.len(),
            synergies_found: synergies.len(),
            overall_safety_status,
            conflicts,
            synergies,
            notes,
        }
    }

    /// `Safe` with an explicit note explaining why nothing was checked
    pub fn not_analyzed(note: impl Into<String>) -> Self {
        Self::from_relations(Vec::new(), Vec::new(), vec![note.into()])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

/// A product under consideration, with every score the ranking needs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductCandidate {
    #[serde(flatten)]
    pub product: CatalogProduct,
    /// Label ingredients in label order, capped for pairwise matching
    #[serde(skip)]
    pub parsed_ingredients: Vec<String>,
    pub matched_semantic_ingredients: Vec<IngredientMatch>,
    pub semantic_score: f64,
    pub mapping_score: f64,
    pub safety_score: f64,
    pub final_score: u32,
    pub confidence_level: ConfidenceLevel,
    pub safety_analysis: SafetyAnalysis,
}

impl ProductCandidate {
    /// Unscored candidate; scores are filled in by the hybrid scorer
    pub fn new(
        product: CatalogProduct,
        parsed_ingredients: Vec<String>,
        matched_semantic_ingredients: Vec<IngredientMatch>,
    ) -> Self {
        Self {
            product,
            parsed_ingredients,
            matched_semantic_ingredients,
            semantic_score: 0.0,
            mapping_score: 0.0,
            safety_score: 0.0,
            final_score: 0,
            confidence_level: ConfidenceLevel::Low,
            safety_analysis: SafetyAnalysis::not_analyzed("interaction analysis pending"),
        }
    }
}
