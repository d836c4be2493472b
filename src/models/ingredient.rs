use serde::{Deserialize, Serialize};

/// How strongly the ontology supports an ingredient for the requested profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OntologyConfidence {
    Low,
    Medium,
    High,
    VeryHigh,
}

/// Ingredient surfaced by the knowledge graph for a skin type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticIngredient {
    pub name: String,
    pub benefit: Option<String>,
    pub function: Option<String>,
    /// Relevance to the guest's concerns, in [0, 1]
    pub concern_relevance_score: f64,
    pub ontology_confidence: OntologyConfidence,
}

/// A semantic ingredient found on a product label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngredientMatch {
    #[serde(flatten)]
    pub ingredient: SemanticIngredient,
    /// Label text the ingredient matched
    pub product_ingredient: String,
    pub similarity: f64,
}

/// Unordered pair of ingredients joined by an interaction relation
///
/// The members are stored in case-insensitive order so `(A, B)` and `(B, A)`
/// compare equal regardless of the direction the graph stores the relation in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngredientPair {
    pub first: String,
    pub second: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl IngredientPair {
    pub fn new(a: impl Into<String>, b: impl Into<String>, detail: Option<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        let (first, second) = if a.to_lowercase() <= b.to_lowercase() {
            (a, b)
        } else {
            (b, a)
        };
        Self {
            first,
            second,
            detail,
        }
    }

    /// Case-insensitive identity of the pair
    pub fn key(&self) -> (String, String) {
        (self.first.to_lowercase(), self.second.to_lowercase())
    }

    pub fn is_self_pair(&self) -> bool {
        let (first, second) = self.key();
        first == second
    }
}
