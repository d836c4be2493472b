mod ingredient;
mod product;
mod profile;
mod recommendation;

pub use ingredient::{IngredientMatch, IngredientPair, OntologyConfidence, SemanticIngredient};
pub use product::{
    CatalogProduct, ConfidenceLevel, ProductCandidate, SafetyAnalysis, SafetyFlag, SafetyFlags,
    SafetyStatus,
};
pub use profile::{GuestProfile, RecommendationRequest, Sensitivity, SkinType};
pub use recommendation::{
    AlgorithmTier, Recommendation, RecommendationMetadata, RecommendationResponse,
};
