use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Display;

use super::{ConfidenceLevel, ProductCandidate};

/// Tier of the fallback chain that produced a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmTier {
    SemanticReasoning,
    BasicOntologyFallback,
    DatabaseBasicFallback,
    EmergencyFallback,
}

impl AlgorithmTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlgorithmTier::SemanticReasoning => "semantic_reasoning",
            AlgorithmTier::BasicOntologyFallback => "basic_ontology_fallback",
            AlgorithmTier::DatabaseBasicFallback => "database_basic_fallback",
            AlgorithmTier::EmergencyFallback => "emergency_fallback",
        }
    }

    /// Confidence reported for a response produced by this tier
    pub fn confidence(&self) -> ConfidenceLevel {
        match self {
            AlgorithmTier::SemanticReasoning => ConfidenceLevel::High,
            AlgorithmTier::BasicOntologyFallback => ConfidenceLevel::Medium,
            AlgorithmTier::DatabaseBasicFallback | AlgorithmTier::EmergencyFallback => {
                ConfidenceLevel::Low
            }
        }
    }

    pub fn is_primary(&self) -> bool {
        matches!(self, AlgorithmTier::SemanticReasoning)
    }
}

impl Display for AlgorithmTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A ranked product with its rationale
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    #[serde(flatten)]
    pub candidate: ProductCandidate,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationMetadata {
    pub algorithm_type: AlgorithmTier,
    pub confidence: ConfidenceLevel,
    pub processing_time_ms: u64,
    /// Every tier attempted, in order, ending with `algorithm_type`
    pub fallback_path: Vec<AlgorithmTier>,
    pub generated_at: DateTime<Utc>,
}

/// Response contract shared by every tier
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<Recommendation>,
    pub metadata: RecommendationMetadata,
    pub explanation: String,
}
