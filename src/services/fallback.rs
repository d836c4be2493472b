use std::fmt::Display;

use crate::error::AppError;
use crate::models::AlgorithmTier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    Tier(AlgorithmTier),
    /// Terminal failure: every data source was unavailable
    Error,
}

impl ChainState {
    pub const INITIAL: ChainState = ChainState::Tier(AlgorithmTier::SemanticReasoning);
}

impl Display for ChainState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChainState::Tier(tier) => write!(f, "{}", tier),
            ChainState::Error => write!(f, "error"),
        }
    }
}

/// Why a tier did not produce a result
#[derive(Debug, Clone, PartialEq)]
pub enum TierSignal {
    /// The graph answered, but with no ingredients
    NoSemanticIngredients,
    /// The graph query failed or timed out
    GraphUnavailable(String),
    /// Nothing in the catalog survived mapping and filtering
    NoCandidates,
    /// Unexpected failure while mapping, scoring or analyzing
    MappingFailed(String),
    /// The tier's own catalog retrieval failed
    RetrievalFailed(String),
}

impl TierSignal {
    /// Classifies an error raised inside a tier
    pub fn from_error(error: &AppError) -> Self {
        match error {
            AppError::RepositoryFailure(reason) => TierSignal::RetrievalFailed(reason.clone()),
            other => TierSignal::MappingFailed(other.to_string()),
        }
    }
}

impl Display for TierSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TierSignal::NoSemanticIngredients => write!(f, "no semantic ingredients"),
            TierSignal::GraphUnavailable(reason) => write!(f, "graph unavailable: {}", reason),
            TierSignal::NoCandidates => write!(f, "no candidates"),
            TierSignal::MappingFailed(reason) => write!(f, "mapping failed: {}", reason),
            TierSignal::RetrievalFailed(reason) => write!(f, "retrieval failed: {}", reason),
        }
    }
}

/// Next state after `from` failed with `signal`
///
/// ```text
/// SemanticReasoning ──no ingredients──▶ BasicOntologyFallback ──no ingredients──▶ DatabaseBasicFallback
///        │                                   │
///        └──graph unavailable / no candidates / mapping failure──▶ DatabaseBasicFallback
///
///   any tier: repository failure ──▶ EmergencyFallback ──failure──▶ Error
/// ```
///
/// The engine feeds one signal per failed tier; a tier that produces
/// recommendations ends the chain.
pub fn transition(from: ChainState, signal: &TierSignal) -> ChainState {
    use AlgorithmTier::*;

    let tier = match from {
        ChainState::Error => return ChainState::Error,
        ChainState::Tier(tier) => tier,
    };

    let next = match (tier, signal) {
        (EmergencyFallback, _) => return ChainState::Error,
        (_, TierSignal::RetrievalFailed(_)) => EmergencyFallback,
        (SemanticReasoning, TierSignal::NoSemanticIngredients) => BasicOntologyFallback,
        (BasicOntologyFallback, TierSignal::NoSemanticIngredients) => DatabaseBasicFallback,
        (
            SemanticReasoning | BasicOntologyFallback,
            TierSignal::GraphUnavailable(_) | TierSignal::NoCandidates | TierSignal::MappingFailed(_),
        ) => DatabaseBasicFallback,
        (DatabaseBasicFallback, _) => EmergencyFallback,
    };

    ChainState::Tier(next)
}
