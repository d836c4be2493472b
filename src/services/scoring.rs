use std::cmp::Ordering;

use crate::models::{
    ConfidenceLevel, IngredientMatch, OntologyConfidence, ProductCandidate, SafetyFlag,
    SafetyFlags, Sensitivity,
};

// Final score weights
pub const SEMANTIC_WEIGHT: f64 = 0.7;
pub const MAPPING_WEIGHT: f64 = 0.2;
pub const SAFETY_WEIGHT: f64 = 0.1;

/// Safety score of a product before any declared sensitivity is considered
pub const BASE_SAFETY_SCORE: f64 = 80.0;

/// Upper bound on recommendations returned for a request
pub const MAX_RECOMMENDATIONS: usize = 12;

const COVERAGE_POINTS: f64 = 60.0;
const RELEVANCE_POINTS: f64 = 40.0;
const CONFIDENCE_BONUS: f64 = 20.0;
const RELEVANCE_BONUS: f64 = 20.0;
const HIGH_RELEVANCE: f64 = 0.7;

/// Score adjustment for one declared sensitivity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafetyDelta {
    /// Added when the product's flag is `True`
    pub reward: f64,
    /// Subtracted when the product's flag is `False`
    pub penalty: f64,
}

/// Reward and penalty differ per sensitivity; silicone is a filter-only concern.
pub fn safety_delta(sensitivity: Sensitivity) -> SafetyDelta {
    let (reward, penalty) = match sensitivity {
        Sensitivity::Fragrance => (15.0, 20.0),
        Sensitivity::Alcohol => (10.0, 15.0),
        Sensitivity::Paraben => (10.0, 10.0),
        Sensitivity::Sulfate => (5.0, 5.0),
        Sensitivity::Silicone => (0.0, 0.0),
    };
    SafetyDelta { reward, penalty }
}

fn coverage(matches: &[IngredientMatch], total_semantic: usize) -> f64 {
    if total_semantic == 0 {
        return 0.0;
    }
    (matches.len() as f64 / total_semantic as f64).min(1.0)
}

/// `min(100, 60 · coverage + 40 · mean relevance of the matches)`
pub fn semantic_score(matches: &[IngredientMatch], total_semantic: usize) -> f64 {
    if matches.is_empty() {
        return 0.0;
    }
    let avg_relevance = matches
        .iter()
        .map(|m| m.ingredient.concern_relevance_score)
        .sum::<f64>()
        / matches.len() as f64;

    (COVERAGE_POINTS * coverage(matches, total_semantic) + RELEVANCE_POINTS * avg_relevance)
        .min(100.0)
}

/// `min(100, 60 · coverage + 20 · [any high confidence] + 20 · [any relevance > 0.7])`
pub fn mapping_score(matches: &[IngredientMatch], total_semantic: usize) -> f64 {
    let confident = matches
        .iter()
        .any(|m| m.ingredient.ontology_confidence >= OntologyConfidence::High);
    let relevant = matches
        .iter()
        .any(|m| m.ingredient.concern_relevance_score > HIGH_RELEVANCE);

    let mut score = COVERAGE_POINTS * coverage(matches, total_semantic);
    if confident {
        score += CONFIDENCE_BONUS;
    }
    if relevant {
        score += RELEVANCE_BONUS;
    }
    score.min(100.0)
}

/// Base 80 adjusted per declared sensitivity; `Unknown` flags leave it unchanged
pub fn safety_score(flags: &SafetyFlags, declared: &[Sensitivity]) -> f64 {
    let score = declared.iter().fold(BASE_SAFETY_SCORE, |score, sensitivity| {
        let delta = safety_delta(*sensitivity);
        match flags.flag_for(*sensitivity) {
            SafetyFlag::True => score + delta.reward,
            SafetyFlag::False => score - delta.penalty,
            SafetyFlag::Unknown => score,
        }
    });
    score.clamp(0.0, 100.0)
}

pub fn final_score(semantic: f64, mapping: f64, safety: f64) -> u32 {
    let weighted = SEMANTIC_WEIGHT * semantic + MAPPING_WEIGHT * mapping + SAFETY_WEIGHT * safety;
    weighted.round().clamp(0.0, 100.0) as u32
}

pub fn confidence_level(semantic: f64, mapping: f64) -> ConfidenceLevel {
    let avg = (semantic + mapping) / 2.0;
    if avg >= 80.0 {
        ConfidenceLevel::VeryHigh
    } else if avg >= 65.0 {
        ConfidenceLevel::High
    } else if avg >= 50.0 {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    }
}

/// Highest final score first; equal scores fall back to ascending product id
pub fn rank_order(a: &ProductCandidate, b: &ProductCandidate) -> Ordering {
    b.final_score
        .cmp(&a.final_score)
        .then_with(|| a.product.id.cmp(&b.product.id))
}

/// Fills in every score on the candidate
pub fn score_candidate(
    candidate: &mut ProductCandidate,
    total_semantic: usize,
    declared: &[Sensitivity],
) {
    let matches = &candidate.matched_semantic_ingredients;
    candidate.semantic_score = semantic_score(matches, total_semantic);
    candidate.mapping_score = mapping_score(matches, total_semantic);
    candidate.safety_score = safety_score(&candidate.product.safety, declared);
    candidate.final_score = final_score(
        candidate.semantic_score,
        candidate.mapping_score,
        candidate.safety_score,
    );
    candidate.confidence_level = confidence_level(candidate.semantic_score, candidate.mapping_score);
}

/// Scores every candidate, sorts by `rank_order` and keeps the top twelve
pub fn score_and_rank(
    mut candidates: Vec<ProductCandidate>,
    total_semantic: usize,
    declared: &[Sensitivity],
) -> Vec<ProductCandidate> {
    for candidate in candidates.iter_mut() {
        score_candidate(candidate, total_semantic, declared);
    }
    candidates.sort_by(rank_order);
    candidates.truncate(MAX_RECOMMENDATIONS);
    candidates
}
