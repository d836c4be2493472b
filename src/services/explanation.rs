use crate::models::{AlgorithmTier, GuestProfile, ProductCandidate, SafetyStatus};

/// Matched ingredients named in a product's rationale
const NAMED_INGREDIENTS: usize = 3;

/// Score at or above which a callout is added
const CALLOUT_THRESHOLD: f64 = 80.0;

const CONCERN_RELEVANCE_THRESHOLD: f64 = 0.7;

/// Renders the rationale for a single recommendation
///
/// Reasons are always emitted in the same order: ingredient matches, safety,
/// concern coverage, score callouts. The safety sentence is always present;
/// the generic sentence only covers an empty reason list.
pub fn explain_candidate(candidate: &ProductCandidate, profile: &GuestProfile) -> String {
    let mut reasons = Vec::new();
    let matches = &candidate.matched_semantic_ingredients;

    if !matches.is_empty() {
        let names: Vec<&str> = matches
            .iter()
            .take(NAMED_INGREDIENTS)
            .map(|m| m.ingredient.name.as_str())
            .collect();
        reasons.push(format!(
            "Contains {} ingredient{} recommended for {} skin, including {}",
            matches.len(),
            plural(matches.len()),
            profile.skin_type,
            names.join(", ")
        ));
    }

    let analysis = &candidate.safety_analysis;
    match analysis.overall_safety_status {
        SafetyStatus::Excellent => reasons.push(format!(
            "Features {} synergistic ingredient combination{}",
            analysis.synergies_found,
            plural(analysis.synergies_found)
        )),
        SafetyStatus::CautionNeeded => reasons.push(format!(
            "Contains {} potentially conflicting ingredient pair{}; introduce gradually",
            analysis.conflicts_detected,
            plural(analysis.conflicts_detected)
        )),
        SafetyStatus::Safe if analysis.notes.is_empty() => {
            reasons.push("No known ingredient conflicts".to_string())
        }
        SafetyStatus::Safe => {
            reasons.push("Interaction data was insufficient to assess conflicts".to_string())
        }
    }

    let concern_relevant = matches
        .iter()
        .filter(|m| m.ingredient.concern_relevance_score > CONCERN_RELEVANCE_THRESHOLD)
        .count();
    if concern_relevant > 0 && !profile.concerns.is_empty() {
        let concerns: Vec<&str> = profile.concerns.iter().map(String::as_str).collect();
        reasons.push(format!(
            "{} ingredient{} target{} your concerns ({})",
            concern_relevant,
            plural(concern_relevant),
            if concern_relevant == 1 { "s" } else { "" },
            concerns.join(", ")
        ));
    }

    if candidate.semantic_score >= CALLOUT_THRESHOLD {
        reasons.push("Excellent ingredient match for your profile".to_string());
    }
    if f64::from(candidate.final_score) >= CALLOUT_THRESHOLD {
        reasons.push("Top-rated overall match".to_string());
    }

    if reasons.is_empty() {
        return format!(
            "Recommended based on general suitability for {} skin.",
            profile.skin_type
        );
    }

    format!("{}.", reasons.join(". "))
}

/// Summary sentence for a whole response
pub fn explain_response(
    tier: AlgorithmTier,
    profile: &GuestProfile,
    semantic_ingredients: usize,
    recommendations: usize,
) -> String {
    if recommendations == 0 {
        return format!(
            "No active products matched the declared sensitivities for {} skin.",
            profile.skin_type
        );
    }

    match tier {
        AlgorithmTier::SemanticReasoning => format!(
            "Ranked {} products by ontology reasoning over {} ingredients suited to {} skin and your concerns.",
            recommendations, semantic_ingredients, profile.skin_type
        ),
        AlgorithmTier::BasicOntologyFallback => format!(
            "Ranked {} products using {} ingredients recommended for {} skin; concern-specific reasoning was unavailable.",
            recommendations, semantic_ingredients, profile.skin_type
        ),
        AlgorithmTier::DatabaseBasicFallback => format!(
            "Ranked {} products from the catalog using built-in ingredient guidance for {} skin; the knowledge graph was unavailable.",
            recommendations, profile.skin_type
        ),
        AlgorithmTier::EmergencyFallback => format!(
            "Showing {} products that respect your declared sensitivities; personalised ranking is temporarily unavailable.",
            recommendations
        ),
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}
