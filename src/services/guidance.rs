use std::collections::BTreeMap;

use crate::models::{GuestProfile, OntologyConfidence, SemanticIngredient, SkinType};

const SKIN_TYPE_RELEVANCE: f64 = 0.5;
const CONCERN_RELEVANCE: f64 = 0.75;

fn skin_type_ingredients(skin_type: SkinType) -> &'static [&'static str] {
    match skin_type {
        SkinType::Normal => &["Hyaluronic Acid", "Glycerin", "Niacinamide", "Vitamin C"],
        SkinType::Dry => &["Hyaluronic Acid", "Ceramides", "Squalane", "Glycerin", "Shea Butter"],
        SkinType::Oily => &["Niacinamide", "Salicylic Acid", "Zinc", "Kaolin"],
        SkinType::Combination => &["Niacinamide", "Hyaluronic Acid", "Green Tea Extract"],
        SkinType::Sensitive => &["Centella Asiatica", "Ceramides", "Panthenol", "Allantoin"],
    }
}

/// Concern keyword → ingredients known to address it
const CONCERN_INGREDIENTS: &[(&str, &[&str])] = &[
    ("acne", &["Salicylic Acid", "Niacinamide", "Benzoyl Peroxide", "Azelaic Acid"]),
    ("breakout", &["Salicylic Acid", "Benzoyl Peroxide"]),
    ("aging", &["Retinol", "Peptides", "Vitamin C", "Hyaluronic Acid"]),
    ("wrinkle", &["Retinol", "Peptides"]),
    ("fine line", &["Retinol", "Peptides", "Hyaluronic Acid"]),
    ("pigment", &["Vitamin C", "Niacinamide", "Azelaic Acid", "Alpha Arbutin"]),
    ("dark spot", &["Vitamin C", "Niacinamide", "Alpha Arbutin"]),
    ("redness", &["Centella Asiatica", "Azelaic Acid", "Green Tea Extract"]),
    ("rosacea", &["Centella Asiatica", "Azelaic Acid"]),
    ("dry", &["Hyaluronic Acid", "Ceramides", "Glycerin", "Squalane"]),
    ("dehydrat", &["Hyaluronic Acid", "Glycerin"]),
    ("oil", &["Niacinamide", "Salicylic Acid", "Zinc"]),
    ("pore", &["Niacinamide", "Salicylic Acid"]),
    ("dull", &["Vitamin C", "Glycolic Acid", "Lactic Acid"]),
    ("texture", &["Glycolic Acid", "Lactic Acid"]),
];

/// Target ingredients for the profile, concern entries first
///
/// Stands in for graph answers when the knowledge graph is unavailable, in the
/// same shape, so the regular matcher and scorer consume them unchanged. Every
/// entry carries low ontology confidence.
pub fn fallback_targets(profile: &GuestProfile) -> Vec<SemanticIngredient> {
    let mut targets: BTreeMap<String, SemanticIngredient> = BTreeMap::new();

    for concern in &profile.concerns {
        for (keyword, ingredients) in CONCERN_INGREDIENTS {
            if !concern.contains(keyword) {
                continue;
            }
            for name in ingredients.iter() {
                targets
                    .entry(name.to_lowercase())
                    .or_insert_with(|| target(name, CONCERN_RELEVANCE));
            }
        }
    }

    for name in skin_type_ingredients(profile.skin_type) {
        targets
            .entry(name.to_lowercase())
            .or_insert_with(|| target(name, SKIN_TYPE_RELEVANCE));
    }

    let mut targets: Vec<SemanticIngredient> = targets.into_values().collect();
    targets.sort_by(|a, b| {
        b.concern_relevance_score
            .total_cmp(&a.concern_relevance_score)
            .then_with(|| a.name.cmp(&b.name))
    });
    targets
}

fn target(name: &str, relevance: f64) -> SemanticIngredient {
    SemanticIngredient {
        name: name.to_string(),
        benefit: None,
        function: None,
        concern_relevance_score: relevance,
        ontology_confidence: OntologyConfidence::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concern_entries_outrank_skin_type_entries() {
        let profile = GuestProfile::new(SkinType::Oily, ["Acne"], Vec::<String>::new());
        let targets = fallback_targets(&profile);

        let salicylic = targets.iter().find(|t| t.name == "Salicylic Acid").unwrap();
        assert_eq!(salicylic.concern_relevance_score, CONCERN_RELEVANCE);

        let kaolin = targets.iter().find(|t| t.name == "Kaolin").unwrap();
        assert_eq!(kaolin.concern_relevance_score, SKIN_TYPE_RELEVANCE);

        let first_base = targets
            .iter()
            .position(|t| t.concern_relevance_score == SKIN_TYPE_RELEVANCE)
            .unwrap();
        assert!(targets[..first_base]
            .iter()
            .all(|t| t.concern_relevance_score == CONCERN_RELEVANCE));
    }

    #[test]
    fn test_targets_are_unique_and_low_confidence() {
        let profile = GuestProfile::new(SkinType::Dry, ["dryness", "fine lines"], Vec::<String>::new());
        let targets = fallback_targets(&profile);
        let mut names: Vec<String> = targets.iter().map(|t| t.name.to_lowercase()).collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
        assert!(targets
            .iter()
            .all(|t| t.ontology_confidence == OntologyConfidence::Low));
    }

    #[test]
    fn test_unknown_concern_falls_back_to_skin_type() {
        let profile = GuestProfile::new(SkinType::Sensitive, ["sunburn"], Vec::<String>::new());
        let names: Vec<String> = fallback_targets(&profile).into_iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec!["Allantoin", "Centella Asiatica", "Ceramides", "Panthenol"]
        );
    }
}
