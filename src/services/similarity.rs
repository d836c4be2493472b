use strsim::normalized_levenshtein;

/// Minimum similarity for a label ingredient to count as a semantic match
pub const MATCH_THRESHOLD: f64 = 0.7;

/// Similarity reported for two names in the same alias group
pub const ALIAS_SIMILARITY: f64 = 0.9;

/// Cap on each side of a pairwise comparison
pub const MAX_INGREDIENTS_PER_SIDE: usize = 30;

/// Shortest name allowed to match by containment
const MIN_CONTAINMENT_LEN: usize = 3;

/// Known synonyms for the same ingredient (INCI names, trade names, common names)
const ALIAS_GROUPS: &[&[&str]] = &[
    &[
        "hyaluronic acid",
        "sodium hyaluronate",
        "hyaluronan",
        "hydrolyzed hyaluronic acid",
        "sodium acetylated hyaluronate",
    ],
    &[
        "vitamin c",
        "ascorbic acid",
        "l-ascorbic acid",
        "sodium ascorbyl phosphate",
        "magnesium ascorbyl phosphate",
        "ascorbyl glucoside",
        "ethyl ascorbic acid",
        "tetrahexyldecyl ascorbate",
    ],
    &["niacinamide", "nicotinamide", "vitamin b3"],
    &[
        "retinol",
        "vitamin a",
        "retinyl palmitate",
        "retinal",
        "retinaldehyde",
        "hydroxypinacolone retinoate",
    ],
    &["salicylic acid", "bha", "beta hydroxy acid", "willow bark extract"],
    &["glycolic acid", "aha", "alpha hydroxy acid"],
    &["vitamin e", "tocopherol", "tocopheryl acetate"],
    &["ceramides", "ceramide np", "ceramide ap", "ceramide eop", "ceramide ns"],
    &["panthenol", "provitamin b5", "d-panthenol", "dexpanthenol"],
    &[
        "centella asiatica",
        "cica",
        "madecassoside",
        "asiaticoside",
        "centella asiatica extract",
    ],
    &["benzoyl peroxide", "bpo"],
    &["azelaic acid", "potassium azeloyl diglycinate"],
    &["water", "aqua", "eau"],
    &["glycerin", "glycerol", "glycerine"],
    &["squalane", "squalene"],
    &["green tea extract", "camellia sinensis leaf extract", "egcg"],
    &["licorice root extract", "glycyrrhiza glabra root extract"],
    &["zinc oxide", "ci 77947"],
];

/// Lowercases, maps punctuation (except `-`) to spaces and collapses whitespace
pub fn normalize(name: &str) -> String {
    let mapped: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn alias_group(normalized: &str) -> Option<usize> {
    ALIAS_GROUPS
        .iter()
        .position(|group| group.iter().any(|alias| *alias == normalized))
}

/// Similarity of two ingredient names in [0, 1]
///
/// Containment of one normalized name in the other scores 1.0 and a shared alias
/// group scores 0.9. Anything else is normalized Levenshtein similarity.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);

    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let (shorter, longer) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
    if shorter.len() >= MIN_CONTAINMENT_LEN && longer.contains(shorter.as_str()) {
        return 1.0;
    }

    if let (Some(ga), Some(gb)) = (alias_group(&a), alias_group(&b)) {
        if ga == gb {
            return ALIAS_SIMILARITY;
        }
    }

    normalized_levenshtein(&a, &b)
}

/// Best label ingredient for a canonical name, if any clears the threshold
///
/// Ties keep the earliest label entry, so label order decides between equally
/// good matches.
pub fn best_match<'a>(canonical: &str, label: &'a [String]) -> Option<(&'a str, f64)> {
    let mut best: Option<(&'a str, f64)> = None;
    for candidate in label.iter().take(MAX_INGREDIENTS_PER_SIDE) {
        let score = similarity(canonical, candidate);
        if score < MATCH_THRESHOLD {
            continue;
        }
        match best {
            Some((_, best_score)) if best_score >= score => {}
            _ => best = Some((candidate.as_str(), score)),
        }
    }
    best
}
