use std::collections::BTreeSet;

use crate::models::SkinType;

/// Upper bound on rows returned by the unfiltered synergy query
const ALL_SYNERGIES_LIMIT: usize = 1000;

/// Object property that links the two ends of an interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    IncompatibleWith,
    SynergisticWith,
}

impl Relation {
    fn predicate(&self) -> &'static str {
        match self {
            Relation::IncompatibleWith => "skin:incompatibleWith",
            Relation::SynergisticWith => "skin:synergisticWith",
        }
    }

    fn detail_predicate(&self) -> &'static str {
        match self {
            Relation::IncompatibleWith => "skin:conflictReason",
            Relation::SynergisticWith => "skin:synergyBenefit",
        }
    }
}

/// Namespace declarations every query starts with
pub fn prefixes(namespace: &str) -> String {
    format!(
        "PREFIX skin: <{}>\n\
         PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>\n\
         PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>\n",
        namespace
    )
}

/// Escapes a value for use inside a double-quoted SPARQL string literal
pub fn escape_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// `("a", "b", ...)` over the lowercased, deduplicated, escaped values;
/// the graph side compares with `LCASE`
fn literal_list<'a>(values: impl IntoIterator<Item = &'a String>) -> String {
    let unique: BTreeSet<String> = values
        .into_iter()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect();
    let items: Vec<String> = unique
        .iter()
        .map(|v| format!("\"{}\"", escape_literal(v)))
        .collect();
    format!("({})", items.join(", "))
}

/// Ingredients recommended for a skin type, optionally restricted to concerns
///
/// With concerns, one row is produced per (ingredient, treated concern) so the
/// caller can count how many of the requested concerns each ingredient covers.
pub fn skin_type_recommendations(
    namespace: &str,
    skin_type: SkinType,
    concerns: &BTreeSet<String>,
) -> String {
    let mut query = prefixes(namespace);
    query.push_str("SELECT DISTINCT ?name ?benefit ?function ?concern WHERE {\n");
    query.push_str(&format!(
        "  ?ingredient skin:recommendedFor skin:{} .\n",
        skin_type.ontology_node()
    ));
    query.push_str("  ?ingredient skin:ingredientName ?name .\n");
    query.push_str("  OPTIONAL { ?ingredient skin:hasBenefit ?benefit . }\n");
    query.push_str("  OPTIONAL { ?ingredient skin:hasFunction ?function . }\n");
    if !concerns.is_empty() {
        query.push_str("  ?ingredient skin:treatsConcern ?concernNode .\n");
        query.push_str("  ?concernNode rdfs:label ?concern .\n");
        query.push_str(&format!(
            "  FILTER (LCASE(STR(?concern)) IN {})\n",
            literal_list(concerns)
        ));
    }
    query.push_str("}\nORDER BY ?name");
    query
}

/// Interaction pairs where both ends are in `names`
///
/// Relations are stored in one direction only. Filtering both ends against the
/// same set matches `A → B` and `B → A` alike.
pub fn relations_among(namespace: &str, relation: Relation, names: &[String]) -> String {
    let list = literal_list(names);
    let mut query = prefixes(namespace);
    query.push_str("SELECT DISTINCT ?name1 ?name2 ?detail WHERE {\n");
    query.push_str(&format!("  ?a {} ?b .\n", relation.predicate()));
    query.push_str("  ?a skin:ingredientName ?name1 .\n");
    query.push_str("  ?b skin:ingredientName ?name2 .\n");
    query.push_str(&format!(
        "  OPTIONAL {{ ?a {} ?detail . }}\n",
        relation.detail_predicate()
    ));
    query.push_str(&format!(
        "  FILTER (LCASE(STR(?name1)) IN {list} && LCASE(STR(?name2)) IN {list})\n"
    ));
    query.push_str("}\nORDER BY ?name1 ?name2");
    query
}

/// Every synergy in the graph, for diagnostics
pub fn all_synergies(namespace: &str) -> String {
    let mut query = prefixes(namespace);
    query.push_str("SELECT DISTINCT ?name1 ?name2 ?detail WHERE {\n");
    query.push_str("  ?a skin:synergisticWith ?b .\n");
    query.push_str("  ?a skin:ingredientName ?name1 .\n");
    query.push_str("  ?b skin:ingredientName ?name2 .\n");
    query.push_str("  OPTIONAL { ?a skin:synergyBenefit ?detail . }\n");
    query.push_str(&format!("}}\nORDER BY ?name1 ?name2\nLIMIT {}", ALL_SYNERGIES_LIMIT));
    query
}
