use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::{
    error::AppError,
    models::{IngredientPair, OntologyConfidence, SemanticIngredient, SkinType},
    services::with_deadline,
};

pub mod client;
pub mod queries;

pub use client::{Binding, GraphClient, SparqlHttpClient};
use queries::Relation;

/// Relevance assigned to an ingredient that treats none of the requested concerns
const BASE_RELEVANCE: f64 = 0.5;

/// Result of a graph query that never fails outright
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryOutcome<T> {
    pub data: Vec<T>,
    pub count: usize,
    pub error: Option<String>,
}

impl<T> QueryOutcome<T> {
    pub fn ok(data: Vec<T>) -> Self {
        Self {
            count: data.len(),
            data,
            error: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            data: Vec::new(),
            count: 0,
            error: Some(reason.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Issues the parametrized graph queries the engine needs and converts their rows
/// into domain types
///
/// Nothing here returns an error: a failed query becomes a `QueryOutcome`
/// carrying the reason, so the caller can tell "the graph knows nothing" (empty,
/// no error) apart from "the graph could not be asked".
#[derive(Clone)]
pub struct OntologyService {
    client: Arc<dyn GraphClient>,
    namespace: String,
    timeout: Duration,
}

impl OntologyService {
    pub fn new(client: Arc<dyn GraphClient>, namespace: String, timeout: Duration) -> Self {
        Self {
            client,
            namespace,
            timeout,
        }
    }

    /// Ingredients recommended for `skin_type`, restricted to those treating at
    /// least one of `concerns` when any are given
    pub async fn get_skin_type_recommendations(
        &self,
        skin_type: SkinType,
        concerns: &BTreeSet<String>,
        cancel: &CancellationToken,
    ) -> QueryOutcome<SemanticIngredient> {
        let query = queries::skin_type_recommendations(&self.namespace, skin_type, concerns);

        match self.run("skin_type_recommendations", &query, cancel).await {
            Ok(rows) => {
                let ingredients = ingredients_from_bindings(&rows, concerns);
                tracing::info!(
                    skin_type = %skin_type,
                    concerns = concerns.len(),
                    rows = rows.len(),
                    ingredients = ingredients.len(),
                    "Semantic ingredients fetched"
                );
                QueryOutcome::ok(ingredients)
            }
            Err(e) => QueryOutcome::failed(e.to_string()),
        }
    }

    pub async fn get_ingredient_conflicts(
        &self,
        names: &[String],
        cancel: &CancellationToken,
    ) -> QueryOutcome<IngredientPair> {
        self.relations_among(Relation::IncompatibleWith, names, cancel)
            .await
    }

    pub async fn get_synergistic_combos(
        &self,
        names: &[String],
        cancel: &CancellationToken,
    ) -> QueryOutcome<IngredientPair> {
        self.relations_among(Relation::SynergisticWith, names, cancel)
            .await
    }

    /// Every synergy in the graph; used by the diagnostics endpoint only
    pub async fn get_all_synergistic_combos(
        &self,
        cancel: &CancellationToken,
    ) -> QueryOutcome<IngredientPair> {
        let query = queries::all_synergies(&self.namespace);
        match self.run("all_synergies", &query, cancel).await {
            Ok(rows) => QueryOutcome::ok(pairs_from_bindings(&rows)),
            Err(e) => QueryOutcome::failed(e.to_string()),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.client.name()
    }

    async fn relations_among(
        &self,
        relation: Relation,
        names: &[String],
        cancel: &CancellationToken,
    ) -> QueryOutcome<IngredientPair> {
        let distinct: BTreeSet<String> = names
            .iter()
            .map(|n| n.trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect();
        if distinct.len() < 2 {
            return QueryOutcome::ok(Vec::new());
        }

        let query = queries::relations_among(&self.namespace, relation, names);
        let label = match relation {
            Relation::IncompatibleWith => "conflicts",
            Relation::SynergisticWith => "synergies",
        };

        match self.run(label, &query, cancel).await {
            Ok(rows) => QueryOutcome::ok(pairs_from_bindings(&rows)),
            Err(e) => QueryOutcome::failed(e.to_string()),
        }
    }

    async fn run(
        &self,
        label: &'static str,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Binding>, AppError> {
        let start = Instant::now();
        let timeout = self.timeout;
        let result = with_deadline(
            cancel,
            timeout,
            || {
                AppError::TransientQueryFailure(format!(
                    "{} query timed out after {}ms",
                    label,
                    timeout.as_millis()
                ))
            },
            self.client.select(query),
        )
        .await;

        if let Err(e) = &result {
            tracing::warn!(
                query = label,
                backend = self.client.name(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                error = %e,
                "Graph query failed"
            );
        }

        result
    }
}

#[derive(Default)]
struct IngredientRows {
    name: String,
    benefit: Option<String>,
    function: Option<String>,
    concerns: BTreeSet<String>,
}

fn non_empty(row: &Binding, var: &str) -> Option<String> {
    row.get(var)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Groups rows by ingredient and derives relevance and confidence
///
/// With concerns requested, relevance is `0.5 + 0.5 · treated / requested`;
/// without concerns every ingredient gets the base relevance of 0.5.
fn ingredients_from_bindings(
    rows: &[Binding],
    requested: &BTreeSet<String>,
) -> Vec<SemanticIngredient> {
    let mut grouped: BTreeMap<String, IngredientRows> = BTreeMap::new();

    for row in rows {
        let Some(name) = non_empty(row, "name") else {
            tracing::debug!("Skipping graph row without ingredient name");
            continue;
        };
        let entry = grouped
            .entry(name.to_lowercase())
            .or_insert_with(|| IngredientRows {
                name: name.clone(),
                ..Default::default()
            });
        if entry.benefit.is_none() {
            entry.benefit = non_empty(row, "benefit");
        }
        if entry.function.is_none() {
            entry.function = non_empty(row, "function");
        }
        if let Some(concern) = non_empty(row, "concern") {
            entry.concerns.insert(concern.to_lowercase());
        }
    }

    let mut ingredients: Vec<SemanticIngredient> = grouped
        .into_values()
        .map(|rows| {
            let treated = rows.concerns.intersection(requested).count();
            let concern_relevance_score = if requested.is_empty() {
                BASE_RELEVANCE
            } else {
                BASE_RELEVANCE + BASE_RELEVANCE * treated as f64 / requested.len() as f64
            };
            let ontology_confidence = match treated {
                n if n >= 2 => OntologyConfidence::VeryHigh,
                1 => OntologyConfidence::High,
                _ if rows.benefit.is_some() => OntologyConfidence::Medium,
                _ => OntologyConfidence::Low,
            };
            SemanticIngredient {
                name: rows.name,
                benefit: rows.benefit,
                function: rows.function,
                concern_relevance_score,
                ontology_confidence,
            }
        })
        .collect();

    ingredients.sort_by(|a, b| {
        b.concern_relevance_score
            .total_cmp(&a.concern_relevance_score)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    ingredients
}

/// Deduplicates relation rows by unordered pair, dropping self-relations
fn pairs_from_bindings(rows: &[Binding]) -> Vec<IngredientPair> {
    let mut pairs: BTreeMap<(String, String), IngredientPair> = BTreeMap::new();

    for row in rows {
        let (Some(a), Some(b)) = (non_empty(row, "name1"), non_empty(row, "name2")) else {
            continue;
        };
        let pair = IngredientPair::new(a, b, non_empty(row, "detail"));
        if pair.is_self_pair() {
            continue;
        }
        pairs.entry(pair.key()).or_insert(pair);
    }

    pairs.into_values().collect()
}
