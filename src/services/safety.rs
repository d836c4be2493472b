use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::{
    error::{AppError, AppResult},
    models::{ProductCandidate, SafetyAnalysis},
    services::ontology::OntologyService,
};

/// Ingredients per candidate sent to the interaction queries
pub const MAX_INGREDIENTS_ANALYZED: usize = 10;

pub const INSUFFICIENT_DATA_NOTE: &str = "insufficient ingredient data for interaction analysis";
pub const CONFLICTS_UNAVAILABLE_NOTE: &str = "conflict data unavailable";
pub const SYNERGIES_UNAVAILABLE_NOTE: &str = "synergy data unavailable";

/// Names to check for a candidate
///
/// Canonical graph names of the matched ingredients come first, since those are
/// the names the relations are stored under; the rest of the label follows in
/// label order.
pub fn analysis_ingredients(candidate: &ProductCandidate) -> Vec<String> {
    let mut seen = HashSet::new();
    candidate
        .matched_semantic_ingredients
        .iter()
        .map(|m| m.ingredient.name.clone())
        .chain(candidate.parsed_ingredients.iter().cloned())
        .filter(|name| seen.insert(name.to_lowercase()))
        .take(MAX_INGREDIENTS_ANALYZED)
        .collect()
}

/// Pairwise conflict/synergy analysis over the knowledge graph
#[derive(Clone)]
pub struct SafetyAnalyzer {
    ontology: OntologyService,
    concurrency: usize,
}

impl SafetyAnalyzer {
    pub fn new(ontology: OntologyService, concurrency: usize) -> Self {
        Self {
            ontology,
            concurrency: concurrency.max(1),
        }
    }

    /// Analyzes one ingredient set; query failures become notes, never errors
    pub async fn analyze(&self, names: &[String], cancel: &CancellationToken) -> SafetyAnalysis {
        if names.len() < 2 {
            return SafetyAnalysis::not_analyzed(INSUFFICIENT_DATA_NOTE);
        }

        let (conflicts, synergies) = tokio::join!(
            self.ontology.get_ingredient_conflicts(names, cancel),
            self.ontology.get_synergistic_combos(names, cancel),
        );

        let mut notes = Vec::new();
        if !conflicts.is_ok() {
            notes.push(CONFLICTS_UNAVAILABLE_NOTE.to_string());
        }
        if !synergies.is_ok() {
            notes.push(SYNERGIES_UNAVAILABLE_NOTE.to_string());
        }

        SafetyAnalysis::from_relations(conflicts.data, synergies.data, notes)
    }

    /// Analyzes every candidate with bounded concurrency, preserving input order
    pub async fn analyze_all(
        &self,
        mut candidates: Vec<ProductCandidate>,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<ProductCandidate>> {
        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for (index, candidate) in candidates.iter().enumerate() {
            let names = analysis_ingredients(candidate);
            let analyzer = self.clone();
            let semaphore = semaphore.clone();
            let cancel = cancel.clone();

            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| AppError::Internal(format!("Safety semaphore closed: {}", e)))?;
                let analysis = analyzer.analyze(&names, &cancel).await;
                Ok::<_, AppError>((index, analysis))
            });
        }

        let mut analyses: Vec<Option<SafetyAnalysis>> = vec![None; candidates.len()];
        while let Some(joined) = tasks.join_next().await {
            let (index, analysis) = joined??;
            analyses[index] = Some(analysis);
        }

        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        let mut conflicts_total = 0;
        for (candidate, analysis) in candidates.iter_mut().zip(analyses) {
            let analysis = analysis.ok_or_else(|| {
                AppError::Internal("Safety analysis missing for candidate".to_string())
            })?;
            conflicts_total += analysis.conflicts_detected;
            candidate.safety_analysis = analysis;
        }

        tracing::info!(
            candidates = candidates.len(),
            conflicts = conflicts_total,
            concurrency = self.concurrency,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Safety analysis completed"
        );

        Ok(candidates)
    }
}
