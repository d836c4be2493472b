use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{
        AlgorithmTier, GuestProfile, ProductCandidate, Recommendation, RecommendationMetadata,
        RecommendationResponse, SafetyAnalysis,
    },
    services::{
        candidates::CandidateRetriever,
        explanation::{explain_candidate, explain_response},
        fallback::{transition, ChainState, TierSignal},
        guidance::fallback_targets,
        ontology::{GraphClient, OntologyService},
        repository::ProductRepository,
        safety::SafetyAnalyzer,
        scoring::score_and_rank,
        similarity::MAX_INGREDIENTS_PER_SIDE,
    },
};

pub const INTERACTIONS_UNAVAILABLE_NOTE: &str = "interaction analysis unavailable in this tier";

/// Tunables for the engine and its collaborators
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub ontology_namespace: String,
    pub graph_timeout: Duration,
    pub repository_timeout: Duration,
    pub safety_concurrency: usize,
    pub catalog_page_size: i64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            ontology_namespace: "http://www.semanticweb.org/skincare-ontology#".to_string(),
            graph_timeout: Duration::from_secs(8),
            repository_timeout: Duration::from_secs(5),
            safety_concurrency: 8,
            catalog_page_size: 500,
        }
    }
}

impl From<&Config> for EngineSettings {
    fn from(config: &Config) -> Self {
        Self {
            ontology_namespace: config.ontology_namespace.clone(),
            graph_timeout: config.graph_timeout(),
            repository_timeout: config.repository_timeout(),
            safety_concurrency: config.safety_concurrency,
            catalog_page_size: config.catalog_page_size,
        }
    }
}

/// What a successful tier hands back to the chain
struct TierOutput {
    candidates: Vec<ProductCandidate>,
    semantic_ingredients: usize,
}

/// Hybrid recommendation engine
///
/// Drives the fallback chain: each tier either produces ranked candidates or a
/// `TierSignal`, and `transition` decides which tier runs next. Callers only ever
/// see a complete response or a terminal error.
#[derive(Clone)]
pub struct RecommendationEngine {
    ontology: OntologyService,
    retriever: CandidateRetriever,
    safety: SafetyAnalyzer,
}

impl RecommendationEngine {
    pub fn new(
        graph: Arc<dyn GraphClient>,
        repository: Arc<dyn ProductRepository>,
        settings: &EngineSettings,
    ) -> Self {
        let ontology = OntologyService::new(
            graph,
            settings.ontology_namespace.clone(),
            settings.graph_timeout,
        );
        let retriever = CandidateRetriever::new(
            repository,
            settings.repository_timeout,
            settings.catalog_page_size,
        );
        let safety = SafetyAnalyzer::new(ontology.clone(), settings.safety_concurrency);

        Self {
            ontology,
            retriever,
            safety,
        }
    }

    pub fn ontology(&self) -> &OntologyService {
        &self.ontology
    }

    /// Ranked recommendations for `profile`
    ///
    /// Fails only with `Unavailable` (every tier failed) or `Cancelled`.
    pub async fn recommend(
        &self,
        profile: &GuestProfile,
        cancel: &CancellationToken,
    ) -> AppResult<RecommendationResponse> {
        let start = Instant::now();
        let mut state = ChainState::INITIAL;
        let mut fallback_path = Vec::new();

        loop {
            if cancel.is_cancelled() {
                tracing::warn!(
                    skin_type = %profile.skin_type,
                    state = %state,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Recommendation request cancelled"
                );
                return Err(AppError::Cancelled);
            }

            let tier = match state {
                ChainState::Tier(tier) => tier,
                ChainState::Error => {
                    tracing::error!(
                        skin_type = %profile.skin_type,
                        path = ?fallback_path,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "All recommendation tiers failed"
                    );
                    return Err(AppError::Unavailable);
                }
            };
            fallback_path.push(tier);

            match self.run_tier(tier, profile, cancel).await {
                Ok(output) => {
                    return Ok(self.respond(tier, profile, output, fallback_path, start));
                }
                Err(signal) => {
                    let next = transition(state, &signal);
                    tracing::warn!(
                        tier = %tier,
                        signal = %signal,
                        next = %next,
                        skin_type = %profile.skin_type,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Recommendation tier failed, degrading"
                    );
                    state = next;
                }
            }
        }
    }

    async fn run_tier(
        &self,
        tier: AlgorithmTier,
        profile: &GuestProfile,
        cancel: &CancellationToken,
    ) -> Result<TierOutput, TierSignal> {
        match tier {
            AlgorithmTier::SemanticReasoning => {
                self.ontology_tier(profile, &profile.concerns, cancel).await
            }
            AlgorithmTier::BasicOntologyFallback => {
                self.ontology_tier(profile, &BTreeSet::new(), cancel).await
            }
            AlgorithmTier::DatabaseBasicFallback => self.database_tier(profile, cancel).await,
            AlgorithmTier::EmergencyFallback => self.emergency_tier(profile, cancel).await,
        }
    }

    /// Graph-driven tiers; the basic tier passes no concerns
    async fn ontology_tier(
        &self,
        profile: &GuestProfile,
        concerns: &BTreeSet<String>,
        cancel: &CancellationToken,
    ) -> Result<TierOutput, TierSignal> {
        let outcome = self
            .ontology
            .get_skin_type_recommendations(profile.skin_type, concerns, cancel)
            .await;

        if let Some(error) = outcome.error {
            return Err(TierSignal::GraphUnavailable(error));
        }
        if outcome.data.is_empty() {
            return Err(TierSignal::NoSemanticIngredients);
        }

        let mut semantic = outcome.data;
        semantic.truncate(MAX_INGREDIENTS_PER_SIDE);

        let candidates = self
            .retriever
            .retrieve(&semantic, profile, cancel)
            .await
            .map_err(|e| TierSignal::from_error(&e))?;
        if candidates.is_empty() {
            return Err(TierSignal::NoCandidates);
        }

        let ranked = score_and_rank(candidates, semantic.len(), &profile.declared_sensitivities());
        let analyzed = self
            .safety
            .analyze_all(ranked, cancel)
            .await
            .map_err(|e| TierSignal::from_error(&e))?;

        Ok(TierOutput {
            candidates: analyzed,
            semantic_ingredients: semantic.len(),
        })
    }

    /// Catalog-only ranking against built-in ingredient guidance
    async fn database_tier(
        &self,
        profile: &GuestProfile,
        cancel: &CancellationToken,
    ) -> Result<TierOutput, TierSignal> {
        let targets = fallback_targets(profile);
        let candidates = self
            .retriever
            .retrieve_all(&targets, profile, cancel)
            .await
            .map_err(|e| TierSignal::from_error(&e))?;
        if candidates.is_empty() {
            return Err(TierSignal::NoCandidates);
        }

        let ranked = score_and_rank(candidates, targets.len(), &profile.declared_sensitivities());
        Ok(TierOutput {
            candidates: without_interaction_analysis(ranked),
            semantic_ingredients: 0,
        })
    }

    /// Safety-filtered products in catalog order; an empty catalog is still a result
    async fn emergency_tier(
        &self,
        profile: &GuestProfile,
        cancel: &CancellationToken,
    ) -> Result<TierOutput, TierSignal> {
        let candidates = self
            .retriever
            .retrieve_emergency(profile, cancel)
            .await
            .map_err(|e| TierSignal::from_error(&e))?;

        let ranked = score_and_rank(candidates, 0, &profile.declared_sensitivities());
        Ok(TierOutput {
            candidates: without_interaction_analysis(ranked),
            semantic_ingredients: 0,
        })
    }

    fn respond(
        &self,
        tier: AlgorithmTier,
        profile: &GuestProfile,
        output: TierOutput,
        fallback_path: Vec<AlgorithmTier>,
        start: Instant,
    ) -> RecommendationResponse {
        let recommendations: Vec<Recommendation> = output
            .candidates
            .into_iter()
            .map(|candidate| {
                let explanation = explain_candidate(&candidate, profile);
                Recommendation {
                    candidate,
                    explanation,
                }
            })
            .collect();

        let explanation = explain_response(
            tier,
            profile,
            output.semantic_ingredients,
            recommendations.len(),
        );
        let processing_time_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            tier = %tier,
            skin_type = %profile.skin_type,
            recommendations = recommendations.len(),
            attempts = fallback_path.len(),
            processing_time_ms,
            "Recommendations produced"
        );

        RecommendationResponse {
            recommendations,
            metadata: RecommendationMetadata {
                algorithm_type: tier,
                confidence: tier.confidence(),
                processing_time_ms,
                fallback_path,
                generated_at: Utc::now(),
            },
            explanation,
        }
    }
}

fn without_interaction_analysis(mut candidates: Vec<ProductCandidate>) -> Vec<ProductCandidate> {
    for candidate in candidates.iter_mut() {
        candidate.safety_analysis = SafetyAnalysis::not_analyzed(INTERACTIONS_UNAVAILABLE_NOTE);
    }
    candidates
}
