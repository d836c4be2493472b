use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::RequestCancellation,
    models::{GuestProfile, RecommendationRequest, RecommendationResponse},
};

use super::AppState;

#[derive(Debug, Serialize)]
pub struct OntologyHealthResponse {
    pub reachable: bool,
    pub backend: &'static str,
    pub synergies: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Ranks catalog products for a guest profile
pub async fn recommend(
    State(state): State<AppState>,
    cancellation: Option<Extension<RequestCancellation>>,
    payload: Result<Json<RecommendationRequest>, JsonRejection>,
) -> AppResult<Json<RecommendationResponse>> {
    let Json(request) = payload.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    let profile = GuestProfile::from(request);
    let cancellation = cancellation.map(|Extension(c)| c).unwrap_or_default();

    let response = state
        .engine
        .recommend(&profile, cancellation.token())
        .await?;
    Ok(Json(response))
}

/// Reports whether the knowledge graph answers, and how many synergies it holds
pub async fn ontology_health(
    State(state): State<AppState>,
    cancellation: Option<Extension<RequestCancellation>>,
) -> (StatusCode, Json<OntologyHealthResponse>) {
    let cancellation = cancellation.map(|Extension(c)| c).unwrap_or_default();
    let ontology = state.engine.ontology();
    let outcome = ontology
        .get_all_synergistic_combos(cancellation.token())
        .await;

    let reachable = outcome.is_ok();
    let status = if reachable {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(OntologyHealthResponse {
            reachable,
            backend: ontology.backend_name(),
            synergies: outcome.count,
            error: outcome.error,
        }),
    )
}
