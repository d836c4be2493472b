use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, AppResult};

pub mod candidates;
pub mod engine;
pub mod explanation;
pub mod fallback;
pub mod guidance;
pub mod ontology;
pub mod repository;
pub mod safety;
pub mod scoring;
pub mod similarity;

pub use engine::{EngineSettings, RecommendationEngine};
pub use ontology::{OntologyService, QueryOutcome};
pub use repository::{PgProductRepository, ProductRepository};

/// Runs an external call under a timeout and the request's cancellation token
///
/// Cancellation wins over completion when both are ready, so an abandoned
/// request never starts acting on a late result.
pub(crate) async fn with_deadline<T, F, E>(
    cancel: &CancellationToken,
    limit: Duration,
    on_timeout: E,
    call: F,
) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
    E: FnOnce() -> AppError,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AppError::Cancelled),
        result = tokio::time::timeout(limit, call) => match result {
            Ok(inner) => inner,
            Err(_) => Err(on_timeout()),
        },
    }
}
