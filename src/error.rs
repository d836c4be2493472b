use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Message returned to callers when every fallback tier has failed
pub const UNAVAILABLE_MESSAGE: &str = "recommendation system temporarily unavailable";

/// Application-level errors
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum AppError {
    /// Knowledge graph unreachable, timed out, or answered with something unparseable
    #[error("Knowledge graph query failed: {0}")]
    TransientQueryFailure(String),

    /// Product catalog unreachable or timed out
    #[error("Product repository failure: {0}")]
    RepositoryFailure(String),

    /// The request was abandoned before a result was produced
    #[error("Request cancelled")]
    Cancelled,

    /// Every tier of the fallback chain failed
    #[error("{}", UNAVAILABLE_MESSAGE)]
    Unavailable,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::RepositoryFailure(e.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::TransientQueryFailure(e.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("Task join error: {}", e))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            AppError::TransientQueryFailure(_) | AppError::RepositoryFailure(_) => {
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            // 499 is the de-facto "client closed request" code
            AppError::Cancelled => (
                StatusCode::from_u16(499).unwrap_or(StatusCode::REQUEST_TIMEOUT),
                self.to_string(),
            ),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
