use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::llm_client::GenerationError;
use crate::matching::embedding::EmbeddingError;
use crate::store::PersistenceError;

/// Malformed input caught at a boundary (store rows, HTTP bodies, thresholds).
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("threshold {0} is outside [0, 1]")]
    ThresholdOutOfRange(f64),

    #[error("{entity} {id}: missing required field '{field}'")]
    MissingField {
        entity: &'static str,
        id: Uuid,
        field: &'static str,
    },

    #[error("job {job_id}: invalid wage band ${min}/hr - ${max}/hr")]
    WageBand { job_id: Uuid, min: f64, max: f64 },

    #[error("candidate {0} has no resume text")]
    EmptyResume(Uuid),
}

/// Failure of a single matching call (`match_one`, `match_all`) or a pipeline run.
/// Every provider or store failure is folded into one of these before it leaves the core.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("profile generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("persistence failed: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
}

/// HTTP-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Match(#[from] MatchError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::Match(MatchError::Validation(e))
    }
}

impl From<PersistenceError> for AppError {
    fn from(e: PersistenceError) -> Self {
        AppError::Match(MatchError::Persistence(e))
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Match(MatchError::Validation(e)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
            }
            AppError::Match(MatchError::Generation(e)) => {
                tracing::error!("Generation error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "GENERATION_ERROR",
                    "The ideal profile could not be generated".to_string(),
                )
            }
            AppError::Match(MatchError::Embedding(e)) => {
                tracing::error!("Embedding error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "EMBEDDING_ERROR",
                    "Texts could not be embedded".to_string(),
                )
            }
            AppError::Match(MatchError::Persistence(e)) => {
                tracing::error!("Persistence error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PERSISTENCE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
