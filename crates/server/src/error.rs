use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use ragcore::{PipelineError, StoreError};

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The pipeline call exceeded the configured deadline.
    #[error("request deadline exceeded")]
    Timeout,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("internal server error: {0}")]
    Internal(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("not found")]
    NotFound,
}

/// API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ServerError {
    /// Get HTTP status code for this error
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Pipeline(err) => match err {
                PipelineError::Store(StoreError::TenantNotFound(_)) => StatusCode::NOT_FOUND,
                PipelineError::Store(StoreError::InvalidTenantId(_)) => StatusCode::BAD_REQUEST,
                _ => StatusCode::UNPROCESSABLE_ENTITY,
            },
            ServerError::Internal(_) | ServerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    fn error_code(&self) -> &'static str {
        match self {
            ServerError::Timeout => "REQUEST_TIMEOUT",
            ServerError::BadRequest(_) => "BAD_REQUEST",
            ServerError::NotFound => "NOT_FOUND",
            // The pipeline error already carries a stable machine-readable
            // kind; translate it to the wire code table.
            ServerError::Pipeline(err) => match err.kind() {
                "not_found" => "NOT_FOUND",
                "invalid_tenant" => "INVALID_TENANT",
                "ingest_failed" => "INGEST_FAILED",
                "embed_failed" => "EMBED_FAILED",
                "cache_embed_failed" => "CACHE_EMBED_FAILED",
                "generation_failed" => "GENERATION_FAILED",
                _ => "PIPELINE_ERROR",
            },
            ServerError::Internal(_) => "INTERNAL_ERROR",
            ServerError::Config(_) => "CONFIG_ERROR",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code().to_string();
        let message = self.to_string();

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}
