//! API route handlers
//!
//! This module contains all HTTP endpoint implementations for the ragcore
//! server. Routes are organized by functionality:
//!
//! - `health`: Health and readiness checks
//! - `ingest`: Per-tenant document upserts
//! - `query`: Cache-fronted retrieval-augmented answering
//! - `tenants`: Document listing, tenant and document deletion

pub mod health;
pub mod ingest;
pub mod query;
pub mod tenants;

use crate::error::{ServerError, ServerResult};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// API version and base info
///
/// Returns server information including version and available endpoints.
/// This is the root endpoint (GET /) and requires no authentication.
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "ragcore Server",
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": "v1",
        "endpoints": [
            "/api/v1/ingest",
            "/api/v1/query",
            "/api/v1/tenants/{tenant}/documents",
            "/api/v1/tenants/{tenant}",
            "/api/v1/tenants/{tenant}/documents/{doc_id}",
            "/health",
            "/ready"
        ]
    })))
}

/// 404 Not Found handler
///
/// Returns a standardized error response for undefined routes.
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
