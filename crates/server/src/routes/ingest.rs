use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use store::Document;

/// Request to upsert documents for a tenant
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    /// Tenant namespace the documents belong to
    pub tenant_id: String,

    /// Dataset label forwarded by ingestion jobs (e.g. "faq", "products").
    /// Informational only: embedding-text dispatch is decided per document
    /// by its shape, not by this field.
    #[serde(default)]
    pub dataset_type: Option<String>,

    /// Documents to insert or update, keyed by id
    pub documents: Vec<Document>,
}

/// Response from a document upsert
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub tenant_id: String,
    pub ingested: usize,
}

/// Upsert documents for a tenant.
///
/// Appends to the tenant's index when every incoming id is new; any id
/// collision triggers a full re-embed and rebuild. Either way the tenant's
/// persisted artifacts are replaced as one unit and the tenant's cached
/// answers are invalidated.
pub async fn ingest_documents(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<IngestRequest>,
) -> ServerResult<impl IntoResponse> {
    if request.documents.is_empty() {
        return Err(ServerError::BadRequest(
            "documents must not be empty".to_string(),
        ));
    }

    let tenant_id = request.tenant_id.clone();
    tracing::info!(
        tenant = %tenant_id,
        dataset_type = request.dataset_type.as_deref().unwrap_or("unspecified"),
        documents = request.documents.len(),
        "ingest request"
    );

    let ingested = state
        .run_pipeline(move |pipeline| pipeline.ingest(&request.tenant_id, request.documents))
        .await?;

    Ok(Json(IngestResponse {
        tenant_id,
        ingested,
    }))
}
