use crate::error::ServerResult;
use crate::state::ServerState;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use store::Document;

/// Response listing a tenant's documents
#[derive(Debug, Serialize)]
pub struct ListDocumentsResponse {
    pub tenant_id: String,
    pub count: usize,
    pub documents: Vec<Document>,
}

/// Response from a tenant deletion
#[derive(Debug, Serialize)]
pub struct DeleteTenantResponse {
    pub tenant_id: String,
    pub deleted: bool,
}

/// Response from a single-document deletion
#[derive(Debug, Serialize)]
pub struct DeleteDocumentResponse {
    pub tenant_id: String,
    pub doc_id: String,
    pub deleted: bool,
}

/// List all documents stored for a tenant, in id order.
pub async fn list_documents(
    State(state): State<Arc<ServerState>>,
    Path(tenant_id): Path<String>,
) -> ServerResult<impl IntoResponse> {
    let tenant = tenant_id.clone();
    let documents = state
        .run_pipeline(move |pipeline| pipeline.list(&tenant))
        .await?;

    Ok(Json(ListDocumentsResponse {
        tenant_id,
        count: documents.len(),
        documents,
    }))
}

/// Delete a tenant's whole namespace: index, row map, registry, and cached
/// answers. Deleting an absent tenant is a no-op; the call is idempotent.
pub async fn delete_tenant(
    State(state): State<Arc<ServerState>>,
    Path(tenant_id): Path<String>,
) -> ServerResult<impl IntoResponse> {
    let tenant = tenant_id.clone();
    state
        .run_pipeline(move |pipeline| pipeline.delete_tenant(&tenant))
        .await?;

    Ok(Json(DeleteTenantResponse {
        tenant_id,
        deleted: true,
    }))
}

/// Delete one document from a tenant.
///
/// Removal forces a full index rebuild so the document's row stops being
/// searchable immediately. `deleted` is false when the id was not present.
pub async fn delete_document(
    State(state): State<Arc<ServerState>>,
    Path((tenant_id, doc_id)): Path<(String, String)>,
) -> ServerResult<impl IntoResponse> {
    let tenant = tenant_id.clone();
    let id = doc_id.clone();
    let deleted = state
        .run_pipeline(move |pipeline| pipeline.delete_document(&tenant, &id))
        .await?;

    Ok(Json(DeleteDocumentResponse {
        tenant_id,
        doc_id,
        deleted,
    }))
}
