use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

/// Request to answer a tenant query
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    /// Tenant namespace to search
    pub tenant_id: String,

    /// The user question
    pub query: String,

    /// Number of context documents to retrieve (server default when absent)
    #[serde(default)]
    pub top_k: Option<usize>,
}

/// Answer a tenant query through the cache-fronted pipeline.
///
/// The response carries the answer text, a `"cache"`/`"rag"` strategy tag,
/// the observed latency, and (for `"rag"` answers) the retrieved context.
pub async fn answer_query(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<QueryRequest>,
) -> ServerResult<impl IntoResponse> {
    if request.query.trim().is_empty() {
        return Err(ServerError::BadRequest(
            "query must not be empty".to_string(),
        ));
    }

    let answer = state
        .run_pipeline(move |pipeline| {
            pipeline.query(&request.tenant_id, &request.query, request.top_k)
        })
        .await?;

    Ok(Json(answer))
}
