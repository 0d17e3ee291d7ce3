use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use std::sync::Arc;

use cache::{CacheConfig, SemanticCache};
use embed::{ApiEmbedder, EmbedConfig, Embedder, StubEmbedder};
use ragcore::{Answerer, ExtractiveAnswerer, PipelineError, RagPipeline, RagPipelineConfig};
use store::{StoreConfig, TenantStore};

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Request pipeline (shared across requests)
    pub pipeline: Arc<RagPipeline>,
}

impl ServerState {
    /// Create new server state with the default collaborators: an HTTP
    /// embedding backend when an endpoint is configured (the deterministic
    /// stub otherwise) and the extractive answerer.
    pub fn new(config: ServerConfig) -> Self {
        let embedder: Arc<dyn Embedder> = match config.embed_api_url.as_deref() {
            Some(url) => {
                let mut embed_cfg = EmbedConfig::new(url);
                if let Some(header) = config.embed_api_auth_header.as_deref() {
                    embed_cfg = embed_cfg.with_auth_header(header);
                }
                Arc::new(ApiEmbedder::new(embed_cfg))
            }
            None => Arc::new(StubEmbedder::default()),
        };
        let answerer: Arc<dyn Answerer> = Arc::new(ExtractiveAnswerer);
        Self::with_collaborators(config, embedder, answerer)
    }

    /// Create server state with explicit collaborators. Used by tests and by
    /// deployments that plug in a real generation model.
    pub fn with_collaborators(
        config: ServerConfig,
        embedder: Arc<dyn Embedder>,
        answerer: Arc<dyn Answerer>,
    ) -> Self {
        let store = Arc::new(TenantStore::new(
            StoreConfig::new().with_root_dir(&config.store_root),
            embedder.clone(),
        ));

        let mut cache_cfg = CacheConfig::new()
            .with_ttl(config.cache_ttl())
            .with_similarity_threshold(config.cache_similarity_threshold);
        if let Some(cap) = config.cache_max_entries_per_tenant {
            cache_cfg = cache_cfg.with_max_entries_per_tenant(cap);
        }
        let cache = Arc::new(SemanticCache::new(cache_cfg, embedder));

        let pipeline = Arc::new(
            RagPipeline::new(store, cache, answerer).with_config(
                RagPipelineConfig::new().with_default_top_k(config.default_top_k),
            ),
        );

        Self {
            config: Arc::new(config),
            pipeline,
        }
    }

    /// Run one blocking pipeline call on the shared blocking pool under the
    /// configured deadline.
    ///
    /// Embedding, vector search, and storage I/O are all blocking from the
    /// pipeline's perspective; `spawn_blocking` keeps one tenant's rebuild
    /// from stalling unrelated requests, and the timeout turns a stuck
    /// embedding or generation call into a surfaced error instead of a hung
    /// connection.
    pub async fn run_pipeline<T, F>(&self, op: F) -> ServerResult<T>
    where
        F: FnOnce(&RagPipeline) -> Result<T, PipelineError> + Send + 'static,
        T: Send + 'static,
    {
        let pipeline = self.pipeline.clone();
        let deadline = self.config.query_deadline();
        let task = tokio::task::spawn_blocking(move || op(&pipeline));

        match tokio::time::timeout(deadline, task).await {
            Err(_) => Err(ServerError::Timeout),
            Ok(Err(join_err)) => Err(ServerError::Internal(join_err.to_string())),
            Ok(Ok(result)) => result.map_err(ServerError::from),
        }
    }
}
