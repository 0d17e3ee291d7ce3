//! Umbrella crate for the ragcore retrieval-augmented answering system.
//!
//! Wires the tenant vector store, the semantic answer cache, and a pluggable
//! answerer into one request pipeline so callers operate through a single
//! entry point. All collaborators are explicit, injectable instances; there
//! is no hidden global state.
//!
//! A query flows cache lookup → (hit: done) → retrieval → generation →
//! cache write. Any stage failure short-circuits the whole request; there
//! are no retries and no partial answers at this layer.

pub use cache::{CacheConfig, CacheError, PutOutcome, SemanticCache};
pub use embed::{
    l2_normalize_in_place, ApiEmbedder, ApiProvider, EmbedConfig, EmbedError, Embedder,
    StubEmbedder,
};
pub use store::{Document, DocumentShape, SearchHit, StoreConfig, StoreError, TenantStore};

pub mod prompt;

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Strategy tag for answers served from the semantic cache.
pub const STRATEGY_CACHE: &str = "cache";
/// Strategy tag for answers produced by retrieval plus generation.
pub const STRATEGY_RAG: &str = "rag";

/// Failure reported by an [`Answerer`]. Surfaced as a failed query; the
/// pipeline never retries generation.
#[derive(Debug, Error)]
#[error("generation failed: {0}")]
pub struct GenerationError(pub String);

/// Generation output. The pipeline treats `text` opaquely: it is passed
/// through to the caller and cached, never inspected.
#[derive(Debug, Clone)]
pub struct GeneratedAnswer {
    pub text: String,
    pub meta: AnswerMeta,
}

/// Generation bookkeeping surfaced for observability.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AnswerMeta {
    pub prompt_len: usize,
    pub gen_len: usize,
}

/// External text-generation collaborator.
pub trait Answerer: Send + Sync {
    fn generate(
        &self,
        query: &str,
        context: &[SearchHit],
    ) -> Result<GeneratedAnswer, GenerationError>;
}

/// Deterministic answerer that lifts its reply from the highest-scoring
/// context snippet. Stands in for a model in offline deployments and tests;
/// real models implement [`Answerer`] behind the same trait.
#[derive(Debug, Default)]
pub struct ExtractiveAnswerer;

impl Answerer for ExtractiveAnswerer {
    fn generate(
        &self,
        query: &str,
        context: &[SearchHit],
    ) -> Result<GeneratedAnswer, GenerationError> {
        let prompt = prompt::build_prompt(query, context);
        let text = match context.first() {
            Some(hit) => {
                if let Some(answer) = hit.answer.as_deref().filter(|a| !a.is_empty()) {
                    answer.to_string()
                } else if !hit.attributes.is_empty() {
                    hit.attributes
                        .iter()
                        .map(|(k, v)| format!("{k}: {}", prompt::attribute_text(v)))
                        .collect::<Vec<_>>()
                        .join("; ")
                } else {
                    hit.title.clone().unwrap_or_else(|| "I don't know.".into())
                }
            }
            None => "I don't know.".into(),
        };
        let gen_len = text.len();
        Ok(GeneratedAnswer {
            text,
            meta: AnswerMeta {
                prompt_len: prompt.len(),
                gen_len,
            },
        })
    }
}

/// Errors that can occur while answering a query through the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
    #[error("cache failure: {0}")]
    Cache(#[from] CacheError),
    #[error("generation failure: {0}")]
    Generation(#[from] GenerationError),
}

impl PipelineError {
    /// Stable machine-readable kind for transports and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Store(StoreError::TenantNotFound(_)) => "not_found",
            PipelineError::Store(StoreError::InvalidTenantId(_)) => "invalid_tenant",
            PipelineError::Store(StoreError::Ingestion(_)) => "ingest_failed",
            PipelineError::Store(StoreError::Embed(_)) => "embed_failed",
            PipelineError::Store(_) => "store_error",
            PipelineError::Cache(_) => "cache_embed_failed",
            PipelineError::Generation(_) => "generation_failed",
        }
    }
}

/// Completed answer for one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagAnswer {
    pub answer: String,
    /// `"cache"` or `"rag"`.
    pub strategy: String,
    pub latency_ms: u64,
    /// Retrieved context for `"rag"` answers; empty for cache hits.
    pub context: Vec<SearchHit>,
}

/// Pipeline-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagPipelineConfig {
    /// Results retrieved when the caller does not specify `top_k`.
    pub default_top_k: usize,
}

impl Default for RagPipelineConfig {
    fn default() -> Self {
        Self { default_top_k: 4 }
    }
}

impl RagPipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_top_k(mut self, top_k: usize) -> Self {
        self.default_top_k = top_k;
        self
    }
}

/// The request pipeline: sequences cache lookup, retrieval, generation, and
/// the cache write, and fronts every corpus mutation so cached answers never
/// outlive the corpus they were generated from.
pub struct RagPipeline {
    store: Arc<TenantStore>,
    cache: Arc<SemanticCache>,
    answerer: Arc<dyn Answerer>,
    cfg: RagPipelineConfig,
}

impl RagPipeline {
    pub fn new(
        store: Arc<TenantStore>,
        cache: Arc<SemanticCache>,
        answerer: Arc<dyn Answerer>,
    ) -> Self {
        Self {
            store,
            cache,
            answerer,
            cfg: RagPipelineConfig::default(),
        }
    }

    pub fn with_config(mut self, cfg: RagPipelineConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Answer a tenant query.
    ///
    /// A cache hit bypasses retrieval and generation entirely, with no
    /// re-validation of the retrieved context. On a miss, the generated
    /// answer is cached under the literal query text; a dropped cache write
    /// is logged and does not fail the request.
    pub fn query(
        &self,
        tenant: &str,
        query: &str,
        top_k: Option<usize>,
    ) -> Result<RagAnswer, PipelineError> {
        let started = Instant::now();

        if let Some(answer) = self.cache.get(tenant, query)? {
            tracing::debug!(tenant, "answered from semantic cache");
            return Ok(RagAnswer {
                answer,
                strategy: STRATEGY_CACHE.into(),
                latency_ms: started.elapsed().as_millis() as u64,
                context: Vec::new(),
            });
        }

        let top_k = top_k.unwrap_or(self.cfg.default_top_k);
        let context = self.store.search(tenant, query, top_k)?;
        let generated = self.answerer.generate(query, &context)?;

        if self.cache.put(tenant, query, &generated.text) == PutOutcome::Dropped {
            tracing::warn!(tenant, "cache write dropped after successful generation");
        }

        tracing::debug!(
            tenant,
            retrieved = context.len(),
            gen_len = generated.meta.gen_len,
            "answered via retrieval"
        );
        Ok(RagAnswer {
            answer: generated.text,
            strategy: STRATEGY_RAG.into(),
            latency_ms: started.elapsed().as_millis() as u64,
            context,
        })
    }

    /// Upsert documents and invalidate the tenant's cached answers so a
    /// repeated query re-runs retrieval against the new corpus.
    pub fn ingest(&self, tenant: &str, documents: Vec<Document>) -> Result<usize, PipelineError> {
        let count = self.store.upsert(tenant, documents)?;
        self.cache.invalidate_tenant(tenant);
        Ok(count)
    }

    pub fn list(&self, tenant: &str) -> Result<Vec<Document>, PipelineError> {
        Ok(self.store.list(tenant)?)
    }

    pub fn delete_tenant(&self, tenant: &str) -> Result<(), PipelineError> {
        self.store.delete_tenant(tenant)?;
        self.cache.invalidate_tenant(tenant);
        Ok(())
    }

    pub fn delete_document(&self, tenant: &str, doc_id: &str) -> Result<bool, PipelineError> {
        let removed = self.store.delete_document(tenant, doc_id)?;
        if removed {
            self.cache.invalidate_tenant(tenant);
        }
        Ok(removed)
    }

    pub fn store(&self) -> &Arc<TenantStore> {
        &self.store
    }

    pub fn cache(&self) -> &Arc<SemanticCache> {
        &self.cache
    }
}
