//! Similarity-indexed answer cache.
//!
//! Fronts retrieval and generation with a per-tenant, TTL-bounded cache of
//! previously generated answers, matched by cosine similarity of query
//! embeddings rather than exact text. State is process-lifetime only and is
//! never persisted.
//!
//! The failure policy is asymmetric on purpose: an embedding failure during
//! [`SemanticCache::put`] drops the write as an explicit soft failure, while
//! the same failure during [`SemanticCache::get`] propagates so the caller
//! falls back to retrieval instead of mistaking a broken embedder for a
//! clean miss.

mod config;

pub use config::CacheConfig;

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use thiserror::Error;

use embed::{l2_normalize_in_place, Embedder};

/// Errors surfaced by cache reads.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The query could not be embedded; the lookup result is unknowable.
    #[error("cache query embedding failed: {0}")]
    Embed(String),
}

/// Outcome of a cache write.
///
/// A dropped write is not an error: the answer was already produced and
/// delivered, the cache just could not index it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Stored,
    Dropped,
}

struct CacheEntry {
    answer: String,
    embedding: Vec<f32>,
    inserted_at: Instant,
}

type TenantEntries = DashMap<String, CacheEntry>;

/// Per-process semantic answer cache, sharded by tenant.
///
/// Lookup cost is O(entries for the tenant); acceptable for TTL-bounded
/// working sets, and the documented scalability bound of this design.
/// Growth is unbounded under high query diversity unless
/// [`CacheConfig::max_entries_per_tenant`] is set.
pub struct SemanticCache {
    cfg: CacheConfig,
    embedder: Arc<dyn Embedder>,
    tenants: DashMap<String, Arc<TenantEntries>>,
}

impl SemanticCache {
    pub fn new(cfg: CacheConfig, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            cfg,
            embedder,
            tenants: DashMap::new(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.cfg
    }

    /// Look up a semantically close query for this tenant.
    ///
    /// Entries past their TTL are evicted as they are encountered, even
    /// though this lookup can no longer match them. Returns the answer of
    /// the most similar live entry iff its cosine similarity reaches the
    /// configured threshold.
    pub fn get(&self, tenant: &str, query: &str) -> Result<Option<String>, CacheError> {
        let Some(entries) = self.tenants.get(tenant).map(|e| e.clone()) else {
            return Ok(None);
        };

        let mut query_vec = self
            .embedder
            .embed(query)
            .map_err(|e| CacheError::Embed(e.to_string()))?;
        l2_normalize_in_place(&mut query_vec);

        let now = Instant::now();
        let mut expired: Vec<String> = Vec::new();
        let mut best_sim = -1.0f32;
        let mut best_answer: Option<String> = None;

        for entry in entries.iter() {
            if now.duration_since(entry.inserted_at) > self.cfg.ttl {
                expired.push(entry.key().clone());
                continue;
            }
            let sim = dot(&query_vec, &entry.embedding);
            if sim > best_sim {
                best_sim = sim;
                best_answer = Some(entry.answer.clone());
            }
        }

        // Removal happens after the scan; removing mid-iteration would
        // deadlock on the shard the iterator holds.
        for key in expired {
            entries.remove(&key);
        }

        if best_sim >= self.cfg.similarity_threshold {
            tracing::debug!(tenant, similarity = best_sim, "semantic cache hit");
            Ok(best_answer)
        } else {
            Ok(None)
        }
    }

    /// Store an answer under the literal query text.
    ///
    /// Semantically equivalent but lexically distinct queries accumulate as
    /// separate entries until they expire. Storing the identical literal
    /// query again overwrites (last writer wins).
    pub fn put(&self, tenant: &str, query: &str, answer: &str) -> PutOutcome {
        let mut embedding = match self.embedder.embed(query) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(tenant, error = %e, "cache write dropped: embedding failed");
                return PutOutcome::Dropped;
            }
        };
        l2_normalize_in_place(&mut embedding);

        let entries = self
            .tenants
            .entry(tenant.to_string())
            .or_insert_with(|| Arc::new(DashMap::new()))
            .clone();

        if let Some(cap) = self.cfg.max_entries_per_tenant {
            if entries.len() >= cap && !entries.contains_key(query) {
                evict_oldest(&entries);
            }
        }

        entries.insert(
            query.to_string(),
            CacheEntry {
                answer: answer.to_string(),
                embedding,
                inserted_at: Instant::now(),
            },
        );
        PutOutcome::Stored
    }

    /// Drop every entry for a tenant. Called after corpus mutations so a
    /// repeated query re-runs retrieval against the new corpus.
    pub fn invalidate_tenant(&self, tenant: &str) {
        if self.tenants.remove(tenant).is_some() {
            tracing::debug!(tenant, "cache invalidated");
        }
    }

    /// Live entry count for a tenant (expired entries still pending lazy
    /// eviction included).
    pub fn len(&self, tenant: &str) -> usize {
        self.tenants.get(tenant).map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self, tenant: &str) -> bool {
        self.len(tenant) == 0
    }
}

fn evict_oldest(entries: &TenantEntries) {
    let oldest = entries
        .iter()
        .min_by_key(|entry| entry.inserted_at)
        .map(|entry| entry.key().clone());
    if let Some(key) = oldest {
        entries.remove(&key);
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
