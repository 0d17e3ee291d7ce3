//! Tenant-scoped store orchestration: lazy lifecycle, single-writer
//! mutation, atomic generation publishing, and exact top-k search.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use embed::{l2_normalize_in_place, Embedder};

use crate::artifacts::{self, TenantPaths};
use crate::document::Document;
use crate::index::VectorIndex;
use crate::StoreError;

/// Store-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding one artifact namespace per tenant.
    pub root_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("vectorstores"),
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root_dir(mut self, root: impl Into<PathBuf>) -> Self {
        self.root_dir = root.into();
        self
    }
}

/// One committed snapshot of a tenant's coupled artifacts.
///
/// Immutable once published; mutations build a successor and swap the slot
/// pointer, so an in-flight search keeps a consistent triple.
struct TenantGeneration {
    index: VectorIndex,
    id_map: BTreeMap<String, usize>,
    row_ids: Vec<String>,
    docs: BTreeMap<String, Document>,
}

impl TenantGeneration {
    fn empty() -> Self {
        Self {
            index: VectorIndex::new(),
            id_map: BTreeMap::new(),
            row_ids: Vec::new(),
            docs: BTreeMap::new(),
        }
    }

    fn from_parts(
        index: VectorIndex,
        id_map: BTreeMap<String, usize>,
        docs: BTreeMap<String, Document>,
    ) -> Self {
        let mut row_ids = vec![String::new(); index.len()];
        for (id, &row) in &id_map {
            row_ids[row] = id.clone();
        }
        Self {
            index,
            id_map,
            row_ids,
            docs,
        }
    }
}

struct TenantSlot {
    /// Serializes the merge-rebuild-persist sequence (single-writer).
    write: Mutex<()>,
    /// Swapped whole to publish a new generation to readers.
    current: RwLock<Arc<TenantGeneration>>,
    /// Set when the tenant namespace is deleted; writers that raced the
    /// deletion re-resolve their slot instead of resurrecting state.
    defunct: AtomicBool,
}

impl TenantSlot {
    fn new(generation: TenantGeneration) -> Self {
        Self {
            write: Mutex::new(()),
            current: RwLock::new(Arc::new(generation)),
            defunct: AtomicBool::new(false),
        }
    }

    fn snapshot(&self) -> Arc<TenantGeneration> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn publish(&self, generation: TenantGeneration) {
        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Arc::new(generation);
    }
}

/// A single retrieved document with its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub title: Option<String>,
    pub url: Option<String>,
    pub score: f32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub attributes: serde_json::Map<String, Value>,
    pub question: Option<String>,
    pub answer: Option<String>,
    pub metadata: Option<Value>,
    /// Full stored document for downstream prompt assembly.
    pub document: Document,
}

impl SearchHit {
    fn new(id: String, score: f32, document: Document) -> Self {
        Self {
            title: document.title.clone(),
            url: document.url.clone(),
            tags: document.tags.clone().unwrap_or_default(),
            attributes: document.attributes.clone().unwrap_or_default(),
            question: document.question.clone(),
            answer: document.answer.clone(),
            metadata: document.metadata.clone(),
            id,
            score,
            document,
        }
    }
}

/// Row/document counts for one tenant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StoreStats {
    pub documents: usize,
    pub rows: usize,
    pub dimension: usize,
}

/// Multi-tenant vector store.
///
/// Tenants are created lazily on first ingest, loaded from persisted
/// artifacts on first access after a restart, and removed wholesale on
/// deletion. Distinct tenants never share state.
pub struct TenantStore {
    root: PathBuf,
    embedder: Arc<dyn Embedder>,
    tenants: DashMap<String, Arc<TenantSlot>>,
}

impl TenantStore {
    pub fn new(cfg: StoreConfig, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            root: cfg.root_dir,
            embedder,
            tenants: DashMap::new(),
        }
    }

    /// Insert or update documents for a tenant; returns the submitted count.
    ///
    /// Appends when no incoming id exists in a non-empty index; any id
    /// collision forces a full re-embed and rebuild because the flat index
    /// cannot replace one row in place. Either way the artifact triple is
    /// persisted before the new generation becomes visible to readers.
    pub fn upsert(&self, tenant: &str, documents: Vec<Document>) -> Result<usize, StoreError> {
        validate_tenant_id(tenant)?;
        let submitted = documents.len();
        if submitted == 0 {
            return Ok(0);
        }
        if documents.iter().any(|d| d.id.is_empty()) {
            return Err(StoreError::Ingestion(
                "document id must not be empty".into(),
            ));
        }

        // Within one batch the last occurrence of an id wins, keeping the
        // row map a bijection on the append path.
        let mut incoming: Vec<Document> = Vec::with_capacity(submitted);
        let mut positions: HashMap<String, usize> = HashMap::with_capacity(submitted);
        for doc in documents {
            match positions.get(&doc.id) {
                Some(&pos) => incoming[pos] = doc,
                None => {
                    positions.insert(doc.id.clone(), incoming.len());
                    incoming.push(doc);
                }
            }
        }

        loop {
            let slot = self.slot_or_create(tenant)?;
            let _writer = slot.write.lock().unwrap_or_else(|p| p.into_inner());
            if slot.defunct.load(Ordering::Acquire) {
                continue;
            }

            let current = slot.snapshot();
            let collision = !current.index.is_empty()
                && incoming.iter().any(|d| current.id_map.contains_key(&d.id));

            let next = if collision {
                tracing::debug!(
                    tenant,
                    incoming = incoming.len(),
                    existing = current.docs.len(),
                    "id collision; re-embedding full registry"
                );
                let mut docs = current.docs.clone();
                for doc in &incoming {
                    docs.insert(doc.id.clone(), doc.clone());
                }
                self.build_generation(docs).map_err(into_ingestion)?
            } else {
                tracing::debug!(tenant, appended = incoming.len(), "append fast path");
                let texts: Vec<String> =
                    incoming.iter().map(|d| d.embedding_text()).collect();
                let vectors = self.embed_unit_batch(&texts).map_err(into_ingestion)?;

                let mut index = current.index.clone();
                let mut id_map = current.id_map.clone();
                let mut row_ids = current.row_ids.clone();
                let mut docs = current.docs.clone();
                for (doc, vector) in incoming.iter().zip(vectors) {
                    let row = index.append(vector).map_err(into_ingestion)?;
                    id_map.insert(doc.id.clone(), row);
                    row_ids.push(doc.id.clone());
                    docs.insert(doc.id.clone(), doc.clone());
                }
                TenantGeneration {
                    index,
                    id_map,
                    row_ids,
                    docs,
                }
            };

            self.persist(tenant, &next).map_err(into_ingestion)?;
            slot.publish(next);
            return Ok(submitted);
        }
    }

    /// Exact top-k cosine search, descending score, ties broken by id.
    pub fn search(
        &self,
        tenant: &str,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchHit>, StoreError> {
        validate_tenant_id(tenant)?;
        let slot = self
            .slot_if_exists(tenant)?
            .ok_or_else(|| StoreError::TenantNotFound(tenant.to_string()))?;
        let generation = slot.snapshot();
        if generation.index.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let mut query_vec = self
            .embedder
            .embed(query)
            .map_err(|e| StoreError::Embed(e.to_string()))?;
        l2_normalize_in_place(&mut query_vec);
        let scores = generation.index.scores(&query_vec)?;

        let mut ranked: Vec<(usize, f32)> = scores.into_iter().enumerate().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| generation.row_ids[a.0].cmp(&generation.row_ids[b.0]))
        });
        ranked.truncate(top_k);

        let mut hits = Vec::with_capacity(ranked.len());
        for (row, score) in ranked {
            // A row without a mapped id signals no match; skip it silently.
            let Some(id) = generation.row_ids.get(row).filter(|id| !id.is_empty()) else {
                continue;
            };
            let Some(doc) = generation.docs.get(id) else {
                continue;
            };
            hits.push(SearchHit::new(id.clone(), score, doc.clone()));
        }
        Ok(hits)
    }

    /// All stored documents for a tenant, in registry (id) order.
    pub fn list(&self, tenant: &str) -> Result<Vec<Document>, StoreError> {
        validate_tenant_id(tenant)?;
        let slot = self
            .slot_if_exists(tenant)?
            .ok_or_else(|| StoreError::TenantNotFound(tenant.to_string()))?;
        Ok(slot.snapshot().docs.values().cloned().collect())
    }

    /// Row/document counts; `TenantNotFound` when the tenant is absent.
    pub fn stats(&self, tenant: &str) -> Result<StoreStats, StoreError> {
        validate_tenant_id(tenant)?;
        let slot = self
            .slot_if_exists(tenant)?
            .ok_or_else(|| StoreError::TenantNotFound(tenant.to_string()))?;
        let generation = slot.snapshot();
        Ok(StoreStats {
            documents: generation.docs.len(),
            rows: generation.index.len(),
            dimension: generation.index.dimension(),
        })
    }

    /// Remove a tenant's whole namespace. No-op when absent; idempotent.
    pub fn delete_tenant(&self, tenant: &str) -> Result<(), StoreError> {
        validate_tenant_id(tenant)?;
        if let Some((_, slot)) = self.tenants.remove(tenant) {
            let _writer = slot.write.lock().unwrap_or_else(|p| p.into_inner());
            slot.defunct.store(true, Ordering::Release);
        }
        let paths = TenantPaths::new(&self.root, tenant);
        match fs::remove_dir_all(&paths.dir) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        tracing::info!(tenant, "tenant namespace deleted");
        Ok(())
    }

    /// Remove one document and rebuild the index so its row stops being
    /// searchable immediately. Returns whether the document existed.
    pub fn delete_document(&self, tenant: &str, doc_id: &str) -> Result<bool, StoreError> {
        validate_tenant_id(tenant)?;
        loop {
            let slot = self
                .slot_if_exists(tenant)?
                .ok_or_else(|| StoreError::TenantNotFound(tenant.to_string()))?;
            let _writer = slot.write.lock().unwrap_or_else(|p| p.into_inner());
            if slot.defunct.load(Ordering::Acquire) {
                continue;
            }

            let current = slot.snapshot();
            if !current.docs.contains_key(doc_id) {
                return Ok(false);
            }
            let mut docs = current.docs.clone();
            docs.remove(doc_id);

            // Dropping a row shifts every later row, so the whole corpus is
            // re-embedded and the map rebuilt rather than leaving a stale,
            // still-searchable vector behind.
            let next = self.build_generation(docs).map_err(into_ingestion)?;
            self.persist(tenant, &next).map_err(into_ingestion)?;
            slot.publish(next);
            tracing::debug!(tenant, doc_id, "document deleted; index rebuilt");
            return Ok(true);
        }
    }

    fn slot_if_exists(&self, tenant: &str) -> Result<Option<Arc<TenantSlot>>, StoreError> {
        if let Some(slot) = self.tenants.get(tenant) {
            return Ok(Some(slot.clone()));
        }
        let paths = TenantPaths::new(&self.root, tenant);
        match artifacts::load(&paths)? {
            Some((index, id_map, docs)) => {
                let generation = TenantGeneration::from_parts(index, id_map, docs);
                let slot = self
                    .tenants
                    .entry(tenant.to_string())
                    .or_insert_with(|| Arc::new(TenantSlot::new(generation)))
                    .clone();
                Ok(Some(slot))
            }
            None => Ok(None),
        }
    }

    fn slot_or_create(&self, tenant: &str) -> Result<Arc<TenantSlot>, StoreError> {
        if let Some(slot) = self.slot_if_exists(tenant)? {
            return Ok(slot);
        }
        Ok(self
            .tenants
            .entry(tenant.to_string())
            .or_insert_with(|| Arc::new(TenantSlot::new(TenantGeneration::empty())))
            .clone())
    }

    /// Fresh generation from a merged registry, embedding in id order.
    fn build_generation(
        &self,
        docs: BTreeMap<String, Document>,
    ) -> Result<TenantGeneration, StoreError> {
        if docs.is_empty() {
            return Ok(TenantGeneration::empty());
        }
        let texts: Vec<String> = docs.values().map(|d| d.embedding_text()).collect();
        let vectors = self.embed_unit_batch(&texts)?;

        let mut index = VectorIndex::new();
        let mut id_map = BTreeMap::new();
        let mut row_ids = Vec::with_capacity(docs.len());
        for (id, vector) in docs.keys().zip(vectors) {
            let row = index.append(vector)?;
            id_map.insert(id.clone(), row);
            row_ids.push(id.clone());
        }
        Ok(TenantGeneration {
            index,
            id_map,
            row_ids,
            docs,
        })
    }

    fn embed_unit_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, StoreError> {
        let mut vectors = self
            .embedder
            .embed_batch(texts)
            .map_err(|e| StoreError::Embed(e.to_string()))?;
        if vectors.len() != texts.len() {
            return Err(StoreError::Embed(format!(
                "embedder returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            )));
        }
        for vector in &mut vectors {
            l2_normalize_in_place(vector);
        }
        Ok(vectors)
    }

    fn persist(&self, tenant: &str, generation: &TenantGeneration) -> Result<(), StoreError> {
        let paths = TenantPaths::new(&self.root, tenant);
        artifacts::save(&paths, &generation.index, &generation.id_map, &generation.docs)
    }
}

fn into_ingestion(err: StoreError) -> StoreError {
    match err {
        StoreError::Ingestion(_) | StoreError::TenantNotFound(_) => err,
        other => StoreError::Ingestion(other.to_string()),
    }
}

/// Tenant ids become directory names under the store root.
fn validate_tenant_id(tenant: &str) -> Result<(), StoreError> {
    let ok = !tenant.is_empty()
        && tenant != "."
        && tenant != ".."
        && tenant
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidTenantId(tenant.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embed::EmbedError;
    use std::hash::{DefaultHasher, Hash, Hasher};
    use std::sync::atomic::AtomicUsize;

    /// Deterministic character-trigram embedder that counts every embedded
    /// text, so tests can assert how much re-embedding a call performed.
    struct CountingEmbedder {
        texts_embedded: AtomicUsize,
        fail: AtomicBool,
    }

    impl CountingEmbedder {
        fn new() -> Self {
            Self {
                texts_embedded: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
            }
        }

        fn count(&self) -> usize {
            self.texts_embedded.load(Ordering::SeqCst)
        }
    }

    impl Embedder for CountingEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(EmbedError::Http("injected failure".into()));
            }
            self.texts_embedded.fetch_add(1, Ordering::SeqCst);
            let bytes = text.as_bytes();
            let mut v = vec![0f32; 32];
            for window in bytes.windows(3) {
                let mut hasher = DefaultHasher::new();
                window.hash(&mut hasher);
                v[(hasher.finish() % 32) as usize] += 1.0;
            }
            Ok(v)
        }
    }

    fn faq(id: &str, question: &str, answer: &str) -> Document {
        Document {
            id: id.into(),
            title: Some(id.to_uppercase()),
            question: Some(question.into()),
            answer: Some(answer.into()),
            url: None,
            tags: None,
            attributes: None,
            metadata: None,
        }
    }

    fn store_at(root: &std::path::Path) -> (TenantStore, Arc<CountingEmbedder>) {
        let embedder = Arc::new(CountingEmbedder::new());
        let store = TenantStore::new(
            StoreConfig::new().with_root_dir(root),
            embedder.clone() as Arc<dyn Embedder>,
        );
        (store, embedder)
    }

    #[test]
    fn append_fast_path_skips_reembedding_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let (store, embedder) = store_at(dir.path());

        store
            .upsert(
                "acme",
                vec![
                    faq("f1", "What is your return window?", "30 days"),
                    faq("f2", "Do you ship overseas?", "Yes, worldwide"),
                ],
            )
            .unwrap();
        assert_eq!(embedder.count(), 2);

        store
            .upsert(
                "acme",
                vec![
                    faq("f3", "How do I reset my password?", "Use the reset link"),
                    faq("f4", "Is there a free tier?", "Yes, 100 requests/day"),
                ],
            )
            .unwrap();
        // Only the two new documents were embedded.
        assert_eq!(embedder.count(), 4);

        let stats = store.stats("acme").unwrap();
        assert_eq!(stats.documents, 4);
        assert_eq!(stats.rows, 4);
    }

    #[test]
    fn id_collision_rebuilds_whole_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let (store, embedder) = store_at(dir.path());

        store
            .upsert(
                "acme",
                vec![
                    faq("f1", "What is your return window?", "30 days"),
                    faq("f2", "Do you ship overseas?", "Yes"),
                    faq("f3", "Warranty length?", "Two years"),
                ],
            )
            .unwrap();
        assert_eq!(embedder.count(), 3);

        // Overwrite f2: whole registry (3 docs) re-embedded.
        store
            .upsert("acme", vec![faq("f2", "Do you ship overseas?", "EU only")])
            .unwrap();
        assert_eq!(embedder.count(), 6);

        let docs = store.list("acme").unwrap();
        assert_eq!(docs.len(), 3);
        let f2 = docs.iter().find(|d| d.id == "f2").unwrap();
        assert_eq!(f2.answer.as_deref(), Some("EU only"));
        // Non-colliding content survives the rebuild.
        assert!(docs.iter().any(|d| d.id == "f1"));
        assert!(docs.iter().any(|d| d.id == "f3"));
    }

    #[test]
    fn duplicate_ids_within_batch_keep_last_and_stay_bijective() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = store_at(dir.path());

        store
            .upsert(
                "acme",
                vec![
                    faq("f1", "First version?", "One"),
                    faq("f1", "Second version?", "Two"),
                ],
            )
            .unwrap();

        let stats = store.stats("acme").unwrap();
        assert_eq!(stats.documents, 1);
        assert_eq!(stats.rows, 1);
        let docs = store.list("acme").unwrap();
        assert_eq!(docs[0].answer.as_deref(), Some("Two"));
    }

    #[test]
    fn stored_vectors_are_unit_norm() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = store_at(dir.path());
        store
            .upsert(
                "acme",
                vec![
                    faq("f1", "What is your return window?", "30 days"),
                    faq("f2", "Do you ship overseas?", "Yes"),
                ],
            )
            .unwrap();

        let paths = TenantPaths::new(dir.path(), "acme");
        let (index, id_map, docs) = artifacts::load(&paths).unwrap().unwrap();
        assert_eq!(index.len(), id_map.len());
        assert_eq!(index.len(), docs.len());
        for row in 0..index.len() {
            let norm: f64 = index
                .row(row)
                .unwrap()
                .iter()
                .map(|x| (*x as f64).powi(2))
                .sum::<f64>()
                .sqrt();
            assert!((norm - 1.0).abs() < 1e-6, "row {row} norm {norm}");
        }
    }

    #[test]
    fn search_ranks_by_score_then_id() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = store_at(dir.path());
        store
            .upsert(
                "acme",
                vec![
                    faq("f1", "What is your return window?", "30 days"),
                    faq("f2", "Do you ship overseas?", "Yes"),
                    faq("f3", "Warranty length?", "Two years"),
                ],
            )
            .unwrap();

        let hits = store
            .search("acme", "Q: What is your return window?", 1)
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "f1");

        let all = store.search("acme", "What is your return window?", 3).unwrap();
        assert_eq!(all.len(), 3);
        for pair in all.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn equal_scores_break_ties_by_ascending_id() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = store_at(dir.path());
        // Identical embedding text under different ids -> identical vectors.
        let mut b = faq("b-doc", "Same question?", "Same answer");
        let mut a = faq("a-doc", "Same question?", "Same answer");
        b.title = Some("X".into());
        a.title = Some("X".into());
        store.upsert("acme", vec![b, a]).unwrap();

        let hits = store.search("acme", "Same question?", 2).unwrap();
        assert_eq!(hits[0].id, "a-doc");
        assert_eq!(hits[1].id, "b-doc");
        assert_eq!(hits[0].score, hits[1].score);
    }

    #[test]
    fn top_k_beyond_corpus_returns_all_unpadded() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = store_at(dir.path());
        store
            .upsert("acme", vec![faq("f1", "Only document?", "Yes")])
            .unwrap();
        let hits = store.search("acme", "Only document?", 10).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn search_unknown_tenant_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = store_at(dir.path());
        assert!(matches!(
            store.search("ghost", "anything", 3),
            Err(StoreError::TenantNotFound(_))
        ));
        assert!(matches!(
            store.list("ghost"),
            Err(StoreError::TenantNotFound(_))
        ));
    }

    #[test]
    fn store_reloads_from_artifacts_after_restart() {
        let dir = tempfile::tempdir().unwrap();
        {
            let (store, _) = store_at(dir.path());
            store
                .upsert(
                    "acme",
                    vec![
                        faq("f1", "What is your return window?", "30 days"),
                        faq("f2", "Do you ship overseas?", "Yes"),
                    ],
                )
                .unwrap();
        }

        let (reopened, _) = store_at(dir.path());
        let hits = reopened
            .search("acme", "What is your return window?", 2)
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "f1");
        assert_eq!(hits[0].answer.as_deref(), Some("30 days"));
    }

    #[test]
    fn delete_tenant_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = store_at(dir.path());
        store
            .upsert("acme", vec![faq("f1", "Q?", "A")])
            .unwrap();

        store.delete_tenant("acme").unwrap();
        assert!(matches!(
            store.search("acme", "Q?", 1),
            Err(StoreError::TenantNotFound(_))
        ));

        // Deleting again, and deleting a tenant that never existed, are no-ops.
        store.delete_tenant("acme").unwrap();
        store.delete_tenant("never-there").unwrap();
    }

    #[test]
    fn delete_document_rebuilds_and_removes_row() {
        let dir = tempfile::tempdir().unwrap();
        let (store, embedder) = store_at(dir.path());
        store
            .upsert(
                "acme",
                vec![
                    faq("f1", "What is your return window?", "30 days"),
                    faq("f2", "Do you ship overseas?", "Yes"),
                ],
            )
            .unwrap();
        assert_eq!(embedder.count(), 2);

        assert!(store.delete_document("acme", "f1").unwrap());
        // Remaining corpus re-embedded.
        assert_eq!(embedder.count(), 3);

        let stats = store.stats("acme").unwrap();
        assert_eq!(stats.documents, 1);
        assert_eq!(stats.rows, 1);
        let hits = store
            .search("acme", "What is your return window?", 5)
            .unwrap();
        assert!(hits.iter().all(|h| h.id != "f1"));

        assert!(!store.delete_document("acme", "f1").unwrap());
    }

    #[test]
    fn embed_failure_during_upsert_is_ingestion_and_publishes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (store, embedder) = store_at(dir.path());
        store
            .upsert("acme", vec![faq("f1", "Q?", "A")])
            .unwrap();

        embedder.fail.store(true, Ordering::SeqCst);
        let result = store.upsert("acme", vec![faq("f2", "Other?", "B")]);
        assert!(matches!(result, Err(StoreError::Ingestion(_))));
        embedder.fail.store(false, Ordering::SeqCst);

        // Prior state still intact for readers.
        let stats = store.stats("acme").unwrap();
        assert_eq!(stats.documents, 1);
        assert_eq!(stats.rows, 1);
    }

    #[test]
    fn invalid_tenant_ids_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = store_at(dir.path());
        for bad in ["", "..", "a/b", "a\\b"] {
            assert!(matches!(
                store.upsert(bad, vec![faq("f1", "Q?", "A")]),
                Err(StoreError::InvalidTenantId(_))
            ));
        }
    }
}
