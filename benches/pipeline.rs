use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::sync::Arc;

use ragcore::{
    Answerer, CacheConfig, Document, Embedder, ExtractiveAnswerer, RagPipeline, SemanticCache,
    StoreConfig, StubEmbedder, TenantStore,
};

fn corpus(n: usize) -> Vec<Document> {
    (0..n)
        .map(|i| Document {
            id: format!("doc-{i:05}"),
            title: Some(format!("Article {i}")),
            question: Some(format!("What does configuration option {i} control?")),
            answer: Some(format!("It controls subsystem {} behavior.", i % 17)),
            url: Some(format!("https://example.com/kb/{i}")),
            tags: Some(vec!["kb".into()]),
            attributes: None,
            metadata: None,
        })
        .collect()
}

fn bench_store(root: &std::path::Path) -> TenantStore {
    TenantStore::new(
        StoreConfig::new().with_root_dir(root),
        Arc::new(StubEmbedder::default()) as Arc<dyn Embedder>,
    )
}

fn bench_ingest_append(c: &mut Criterion) {
    let docs = corpus(500);

    c.bench_function("ingest_append_500_docs", |b| {
        b.iter_batched(
            || (tempfile::tempdir().expect("bench dir"), docs.clone()),
            |(dir, docs)| {
                let store = bench_store(dir.path());
                store.upsert("bench", docs).expect("append succeeds");
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_ingest_rebuild(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("bench dir");
    let store = bench_store(dir.path());
    store.upsert("bench", corpus(500)).expect("seed corpus");
    let colliding = corpus(1);

    c.bench_function("ingest_rebuild_on_collision_500_docs", |b| {
        b.iter_batched(
            || colliding.clone(),
            |docs| {
                store.upsert("bench", docs).expect("rebuild succeeds");
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_search(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("bench dir");
    let store = bench_store(dir.path());
    store.upsert("bench", corpus(2_000)).expect("seed corpus");

    c.bench_function("search_top5_of_2000_rows", |b| {
        b.iter(|| {
            let hits = store
                .search("bench", black_box("What does configuration option 42 control?"), 5)
                .expect("search succeeds");
            black_box(hits);
        });
    });
}

fn bench_query_strategies(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("bench dir");
    let embedder: Arc<dyn Embedder> = Arc::new(StubEmbedder::default());
    let store = Arc::new(TenantStore::new(
        StoreConfig::new().with_root_dir(dir.path()),
        embedder.clone(),
    ));
    let cache = Arc::new(SemanticCache::new(CacheConfig::default(), embedder));
    let answerer: Arc<dyn Answerer> = Arc::new(ExtractiveAnswerer);
    let pipeline = RagPipeline::new(store, cache, answerer);
    pipeline.ingest("bench", corpus(1_000)).expect("seed corpus");

    // The first query populates the cache; subsequent identical queries hit it.
    let question = "What does configuration option 7 control?";
    pipeline
        .query("bench", question, Some(4))
        .expect("warm query");

    c.bench_function("query_cache_hit", |b| {
        b.iter(|| {
            let result = pipeline
                .query("bench", black_box(question), Some(4))
                .expect("cached query");
            black_box(result);
        });
    });

    c.bench_function("query_full_rag_path", |b| {
        let mut i = 0u64;
        b.iter_batched(
            || {
                // A fresh literal query misses the cache and runs retrieval
                // plus generation; clearing keeps the miss-scan cost flat
                // across iterations.
                pipeline.cache().invalidate_tenant("bench");
                i += 1;
                format!("Unseen question number {i}?")
            },
            |query| {
                let result = pipeline
                    .query("bench", black_box(&query), Some(4))
                    .expect("rag query");
                black_box(result);
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    pipeline_benches,
    bench_ingest_append,
    bench_ingest_rebuild,
    bench_search,
    bench_query_strategies
);
criterion_main!(pipeline_benches);
