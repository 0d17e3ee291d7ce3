use std::error::Error;
use std::sync::Arc;

use ragcore::{
    Answerer, CacheConfig, Document, Embedder, ExtractiveAnswerer, RagPipeline, SemanticCache,
    StoreConfig, StubEmbedder, TenantStore,
};

/// Offline demo: ingest a small FAQ corpus for one tenant, then answer the
/// same question twice to show the rag → cache strategy transition.
fn main() -> Result<(), Box<dyn Error>> {
    let embedder: Arc<dyn Embedder> = Arc::new(StubEmbedder::default());
    let store = Arc::new(TenantStore::new(
        StoreConfig::new().with_root_dir("demo-vectorstores"),
        embedder.clone(),
    ));
    let cache = Arc::new(SemanticCache::new(CacheConfig::default(), embedder));
    let answerer: Arc<dyn Answerer> = Arc::new(ExtractiveAnswerer);
    let pipeline = RagPipeline::new(store, cache, answerer);

    let documents = vec![
        Document {
            id: "f1".into(),
            title: Some("Returns".into()),
            question: Some("What is your return window?".into()),
            answer: Some("30 days".into()),
            url: Some("https://example.com/returns".into()),
            tags: Some(vec!["policy".into()]),
            attributes: None,
            metadata: None,
        },
        Document {
            id: "f2".into(),
            title: Some("Shipping".into()),
            question: Some("Do you ship overseas?".into()),
            answer: Some("Yes, worldwide".into()),
            url: Some("https://example.com/shipping".into()),
            tags: Some(vec!["logistics".into()]),
            attributes: None,
            metadata: None,
        },
    ];

    let count = pipeline.ingest("demo", documents)?;
    println!("ingested {count} documents for tenant 'demo'");

    for _ in 0..2 {
        let result = pipeline.query("demo", "What is your return window?", Some(2))?;
        println!(
            "strategy={} latency={}ms context={} answer={:?}",
            result.strategy,
            result.latency_ms,
            result.context.len(),
            result.answer
        );
    }

    pipeline.delete_tenant("demo")?;
    Ok(())
}
