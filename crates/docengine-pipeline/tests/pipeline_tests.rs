use std::sync::{Arc, Mutex};

use docengine_core::config::RetrievalConfig;
use docengine_core::documents::DirectorySource;
use docengine_core::error::{Error, Result};
use docengine_core::traits::EmbedProvider;
use docengine_core::types::{Document, Vector};
use docengine_embed::HashEmbedder;
use docengine_pipeline::RetrievalPipeline;

/// Wraps the hash embedder and records every batch size it is asked for.
struct Recording {
    inner: HashEmbedder,
    calls: Mutex<Vec<usize>>,
}

impl Recording {
    fn new(inner: HashEmbedder) -> Self {
        Self { inner, calls: Mutex::new(Vec::new()) }
    }

    fn calls(&self) -> Vec<usize> {
        self.calls.lock().unwrap().clone()
    }
}

impl EmbedProvider for Recording {
    fn embedder_id(&self) -> &str { self.inner.embedder_id() }
    fn dim(&self) -> usize { self.inner.dim() }
    fn max_batch(&self) -> Option<usize> { self.inner.max_batch() }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>> {
        self.calls.lock().unwrap().push(texts.len());
        self.inner.embed_batch(texts)
    }
}

/// Misbehaves on purpose depending on the text it sees.
struct Quirky(HashEmbedder);

impl EmbedProvider for Quirky {
    fn embedder_id(&self) -> &str { "quirky" }
    fn dim(&self) -> usize { self.0.dim() }
    fn max_batch(&self) -> Option<usize> { None }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>> {
        if texts.iter().any(|t| t.contains("boom")) {
            return Err(Error::Provider("boom".into()));
        }
        if texts.iter().any(|t| t.contains("short")) {
            return Ok(Vec::new());
        }
        Ok(texts
            .iter()
            .map(|t| if t.contains("blank") { vec![0.0; self.0.dim()] } else { self.0.embed_text(t) })
            .collect())
    }
}

fn docs() -> Vec<Document> {
    vec![
        Document::new("a.txt", "the quick brown fox jumps over the lazy dog"),
        Document::new("b.txt", "rust ownership and borrowing rules"),
        Document::new("c.txt", "vector search with cosine similarity"),
    ]
}

fn pipeline(config: RetrievalConfig, provider: Arc<dyn EmbedProvider>) -> RetrievalPipeline {
    RetrievalPipeline::new(config, provider).unwrap()
}

#[test]
fn exact_text_query_ranks_its_chunk_first() {
    let p = pipeline(RetrievalConfig::default(), Arc::new(HashEmbedder::new(64)));
    let retriever = p.build(&docs()).unwrap();
    assert_eq!(retriever.stats().documents, 3);
    assert_eq!(retriever.stats().chunks, 3);
    assert_eq!(retriever.stats().dim, Some(64));

    let hits = retriever.query("rust ownership and borrowing rules", 2).unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].rank, 1);
    assert_eq!(hits[1].rank, 2);
    assert_eq!(hits[0].source, "b.txt");
    assert_eq!(hits[0].chunk_id, 1);
    assert_eq!(hits[0].text, "rust ownership and borrowing rules");
    assert!((hits[0].score - 1.0).abs() < 1e-4, "score {}", hits[0].score);
    assert!(hits[0].distance < 1e-4);
    assert!(hits[0].distance <= hits[1].distance);
}

#[test]
fn k_larger_than_corpus_returns_everything() {
    let p = pipeline(RetrievalConfig::default(), Arc::new(HashEmbedder::new(32)));
    let retriever = p.build(&docs()).unwrap();
    let hits = retriever.query("fox", 10).unwrap();
    assert_eq!(hits.len(), 3);
    assert_eq!(hits.iter().map(|h| h.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
    let mut ids: Vec<_> = hits.iter().map(|h| h.chunk_id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![0, 1, 2]);
}

#[test]
fn builds_are_deterministic() {
    let p = pipeline(RetrievalConfig::default(), Arc::new(HashEmbedder::new(48)));
    let first = p.build(&docs()).unwrap().query("search similarity", 3).unwrap();
    let second = p.build(&docs()).unwrap().query("search similarity", 3).unwrap();
    assert_eq!(first, second);
}

#[test]
fn query_top_uses_configured_k() {
    let config = RetrievalConfig { top_k: 2, ..Default::default() };
    let p = pipeline(config, Arc::new(HashEmbedder::new(32)));
    let retriever = p.build(&docs()).unwrap();
    assert_eq!(retriever.query_top("dog").unwrap().len(), 2);
}

#[test]
fn chunk_ids_are_global_and_positions_per_document() {
    let config = RetrievalConfig { chunk_size: 10, overlap: 4, ..Default::default() };
    let p = pipeline(config, Arc::new(HashEmbedder::new(16)));
    let source = vec![Document::new("long", "abcdefghijklmnopqrst"), Document::new("short", "xyz")];
    let retriever = p.build(&source).unwrap();

    let chunks = retriever.chunks();
    assert_eq!(chunks.len(), 5);
    assert_eq!(chunks.iter().map(|c| c.id).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
    assert_eq!(chunks.iter().map(|c| c.position).collect::<Vec<_>>(), vec![0, 1, 2, 3, 0]);
    assert_eq!(chunks[1].text, "ghijklmnop");
    assert_eq!(chunks[4].source, "short");
    assert_eq!(retriever.index().len(), 5);
    assert_eq!(retriever.index().meta(4).map(|m| m.source.as_str()), Some("short"));
}

#[test]
fn batches_respect_provider_limit() {
    let config = RetrievalConfig { chunk_size: 10, overlap: 4, ..Default::default() };
    let provider = Arc::new(Recording::new(HashEmbedder::new(16).with_max_batch(2)));
    let p = pipeline(config, provider.clone());
    assert_eq!(p.batch_size(), 2);

    let source = vec![Document::new("long", "abcdefghijklmnopqrst"), Document::new("short", "xyz")];
    p.build(&source).unwrap();
    assert_eq!(provider.calls(), vec![2, 2, 1]);
}

#[test]
fn batches_respect_configured_size() {
    let config = RetrievalConfig { chunk_size: 10, overlap: 4, embed_batch_size: 3, ..Default::default() };
    let provider = Arc::new(Recording::new(HashEmbedder::new(16)));
    let p = pipeline(config, provider.clone());
    let source = vec![Document::new("long", "abcdefghijklmnopqrst"), Document::new("short", "xyz")];
    p.build(&source).unwrap();
    assert_eq!(provider.calls(), vec![3, 2]);
}

#[test]
fn empty_query_skips_provider() {
    let provider = Arc::new(Recording::new(HashEmbedder::new(16)));
    let p = pipeline(RetrievalConfig::default(), provider.clone());
    let retriever = p.build(&docs()).unwrap();
    let before = provider.calls().len();

    assert!(retriever.query("", 3).unwrap().is_empty());
    assert_eq!(provider.calls().len(), before);
}

#[test]
fn zero_k_is_rejected() {
    let p = pipeline(RetrievalConfig::default(), Arc::new(HashEmbedder::new(16)));
    let retriever = p.build(&docs()).unwrap();
    assert!(matches!(retriever.query("fox", 0), Err(Error::InvalidArgument(_))));
}

#[test]
fn zero_vector_chunk_fails_the_build() {
    let p = pipeline(RetrievalConfig::default(), Arc::new(Quirky(HashEmbedder::new(16))));
    let source = vec![Document::new("a", "some words"), Document::new("b", "blank page")];
    match p.build(&source) {
        Err(Error::DegenerateVector { chunk_id }) => assert_eq!(chunk_id, 1),
        other => panic!("expected DegenerateVector, got {:?}", other.map(|r| r.stats())),
    }
}

#[test]
fn provider_count_mismatch_is_an_error() {
    let p = pipeline(RetrievalConfig::default(), Arc::new(Quirky(HashEmbedder::new(16))));
    let source = vec![Document::new("a", "too short")];
    assert!(matches!(p.build(&source), Err(Error::Provider(_))));
}

#[test]
fn failed_query_leaves_retriever_usable() {
    let p = pipeline(RetrievalConfig::default(), Arc::new(Quirky(HashEmbedder::new(16))));
    let retriever = p.build(&docs()).unwrap();

    assert!(matches!(retriever.query("boom", 1), Err(Error::Provider(_))));
    assert!(matches!(retriever.query("blank", 1), Err(Error::DegenerateQuery)));
    let hits = retriever.query("lazy dog", 1).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(retriever.stats().chunks, 3);
}

#[test]
fn empty_source_builds_empty_index() {
    let p = pipeline(RetrievalConfig::default(), Arc::new(HashEmbedder::new(16)));
    let retriever = p.build(&Vec::<Document>::new()).unwrap();
    assert_eq!(retriever.stats().chunks, 0);
    assert_eq!(retriever.stats().dim, None);
    assert!(retriever.query("anything", 3).unwrap().is_empty());
}

#[test]
fn invalid_config_is_rejected() {
    let config = RetrievalConfig { chunk_size: 100, overlap: 100, ..Default::default() };
    let result = RetrievalPipeline::new(config, Arc::new(HashEmbedder::new(16)));
    assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
}

#[test]
fn concurrent_queries_share_one_retriever() {
    let p = pipeline(RetrievalConfig::default(), Arc::new(HashEmbedder::new(32)));
    let retriever = p.build(&docs()).unwrap();
    let expected = retriever.query("quick brown fox", 3).unwrap();

    let shared = &retriever;
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4).map(|_| s.spawn(move || shared.query("quick brown fox", 3).unwrap())).collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), expected);
        }
    });
}

#[tokio::test]
async fn concurrent_build_matches_sequential_build() {
    let config = RetrievalConfig { chunk_size: 10, overlap: 4, embed_batch_size: 2, ..Default::default() };
    let p = pipeline(config, Arc::new(HashEmbedder::new(24)));
    let source = vec![
        Document::new("one", "abcdefghijklmnopqrstuvwxyz"),
        Document::new("two", "the lazy dog sleeps all afternoon"),
    ];

    let sequential = p.build(&source).unwrap();
    let concurrent = p.build_concurrent(&source, 3).await.unwrap();

    assert_eq!(sequential.chunks(), concurrent.chunks());
    assert_eq!(sequential.stats(), concurrent.stats());
    for q in ["lazy dog", "mnopqr", "afternoon"] {
        assert_eq!(sequential.query(q, 4).unwrap(), concurrent.query(q, 4).unwrap());
    }
}

#[tokio::test]
async fn concurrent_build_surfaces_provider_errors() {
    let p = pipeline(RetrievalConfig::default(), Arc::new(Quirky(HashEmbedder::new(16))));
    let source = vec![Document::new("a", "fine"), Document::new("b", "boom")];
    assert!(matches!(p.build_concurrent(&source, 2).await, Err(Error::Provider(_))));
}

#[test]
fn directory_source_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "candle runs the embedding model on cpu").unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    std::fs::write(dir.path().join("sub").join("recipes.txt"), "sourdough bread needs a starter").unwrap();
    std::fs::write(dir.path().join("ignored.md"), "markdown is skipped").unwrap();

    let source = DirectorySource::new(dir.path());
    let p = pipeline(RetrievalConfig::default(), Arc::new(HashEmbedder::new(64)));
    let retriever = p.build(&source).unwrap();

    assert_eq!(retriever.stats().documents, 2);
    let hits = retriever.query("sourdough bread needs a starter", 1).unwrap();
    assert_eq!(hits[0].source, "sub/recipes.txt");
}
