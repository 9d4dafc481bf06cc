use std::sync::Arc;
use std::time::Duration;

use lorekeep_core::error::{Error, Result};
use lorekeep_core::settings::Settings;
use lorekeep_core::traits::Embedder;
use lorekeep_core::types::{Document, Meta};
use lorekeep_embed::FakeEmbedder;
use lorekeep_hybrid::{EngineStatus, IndexBuilder, RetrievalEngine};

fn builder() -> IndexBuilder {
    IndexBuilder::new(Settings::default(), Arc::new(FakeEmbedder::new(128)))
}

fn chapter(text: &str, chapter: &str) -> Document {
    let mut meta = Meta::new();
    meta.insert("book".into(), "Book Three".into());
    meta.insert("chapter".into(), chapter.into());
    Document::new(text, meta)
}

#[tokio::test]
async fn queries_before_initialization_are_not_ready() {
    let engine = RetrievalEngine::new();
    assert_eq!(engine.status(), EngineStatus::Pending);
    assert!(matches!(engine.retrieve("anything").await, Err(Error::IndexNotReady(_))));
}

#[tokio::test]
async fn initialize_once_then_serve() {
    let engine = RetrievalEngine::new();
    let docs = vec![
        chapter("Buckbeak is a hippogriff. He bows to Harry.", "6"),
        chapter("Sirius Black escaped from Azkaban.", "1"),
    ];
    engine.initialize(&builder(), docs.clone()).await.unwrap();
    assert!(engine.is_ready());

    let out = engine.retrieve("Who escaped from Azkaban?").await.unwrap();
    assert_eq!(out.passages[0].chapter, "1");

    assert!(matches!(engine.initialize(&builder(), docs).await, Err(Error::AlreadyInitialized)));
    assert!(engine.is_ready(), "a rejected second call leaves the engine serving");
}

#[tokio::test]
async fn failed_build_is_reported_to_queries() {
    let engine = RetrievalEngine::new();
    let err = engine.initialize(&builder(), vec![]).await.unwrap_err();
    assert!(matches!(err, Error::EmptyCorpus(_)));
    assert_eq!(engine.status(), EngineStatus::Failed);

    match engine.retrieve("anything").await {
        Err(Error::IndexNotReady(reason)) => assert!(reason.contains("Corpus is empty")),
        other => panic!("expected IndexNotReady, got {:?}", other.map(|r| r.passages)),
    }
    assert!(matches!(engine.initialize(&builder(), vec![]).await, Err(Error::AlreadyInitialized)));
}

#[tokio::test]
async fn shared_engine_serves_concurrent_queries() {
    let engine = Arc::new(RetrievalEngine::new());
    engine.initialize(&builder(), vec![chapter("The Knight Bus rescues Harry at night.", "3")]).await.unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.retrieve("Knight Bus").await })
        })
        .collect();
    for handle in handles {
        let out = handle.await.unwrap().unwrap();
        assert_eq!(out.passages.len(), 1);
    }
}

/// Takes a while per batch, long enough to abandon a build midway.
struct Slow(FakeEmbedder);

impl Embedder for Slow {
    fn id(&self) -> &str { self.0.id() }
    fn dim(&self) -> usize { self.0.dim() }
    fn max_len(&self) -> usize { self.0.max_len() }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        std::thread::sleep(Duration::from_millis(300));
        self.0.embed_batch(texts)
    }
}

#[tokio::test]
async fn abandoned_build_is_reported_as_failed() {
    let engine = RetrievalEngine::new();
    let slow = IndexBuilder::new(Settings::default(), Arc::new(Slow(FakeEmbedder::new(32))));
    let docs = vec![chapter("The Marauder's Map shows everyone.", "10")];

    let attempt = tokio::time::timeout(Duration::from_millis(20), engine.initialize(&slow, docs)).await;
    assert!(attempt.is_err());
    assert_eq!(engine.status(), EngineStatus::Failed);
    match engine.retrieve("map").await {
        Err(Error::IndexNotReady(reason)) => assert!(reason.contains("cancelled")),
        other => panic!("expected IndexNotReady, got {:?}", other.map(|r| r.passages)),
    }
}
