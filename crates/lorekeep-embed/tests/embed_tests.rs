use lorekeep_core::embedding::embed_texts;
use lorekeep_core::math::cosine_similarity;
use lorekeep_core::settings::EmbeddingSettings;
use lorekeep_embed::{get_default_embedder, FakeEmbedder};

#[test]
fn fake_embedder_shapes_and_determinism() {
    let settings = EmbeddingSettings { fake: true, fake_dim: 64, ..EmbeddingSettings::default() };
    let embedder = get_default_embedder(&settings).expect("embedder");
    assert_eq!(embedder.dim(), 64);

    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];
    assert_eq!(v1.len(), 64);

    // Norm approximately 1.0
    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn shared_words_are_more_similar() {
    let e = FakeEmbedder::new(256);
    let a = e.embed_text("the boy who lived");
    let b = e.embed_text("the boy who lived under the stairs");
    let c = e.embed_text("quidditch broomstick snitch");
    assert!(cosine_similarity(&a, &b) > cosine_similarity(&a, &c));
}

#[test]
fn blank_text_goes_through_placeholder() {
    let e = FakeEmbedder::new(8);
    let out = embed_texts(&e, &["".to_string(), "word".to_string()], 32).expect("embed");
    assert_eq!(out.len(), 2);
    assert!(out[0].iter().all(|x| *x == 0.0));
}

#[test]
fn missing_model_dir_is_provider_error() {
    let settings = EmbeddingSettings { model_dir: Some("/definitely/not/here".into()), ..EmbeddingSettings::default() };
    if std::env::var("APP_USE_FAKE_EMBEDDINGS").is_ok() {
        return;
    }
    let err = get_default_embedder(&settings).err().expect("no model dir");
    assert!(matches!(err, lorekeep_core::Error::Provider(_)));
}
