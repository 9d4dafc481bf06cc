//! Sentence embeddings with candle.
//!
//! [`EmbeddingModel`] runs a local BERT-family encoder (`bert` or `xlm-roberta`
//! per `config.json`) with masked mean pooling. [`FakeEmbedder`] is a hashing
//! stand-in for tests and offline development.

pub mod device;
pub mod pool;
pub mod tokenize;

use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use tokenizers::Tokenizer;

use lorekeep_core::config::expand_path;
use lorekeep_core::error::Error;
use lorekeep_core::settings::EmbeddingSettings;
use lorekeep_core::traits::Embedder;

pub use device::select_device;
pub use pool::masked_mean_l2;

enum Encoder {
    Bert(BertModel),
    XlmRoberta(XLMRobertaModel),
}

pub struct EmbeddingModel {
    encoder: Encoder,
    tokenizer: Tokenizer,
    device: Device,
    id: String,
    dim: usize,
    max_len: usize,
    pad_id: u32,
}

impl EmbeddingModel {
    /// Load `tokenizer.json`, `config.json` and weights from `model_dir`.
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = select_device();
        info!("🔄 Loading embedding model from {}", model_dir.display());

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let pad_id = tokenize::pad_token_id(&tokenizer);

        let config_path = model_dir.join("config.json");
        let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&config_path)?)
            .with_context(|| format!("Invalid {}", config_path.display()))?;
        let model_type = raw.get("model_type").and_then(|v| v.as_str()).unwrap_or("bert").to_string();
        let dim = raw
            .get("hidden_size")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| anyhow!("{} has no hidden_size", config_path.display()))? as usize;
        let max_positions = raw.get("max_position_embeddings").and_then(|v| v.as_u64()).map(|v| v as usize);
        let max_len = max_positions.map_or(max_len, |p| max_len.min(p));

        let vb = load_weights(model_dir, &device)?;
        let encoder = match model_type.as_str() {
            "bert" => Encoder::Bert(BertModel::load(vb, &serde_json::from_value::<BertConfig>(raw)?)?),
            "xlm-roberta" => Encoder::XlmRoberta(XLMRobertaModel::new(&serde_json::from_value::<XLMRobertaConfig>(raw)?, vb)?),
            other => return Err(anyhow!("Unsupported model_type '{}'", other)),
        };

        let id = format!("candle:{}:d{}", model_type, dim);
        info!("✅ Embedding model loaded: {} (max_len {})", id, max_len);
        Ok(Self { encoder, tokenizer, device, id, dim, max_len, pad_id })
    }

    fn embed_inner(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let start = Instant::now();
        let batch = tokenize::encode_batch(&self.tokenizer, texts, self.max_len, self.pad_id, &self.device)?;
        let hidden = match &self.encoder {
            Encoder::Bert(model) => model.forward(&batch.input_ids, &batch.token_type_ids, Some(&batch.attention_mask))?,
            Encoder::XlmRoberta(model) => {
                model.forward(&batch.input_ids, &batch.attention_mask, &batch.token_type_ids, None, None, None)?
            }
        };
        let pooled = masked_mean_l2(&hidden, &batch.attention_mask)?;
        let vectors: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_dtype(DType::F32)?.to_vec2()?;
        debug!("Embedded {} texts in {} ms", texts.len(), start.elapsed().as_millis());
        Ok(vectors)
    }
}

impl Embedder for EmbeddingModel {
    fn id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }
    fn embed_batch(&self, texts: &[String]) -> lorekeep_core::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        self.embed_inner(texts).map_err(|e| Error::Provider(format!("{e:#}")))
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        // SAFETY: the file is not modified while mapped
        return Ok(unsafe { VarBuilder::from_mmaped_safetensors(&[safetensors], DType::F32, device)? });
    }
    let pickle = model_dir.join("pytorch_model.bin");
    if pickle.exists() {
        let weights = candle_core::pickle::read_all(&pickle)?;
        let weights_map: HashMap<String, Tensor> = weights.into_iter().collect();
        return Ok(VarBuilder::from_tensors(weights_map, DType::F32, device));
    }
    Err(anyhow!("No model.safetensors or pytorch_model.bin in {}", model_dir.display()))
}

/// Deterministic hashing embedder: each whitespace token bumps one xxhash
/// bucket. Texts sharing words get similar vectors.
pub struct FakeEmbedder {
    dim: usize,
    id: String,
}

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self {
        let dim = dim.max(1);
        Self { dim, id: format!("fake:xxhash:d{dim}") }
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher};
        use twox_hash::XxHash64;
        let mut v = vec![0f32; self.dim];
        for token in text.split_whitespace() {
            let mut hasher = XxHash64::with_seed(0);
            token.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            v[idx] += 0.5 + (((h >> 32) as u32) as f32) / (u32::MAX as f32);
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v { *x /= norm; }
        v
    }
}

impl Embedder for FakeEmbedder {
    fn id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { usize::MAX }
    fn embed_batch(&self, texts: &[String]) -> lorekeep_core::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

/// `APP_USE_FAKE_EMBEDDINGS=1` or `embedding.fake` selects [`FakeEmbedder`];
/// otherwise the candle model is loaded from the resolved model directory.
pub fn get_default_embedder(settings: &EmbeddingSettings) -> lorekeep_core::Result<Arc<dyn Embedder>> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if use_fake || settings.fake {
        info!("🧪 Using FakeEmbedder (dim {})", settings.fake_dim);
        return Ok(Arc::new(FakeEmbedder::new(settings.fake_dim)));
    }
    let model_dir = resolve_model_dir(settings).map_err(|e| Error::Provider(format!("{e:#}")))?;
    let model = EmbeddingModel::load(&model_dir, settings.max_len).map_err(|e| Error::Provider(format!("{e:#}")))?;
    Ok(Arc::new(model))
}

fn resolve_model_dir(settings: &EmbeddingSettings) -> Result<PathBuf> {
    if let Some(dir) = &settings.model_dir {
        let p = expand_path(dir);
        if p.exists() { return Ok(p); }
        return Err(anyhow!("embedding.model_dir {} does not exist", p.display()));
    }
    for var in ["APP_MODEL_DIR", "MODEL_DIR"] {
        if let Ok(dir) = std::env::var(var) {
            let p = expand_path(&dir);
            if p.exists() { info!("📦 Using {}: {}", var, p.display()); return Ok(p); }
        }
    }
    for candidate in ["models/rubert-tiny2", "../models/rubert-tiny2"] {
        let p = Path::new(candidate);
        if p.exists() { info!("📦 Using model dir: {}", p.display()); return Ok(p.to_path_buf()); }
    }
    Err(anyhow!("Could not locate an embedding model directory; set embedding.model_dir or APP_MODEL_DIR"))
}
