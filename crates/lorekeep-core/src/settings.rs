//! Typed configuration sections. Every field has a default so an empty
//! `config.toml` is valid; see `config.toml` at the workspace root.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub corpus: CorpusSettings,
    pub chunking: ChunkingSettings,
    pub bm25: Bm25Settings,
    pub dense: DenseSettings,
    pub embedding: EmbeddingSettings,
    pub retrieval: RetrievalSettings,
    pub expansion: ExpansionSettings,
    pub generation: GenerationSettings,
    pub format: FormatSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let c = &self.chunking;
        if c.max_chunk_chars == 0 {
            return Err(Error::InvalidConfig("chunking.max_chunk_chars must be > 0".into()));
        }
        if !(-1.0..=1.0).contains(&c.similarity_threshold) {
            return Err(Error::InvalidConfig(format!(
                "chunking.similarity_threshold must be within [-1, 1], got {}",
                c.similarity_threshold
            )));
        }
        if c.max_sentences == 0 {
            return Err(Error::InvalidConfig("chunking.max_sentences must be > 0".into()));
        }
        let r = &self.retrieval;
        if r.candidate_width == 0 {
            return Err(Error::InvalidConfig("retrieval.candidate_width must be > 0".into()));
        }
        if r.rrf_k == 0 {
            return Err(Error::InvalidConfig("retrieval.rrf_k must be >= 1".into()));
        }
        if r.top_n == 0 {
            return Err(Error::InvalidConfig("retrieval.top_n must be > 0".into()));
        }
        if self.bm25.k1 < 0.0 || !(0.0..=1.0).contains(&self.bm25.b) {
            return Err(Error::InvalidConfig(format!(
                "bm25 parameters out of range: k1={} b={}",
                self.bm25.k1, self.bm25.b
            )));
        }
        if self.embedding.batch_size == 0 || c.batch_size == 0 {
            return Err(Error::InvalidConfig("embedding batch sizes must be > 0".into()));
        }
        if !self.expansion.prompt.contains("{question}") {
            return Err(Error::InvalidConfig("expansion.prompt must contain {question}".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusSettings {
    pub data_dir: String,
    /// Multi-line regex; capture group 1 is the chapter identifier.
    pub chapter_pattern: String,
    /// File name (e.g. `book_one.txt`) to display title.
    pub book_titles: BTreeMap<String, String>,
}

impl Default for CorpusSettings {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            chapter_pattern: r"(?m)^\s*(?:Глава|Chapter)\s+(\d+)".to_string(),
            book_titles: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    pub max_chunk_chars: usize,
    pub similarity_threshold: f32,
    /// Sentences past this ceiling are dropped with a warning.
    pub max_sentences: usize,
    pub batch_size: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self { max_chunk_chars: 600, similarity_threshold: 0.65, max_sentences: 2000, batch_size: 32 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Settings {
    pub k1: f64,
    pub b: f64,
    /// Floor for negative idf values, as a fraction of the mean idf.
    pub epsilon: f64,
}

impl Default for Bm25Settings {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75, epsilon: 0.25 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DenseBackend {
    #[default]
    Memory,
    Lance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DenseSettings {
    pub backend: DenseBackend,
    pub lance_dir: String,
    pub table: String,
}

impl Default for DenseSettings {
    fn default() -> Self {
        Self { backend: DenseBackend::Memory, lance_dir: "indexes/lancedb".to_string(), table: "chunks".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Directory holding `tokenizer.json`, `config.json` and the weights.
    pub model_dir: Option<String>,
    pub fake: bool,
    pub fake_dim: usize,
    pub max_len: usize,
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { model_dir: None, fake: false, fake_dim: 312, max_len: 256, batch_size: 32 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Candidates requested from each strategy.
    pub candidate_width: usize,
    pub rrf_k: usize,
    /// Fused candidates handed to the caller.
    pub top_n: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { candidate_width: 30, rrf_k: 60, top_n: 15 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionSettings {
    pub enabled: bool,
    pub timeout_secs: u64,
    pub prompt: String,
}

impl Default for ExpansionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: 20,
            prompt: "Which 3-5 keywords or phrases (including synonyms) best describe the essence of this question? \
                     Answer with a list, one per line.\n\n{question}"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the bearer key.
    pub api_key_env: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.mistral.ai/v1/chat/completions".to_string(),
            model: "mistral-small-latest".to_string(),
            api_key_env: "MISTRAL_API_KEY".to_string(),
            temperature: 0.0,
            timeout_secs: 30,
            max_retries: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatSettings {
    pub source_label: String,
    pub chapter_label: String,
    pub unknown_book: String,
    pub unknown_chapter: String,
    pub separator: String,
}

impl Default for FormatSettings {
    fn default() -> Self {
        Self {
            source_label: "SOURCE".to_string(),
            chapter_label: "chapter".to_string(),
            unknown_book: "Unknown book".to_string(),
            unknown_chapter: "?".to_string(),
            separator: "\n\n---\n\n".to_string(),
        }
    }
}
