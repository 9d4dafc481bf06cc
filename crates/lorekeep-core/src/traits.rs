use async_trait::async_trait;

use crate::error::Result;
use crate::types::RankedList;

/// Maps texts to fixed-dimension vectors. Used at build time and per query.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the model (e.g. `candle:bert:d312`).
    fn id(&self) -> &str;
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    /// One vector per input, same order. Inputs are never empty strings,
    /// see [`crate::embedding::embed_texts`].
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Free-form text generation, used for query expansion.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Nearest-neighbour lookup over chunk embeddings. The index embeds the
/// query itself, so callers pass raw text.
#[async_trait]
pub trait DenseIndex: Send + Sync {
    fn len(&self) -> usize;
    fn dim(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Up to `k` chunks, best-first. Fewer when the index holds fewer.
    async fn nearest(&self, query: &str, k: usize) -> Result<RankedList>;
}
