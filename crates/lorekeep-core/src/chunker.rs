//! Embedding-driven sentence grouping.
//!
//! A chunk is a run of consecutive sentences whose embeddings stay close to
//! the running centroid of the chunk, capped at `max_chunk_chars` characters.
//! Sentences are never reordered, split or duplicated.

use std::sync::Arc;
use tracing::warn;

use crate::embedding::embed_texts;
use crate::error::Result;
use crate::math::{centroid, cosine_similarity};
use crate::sentence::split_sentences;
use crate::settings::ChunkingSettings;
use crate::traits::Embedder;
use crate::types::{Chunk, Document};

pub struct SemanticChunker {
    embedder: Arc<dyn Embedder>,
    settings: ChunkingSettings,
}

impl SemanticChunker {
    pub fn new(embedder: Arc<dyn Embedder>, settings: ChunkingSettings) -> Self {
        Self { embedder, settings }
    }

    /// Chunk texts for one document, in document order.
    pub fn chunk(&self, text: &str) -> Result<Vec<String>> {
        if text.trim().is_empty() {
            return Ok(vec![]);
        }
        let mut sentences = split_sentences(text);
        if sentences.is_empty() {
            return Ok(vec![text.trim().to_string()]);
        }
        let ceiling = self.settings.max_sentences;
        if sentences.len() > ceiling {
            warn!("Very long text: {} sentences, truncating to {}", sentences.len(), ceiling);
            sentences.truncate(ceiling);
        }

        let embeddings = embed_texts(self.embedder.as_ref(), &sentences, self.settings.batch_size)?;
        Ok(group_sentences(
            &sentences,
            &embeddings,
            self.settings.max_chunk_chars,
            self.settings.similarity_threshold,
        ))
    }

    /// Chunk a document; chunks inherit the document metadata verbatim.
    /// `doc_index` only feeds the chunk ids.
    pub fn chunk_document(&self, doc_index: usize, document: &Document) -> Result<Vec<Chunk>> {
        Ok(self
            .chunk(&document.text)?
            .into_iter()
            .enumerate()
            .map(|(i, text)| Chunk { id: format!("{doc_index}:{i}"), text, metadata: document.metadata.clone() })
            .collect())
    }
}

/// Greedy grouping over pre-computed sentence embeddings.
///
/// For each sentence after the first: close the current chunk when the cosine
/// similarity between its centroid and the sentence is below `threshold`, or
/// when appending would push the chunk past `max_chars`. Length counts each
/// sentence plus one separator, in chars.
pub fn group_sentences(sentences: &[String], embeddings: &[Vec<f32>], max_chars: usize, threshold: f32) -> Vec<String> {
    let mut chunks = Vec::new();
    let (Some(first), Some(first_embedding)) = (sentences.first(), embeddings.first()) else { return chunks };

    let mut current: Vec<&str> = vec![first.as_str()];
    let mut current_embeddings: Vec<&[f32]> = vec![first_embedding.as_slice()];

    for (sentence, embedding) in sentences.iter().zip(embeddings).skip(1) {
        let similarity = cosine_similarity(&centroid(&current_embeddings), embedding);
        let current_len: usize = current.iter().map(|s| s.chars().count() + 1).sum();

        if similarity < threshold || current_len + sentence.chars().count() > max_chars {
            chunks.push(current.join(" "));
            current = vec![sentence.as_str()];
            current_embeddings = vec![embedding.as_slice()];
        } else {
            current.push(sentence.as_str());
            current_embeddings.push(embedding.as_slice());
        }
    }
    chunks.push(current.join(" "));
    chunks
}
