//! Exact in-memory cosine index. The default dense backend.
use async_trait::async_trait;
use std::sync::Arc;

use lorekeep_core::embedding::embed_query;
use lorekeep_core::error::{Error, Result};
use lorekeep_core::math::cosine_similarity;
use lorekeep_core::traits::{DenseIndex, Embedder};
use lorekeep_core::types::{Chunk, RankedList};

use crate::check_vectors;

pub struct FlatIndex {
	embedder: Arc<dyn Embedder>,
	chunks: Vec<Arc<Chunk>>,
	vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
	/// `vectors[i]` embeds `chunks[i]`; all must have the embedder's dimension.
	pub fn new(embedder: Arc<dyn Embedder>, chunks: Vec<Arc<Chunk>>, vectors: Vec<Vec<f32>>) -> Result<Self> {
		check_vectors(embedder.as_ref(), &chunks, &vectors)?;
		Ok(Self { embedder, chunks, vectors })
	}

	/// Up to `k` chunks by descending cosine similarity; ties keep insertion order.
	/// A NaN similarity ranks below every real one.
	pub fn nearest_to_vector(&self, query: &[f32], k: usize) -> Vec<(Arc<Chunk>, f32)> {
		let scores: Vec<f32> = self
			.vectors
			.iter()
			.map(|v| cosine_similarity(query, v))
			.map(|s| if s.is_nan() { f32::NEG_INFINITY } else { s })
			.collect();
		let mut order: Vec<usize> = (0..scores.len()).collect();
		order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
		order.into_iter().take(k).map(|i| (self.chunks[i].clone(), scores[i])).collect()
	}
}

#[async_trait]
impl DenseIndex for FlatIndex {
	fn len(&self) -> usize { self.chunks.len() }

	fn dim(&self) -> usize { self.embedder.dim() }

	async fn nearest(&self, query: &str, k: usize) -> Result<RankedList> {
		if self.chunks.is_empty() || k == 0 { return Ok(vec![]); }
		let embedder = self.embedder.clone();
		let query = query.to_string();
		let vector = tokio::task::spawn_blocking(move || embed_query(embedder.as_ref(), &query))
			.await
			.map_err(|e| Error::Task(format!("query embedding: {e}")))??;
		Ok(self.nearest_to_vector(&vector, k).into_iter().map(|(chunk, _)| chunk).collect())
	}
}
