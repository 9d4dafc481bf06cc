//! Dense indexes over chunk embeddings: [`FlatIndex`] (exact, in memory) and
//! [`LanceIndex`] (LanceDB table, cosine distance).
pub mod flat;
pub mod lance;
pub mod schema;

use std::sync::Arc;

use lorekeep_core::config::expand_path;
use lorekeep_core::error::{Error, Result};
use lorekeep_core::settings::{DenseBackend, DenseSettings};
use lorekeep_core::traits::{DenseIndex, Embedder};
use lorekeep_core::types::Chunk;

pub use flat::FlatIndex;
pub use lance::LanceIndex;

/// Build the configured backend from pre-computed chunk vectors.
pub async fn build_dense_index(settings: &DenseSettings, embedder: Arc<dyn Embedder>, chunks: Vec<Arc<Chunk>>, vectors: Vec<Vec<f32>>) -> Result<Arc<dyn DenseIndex>> {
	match settings.backend {
		DenseBackend::Memory => Ok(Arc::new(FlatIndex::new(embedder, chunks, vectors)?)),
		DenseBackend::Lance => {
			let dir = expand_path(&settings.lance_dir);
			Ok(Arc::new(LanceIndex::create(&dir, &settings.table, embedder, chunks, vectors).await?))
		}
	}
}

pub(crate) fn check_vectors(embedder: &dyn Embedder, chunks: &[Arc<Chunk>], vectors: &[Vec<f32>]) -> Result<()> {
	if chunks.len() != vectors.len() {
		return Err(Error::Provider(format!("{} vectors for {} chunks", vectors.len(), chunks.len())));
	}
	if let Some(bad) = vectors.iter().find(|v| v.len() != embedder.dim()) {
		return Err(Error::Provider(format!("vector of dim {} in a {}-dim index", bad.len(), embedder.dim())));
	}
	Ok(())
}
