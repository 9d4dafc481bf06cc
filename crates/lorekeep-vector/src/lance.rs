//! LanceDB-backed dense index.
//!
//! Vectors live in a Lance table under `lance_dir`, rebuilt from scratch on
//! every build. Search uses cosine distance; the `row` column maps hits back
//! to the shared chunk list.
use anyhow::{anyhow, Context};
use arrow_array::{FixedSizeListArray, Int32Array, RecordBatch, RecordBatchIterator, StringArray};
use arrow_schema::ArrowError;
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection, DistanceType};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use lorekeep_core::embedding::embed_query;
use lorekeep_core::error::{Error, Result};
use lorekeep_core::traits::{DenseIndex, Embedder};
use lorekeep_core::types::{Chunk, RankedList};

use crate::check_vectors;
use crate::schema::build_arrow_schema;

const INSERT_BATCH: usize = 1000;

pub struct LanceIndex {
	db: Connection,
	table_name: String,
	embedder: Arc<dyn Embedder>,
	chunks: Vec<Arc<Chunk>>,
}

impl LanceIndex {
	/// Recreate `table_name` under `db_path` and write one row per chunk.
	pub async fn create(db_path: &Path, table_name: &str, embedder: Arc<dyn Embedder>, chunks: Vec<Arc<Chunk>>, vectors: Vec<Vec<f32>>) -> Result<Self> {
		check_vectors(embedder.as_ref(), &chunks, &vectors)?;
		let db = open_fresh(db_path).await.map_err(|e| Error::Storage(format!("{e:#}")))?;
		let index = Self { db, table_name: table_name.to_string(), embedder, chunks };
		index.write_rows(&vectors).await.map_err(|e| Error::Storage(format!("{e:#}")))?;
		info!("LanceDB table '{}' at {}: {} vectors", table_name, db_path.display(), index.chunks.len());
		Ok(index)
	}

	async fn write_rows(&self, vectors: &[Vec<f32>]) -> anyhow::Result<()> {
		let dim = i32::try_from(self.embedder.dim()).context("embedding dimension overflows i32")?;
		let schema = build_arrow_schema(dim);
		if vectors.is_empty() {
			let empty = RecordBatchIterator::new(Vec::<std::result::Result<RecordBatch, ArrowError>>::new(), schema.clone());
			self.db.create_table(&self.table_name, Box::new(empty)).execute().await?;
			return Ok(());
		}
		let mut created = false;
		for (batch_no, batch) in vectors.chunks(INSERT_BATCH).enumerate() {
			let offset = batch_no * INSERT_BATCH;
			let rows: Vec<i32> = (offset..offset + batch.len()).map(|i| i as i32).collect();
			let ids: Vec<String> = rows.iter().map(|&r| self.chunks[r as usize].id.clone()).collect();
			let values = batch.iter().map(|v| Some(v.iter().map(|&x| Some(x)).collect::<Vec<_>>()));
			let record_batch = RecordBatch::try_new(schema.clone(), vec![
				Arc::new(Int32Array::from(rows)),
				Arc::new(StringArray::from(ids)),
				Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(values, dim)),
			])?;
			let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema.clone()));
			if created {
				self.db.open_table(&self.table_name).execute().await?.add(reader).execute().await?;
			} else {
				self.db.create_table(&self.table_name, reader).execute().await?;
				created = true;
			}
			debug!("LanceDB: wrote rows {}..{}", offset, offset + batch.len());
		}
		Ok(())
	}

	async fn search_rows(&self, query: Vec<f32>, k: usize) -> anyhow::Result<Vec<usize>> {
		let table = self.db.open_table(&self.table_name).execute().await?;
		let mut stream = table.vector_search(query)?.distance_type(DistanceType::Cosine).limit(k).execute().await?;
		let mut rows = Vec::new();
		while let Some(batch) = stream.try_next().await? {
			let col = batch
				.column_by_name("row")
				.and_then(|c| c.as_any().downcast_ref::<Int32Array>())
				.ok_or_else(|| anyhow!("row column missing from search results"))?;
			for i in 0..batch.num_rows() {
				rows.push(col.value(i) as usize);
			}
		}
		Ok(rows)
	}
}

#[async_trait]
impl DenseIndex for LanceIndex {
	fn len(&self) -> usize { self.chunks.len() }

	fn dim(&self) -> usize { self.embedder.dim() }

	async fn nearest(&self, query: &str, k: usize) -> Result<RankedList> {
		if self.chunks.is_empty() || k == 0 { return Ok(vec![]); }
		let embedder = self.embedder.clone();
		let query = query.to_string();
		let vector = tokio::task::spawn_blocking(move || embed_query(embedder.as_ref(), &query))
			.await
			.map_err(|e| Error::Task(format!("query embedding: {e}")))??;
		let rows = self.search_rows(vector, k).await.map_err(|e| Error::Storage(format!("{e:#}")))?;
		rows.into_iter()
			.take(k)
			.map(|r| self.chunks.get(r).cloned().ok_or_else(|| Error::Storage(format!("search returned unknown row {r}"))))
			.collect()
	}
}

async fn open_fresh(db_path: &Path) -> anyhow::Result<Connection> {
	if db_path.exists() {
		std::fs::remove_dir_all(db_path).with_context(|| format!("Failed to clear {}", db_path.display()))?;
	}
	std::fs::create_dir_all(db_path)?;
	Ok(connect(db_path.to_string_lossy().as_ref()).execute().await?)
}
