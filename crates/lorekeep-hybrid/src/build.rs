//! One-shot index construction: chunk, BM25, embed, dense backend.

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use lorekeep_core::chunker::SemanticChunker;
use lorekeep_core::embedding::embed_texts;
use lorekeep_core::error::{Error, Result};
use lorekeep_core::settings::Settings;
use lorekeep_core::traits::{Embedder, TextGenerator};
use lorekeep_core::types::{Chunk, Document};
use lorekeep_text::LexicalIndex;
use lorekeep_vector::build_dense_index;

use crate::expansion::QueryExpander;
use crate::format::ContextFormatter;
use crate::retriever::HybridRetriever;

pub struct IndexBuilder {
    settings: Settings,
    embedder: Arc<dyn Embedder>,
    generator: Option<Arc<dyn TextGenerator>>,
    show_progress: bool,
}

impl IndexBuilder {
    pub fn new(settings: Settings, embedder: Arc<dyn Embedder>) -> Self {
        Self { settings, embedder, generator: None, show_progress: false }
    }

    /// Generator used for query expansion; without one expansion is disabled.
    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Chunk every document in order; chunk ids are `"<doc>:<chunk>"`.
    pub fn chunk_documents(&self, documents: &[Document]) -> Result<Vec<Arc<Chunk>>> {
        let chunker = SemanticChunker::new(self.embedder.clone(), self.settings.chunking.clone());
        chunk_all(&chunker, documents, self.show_progress)
    }

    pub async fn build(&self, documents: Vec<Document>) -> Result<HybridRetriever> {
        let start = Instant::now();
        info!("Building indexes from {} documents", documents.len());

        let chunker = SemanticChunker::new(self.embedder.clone(), self.settings.chunking.clone());
        let embedder = self.embedder.clone();
        let bm25 = self.settings.bm25.clone();
        let batch_size = self.settings.embedding.batch_size;
        let show_progress = self.show_progress;
        let (chunks, lexical, vectors) = tokio::task::spawn_blocking(move || -> Result<_> {
            let chunks = chunk_all(&chunker, &documents, show_progress)?;
            if chunks.is_empty() {
                return Err(Error::EmptyCorpus(format!("{} documents produced no chunks", documents.len())));
            }
            let lexical = LexicalIndex::build(chunks.clone(), &bm25);
            let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
            let vectors = embed_texts(embedder.as_ref(), &texts, batch_size)?;
            Ok((chunks, lexical, vectors))
        })
        .await
        .map_err(|e| Error::Task(format!("index build: {e}")))??;

        let chunk_count = chunks.len();
        let dense = build_dense_index(&self.settings.dense, self.embedder.clone(), chunks, vectors).await?;

        let expander = match &self.generator {
            Some(g) => QueryExpander::new(Some(g.clone()), self.settings.expansion.clone()),
            None => QueryExpander::disabled(),
        };
        let retriever = HybridRetriever::new(
            Arc::new(lexical),
            dense,
            expander,
            ContextFormatter::new(self.settings.format.clone()),
            self.settings.retrieval.clone(),
        );
        info!(
            "✅ Indexes ready: {} chunks, dense backend {:?}, embedder {} ({:.1}s)",
            chunk_count,
            self.settings.dense.backend,
            self.embedder.id(),
            start.elapsed().as_secs_f32()
        );
        Ok(retriever)
    }
}

fn chunk_all(chunker: &SemanticChunker, documents: &[Document], show_progress: bool) -> Result<Vec<Arc<Chunk>>> {
    let pb = if show_progress { ProgressBar::new(documents.len() as u64) } else { ProgressBar::hidden() };
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chapters ({percent}%) {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    let mut chunks = Vec::new();
    for (i, document) in documents.iter().enumerate() {
        chunks.extend(chunker.chunk_document(i, document)?.into_iter().map(Arc::new));
        pb.inc(1);
        pb.set_message(format!("{} chunks", chunks.len()));
    }
    pb.finish_with_message(format!("{} chunks", chunks.len()));
    info!("Chunked {} documents into {} chunks", documents.len(), chunks.len());
    Ok(chunks)
}
