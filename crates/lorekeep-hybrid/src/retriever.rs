//! Expansion, parallel lexical + dense search, fusion and formatting for one query.

use std::sync::Arc;
use tracing::{debug, error};

use lorekeep_core::error::{Error, Result};
use lorekeep_core::settings::RetrievalSettings;
use lorekeep_core::traits::DenseIndex;
use lorekeep_core::types::{Passage, RankedList};
use lorekeep_text::LexicalIndex;

use crate::expansion::{Expansion, QueryExpander};
use crate::format::ContextFormatter;
use crate::fusion::{reciprocal_rank_fusion, FusedChunk};

/// Everything one question produced.
#[derive(Debug, Clone)]
pub struct Retrieval {
    pub passages: Vec<Passage>,
    /// `passages` rendered for the answer prompt.
    pub context: String,
    pub expansion: Expansion,
    /// Set when the hybrid search failed and `passages` is empty because of it.
    pub search_error: Option<String>,
}

impl Retrieval {
    /// The string actually searched with.
    pub fn effective_query(&self) -> &str {
        self.expansion.query()
    }
}

pub struct HybridRetriever {
    lexical: Arc<LexicalIndex>,
    dense: Arc<dyn DenseIndex>,
    expander: QueryExpander,
    formatter: ContextFormatter,
    settings: RetrievalSettings,
}

impl HybridRetriever {
    pub fn new(
        lexical: Arc<LexicalIndex>,
        dense: Arc<dyn DenseIndex>,
        expander: QueryExpander,
        formatter: ContextFormatter,
        settings: RetrievalSettings,
    ) -> Self {
        Self { lexical, dense, expander, formatter, settings }
    }

    pub fn lexical(&self) -> &LexicalIndex {
        &self.lexical
    }

    pub fn dense(&self) -> &dyn DenseIndex {
        self.dense.as_ref()
    }

    /// Never fails: expansion problems fall back to the question and search
    /// problems yield no passages, both recorded on the result.
    pub async fn retrieve(&self, question: &str) -> Retrieval {
        let expansion = self.expander.expand(question).await;
        let (fused, search_error) = match self.hybrid_search(expansion.query()).await {
            Ok(fused) => (fused, None),
            Err(e) => {
                error!("Hybrid search failed: {}", e);
                (Vec::new(), Some(e.to_string()))
            }
        };

        let passages: Vec<Passage> = fused
            .iter()
            .take(self.settings.top_n)
            .map(|f| self.formatter.passage(&f.chunk))
            .collect();
        for (i, p) in passages.iter().take(3).enumerate() {
            debug!("Source #{}: {}, chapter {}", i + 1, p.book, p.chapter);
        }
        let context = self.formatter.render(&passages);
        Retrieval { passages, context, expansion, search_error }
    }

    /// Both strategies with `candidate_width` candidates each, fused dense-first.
    /// The result is not truncated.
    pub async fn hybrid_search(&self, query: &str) -> Result<Vec<FusedChunk>> {
        let width = self.settings.candidate_width;
        let lexical = self.lexical.clone();
        let text = query.to_string();
        let lexical_task = tokio::task::spawn_blocking(move || lexical.search(&text, width));
        let (lexical_hits, dense_hits) = tokio::join!(lexical_task, self.dense.nearest(query, width));
        let lexical_hits: RankedList = lexical_hits.map_err(|e| Error::Task(format!("lexical search: {e}")))?;
        let dense_hits = dense_hits?;
        debug!("Candidates: {} dense, {} lexical", dense_hits.len(), lexical_hits.len());
        Ok(reciprocal_rank_fusion(&[dense_hits, lexical_hits], self.settings.rrf_k))
    }
}
