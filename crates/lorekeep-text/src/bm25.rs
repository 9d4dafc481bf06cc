//! In-memory BM25 (Okapi) over the chunk corpus.
//!
//! idf(t) = ln(N - n_t + 0.5) - ln(n_t + 0.5); terms whose idf comes out
//! negative get `epsilon * mean_idf` instead.
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use lorekeep_core::settings::Bm25Settings;
use lorekeep_core::types::{Chunk, RankedList};

use crate::tokenizer::Tokenizer;

pub struct LexicalIndex {
	chunks: Vec<Arc<Chunk>>,
	term_freqs: Vec<HashMap<String, u32>>,
	doc_lens: Vec<usize>,
	avgdl: f64,
	idf: HashMap<String, f64>,
	tokenizer: Tokenizer,
	k1: f64,
	b: f64,
}

impl LexicalIndex {
	/// Tokenize every chunk and precompute term statistics. Chunk order is kept.
	pub fn build(chunks: Vec<Arc<Chunk>>, settings: &Bm25Settings) -> Self {
		let tokenizer = Tokenizer::new();
		let mut term_freqs = Vec::with_capacity(chunks.len());
		let mut doc_lens = Vec::with_capacity(chunks.len());
		let mut doc_counts: HashMap<String, u32> = HashMap::new();
		for chunk in &chunks {
			let tokens = tokenizer.tokenize(&chunk.text);
			doc_lens.push(tokens.len());
			let mut freqs: HashMap<String, u32> = HashMap::new();
			for token in tokens { *freqs.entry(token).or_insert(0) += 1; }
			for term in freqs.keys() { *doc_counts.entry(term.clone()).or_insert(0) += 1; }
			term_freqs.push(freqs);
		}

		let n = chunks.len() as f64;
		let total: usize = doc_lens.iter().sum();
		let avgdl = if chunks.is_empty() { 0.0 } else { total as f64 / n };

		let mut idf: HashMap<String, f64> = doc_counts
			.into_iter()
			.map(|(term, df)| { let df = df as f64; (term, (n - df + 0.5).ln() - (df + 0.5).ln()) })
			.collect();
		if !idf.is_empty() {
			let mean = idf.values().sum::<f64>() / idf.len() as f64;
			let floor = settings.epsilon * mean;
			for value in idf.values_mut() { if *value < 0.0 { *value = floor; } }
		}

		info!("BM25 index built: {} chunks, {} terms, avgdl {:.1}", chunks.len(), idf.len(), avgdl);
		Self { chunks, term_freqs, doc_lens, avgdl, idf, tokenizer, k1: settings.k1, b: settings.b }
	}

	pub fn len(&self) -> usize { self.chunks.len() }

	pub fn is_empty(&self) -> bool { self.chunks.is_empty() }

	pub fn chunks(&self) -> &[Arc<Chunk>] { &self.chunks }

	pub fn tokenizer(&self) -> &Tokenizer { &self.tokenizer }

	/// Smoothed idf of a term; 0 for terms absent from the corpus.
	pub fn idf(&self, term: &str) -> f64 { self.idf.get(term).copied().unwrap_or(0.0) }

	/// One BM25 score per chunk, in corpus order. Repeated query tokens count once per repeat.
	pub fn score(&self, query_tokens: &[String]) -> Vec<f64> {
		let mut scores = vec![0.0; self.chunks.len()];
		for token in query_tokens {
			let Some(&idf) = self.idf.get(token) else { continue };
			for (i, freqs) in self.term_freqs.iter().enumerate() {
				let Some(&tf) = freqs.get(token) else { continue };
				let tf = tf as f64;
				let len_ratio = if self.avgdl > 0.0 { self.doc_lens[i] as f64 / self.avgdl } else { 0.0 };
				scores[i] += idf * tf * (self.k1 + 1.0) / (tf + self.k1 * (1.0 - self.b + self.b * len_ratio));
			}
		}
		scores
	}

	/// Up to `k` chunks, best-first. Equal scores keep corpus order, so an
	/// empty query yields the first `k` chunks.
	pub fn top_k(&self, query_tokens: &[String], k: usize) -> RankedList {
		self.top_k_scored(query_tokens, k).into_iter().map(|(chunk, _)| chunk).collect()
	}

	pub fn top_k_scored(&self, query_tokens: &[String], k: usize) -> Vec<(Arc<Chunk>, f64)> {
		let scores = self.score(query_tokens);
		let mut order: Vec<usize> = (0..scores.len()).collect();
		order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
		order.into_iter().take(k).map(|i| (self.chunks[i].clone(), scores[i])).collect()
	}

	/// Tokenize `query` and return the top `k` chunks.
	pub fn search(&self, query: &str, k: usize) -> RankedList {
		let tokens = self.tokenizer.tokenize(query);
		self.top_k(&tokens, k)
	}
}
