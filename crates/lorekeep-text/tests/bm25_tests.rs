use std::sync::Arc;

use lorekeep_core::settings::Bm25Settings;
use lorekeep_core::types::{Chunk, Meta};
use lorekeep_text::{tokenize, LexicalIndex};

fn chunk(id: usize, text: &str) -> Arc<Chunk> {
	Arc::new(Chunk { id: format!("0:{id}"), text: text.to_string(), metadata: Meta::new() })
}

fn corpus() -> LexicalIndex {
	let chunks = vec![
		chunk(0, "The cat sat on the mat."),
		chunk(1, "The dog chased the cat!"),
		chunk(2, "A quiet library full of books."),
	];
	LexicalIndex::build(chunks, &Bm25Settings::default())
}

fn ids(list: &[Arc<Chunk>]) -> Vec<&str> { list.iter().map(|c| c.id.as_str()).collect() }

#[test]
fn rare_term_ranks_its_chunk_first() {
	let index = corpus();
	let hits = index.search("Who chased the dog?", 3);
	assert_eq!(ids(&hits)[0], "0:1");
}

#[test]
fn idf_follows_okapi_with_epsilon_floor() {
	let index = corpus();
	let rare = (2.5f64).ln() - (1.5f64).ln();
	assert!((index.idf("dog") - rare).abs() < 1e-12);
	// 11 terms appear in one chunk, 2 ("the", "cat") in two; the latter are negative and floored.
	let floor = 0.25 * (11.0 * rare - 2.0 * rare) / 13.0;
	assert!((index.idf("the") - floor).abs() < 1e-12);
	assert_eq!(index.idf("unicorn"), 0.0);
}

#[test]
fn score_matches_formula() {
	let index = corpus();
	let scores = index.score(&tokenize("dog"));
	// doc 1 has 5 tokens, avgdl = (6 + 5 + 6) / 3
	let avgdl = 17.0 / 3.0;
	let idf = (2.5f64).ln() - (1.5f64).ln();
	let expected = idf * 1.0 * 2.5 / (1.0 + 1.5 * (1.0 - 0.75 + 0.75 * 5.0 / avgdl));
	assert_eq!(scores.len(), 3);
	assert!((scores[1] - expected).abs() < 1e-12);
	assert_eq!(scores[0], 0.0);
	assert_eq!(scores[2], 0.0);
}

#[test]
fn ties_keep_corpus_order() {
	let index = corpus();
	assert_eq!(ids(&index.top_k(&tokenize("dog"), 3)), vec!["0:1", "0:0", "0:2"]);
}

#[test]
fn empty_query_returns_first_k() {
	let index = corpus();
	assert_eq!(ids(&index.top_k(&[], 2)), vec!["0:0", "0:1"]);
	assert_eq!(ids(&index.search("?!", 1)), vec!["0:0"]);
}

#[test]
fn k_beyond_corpus_returns_all_unpadded() {
	let index = corpus();
	assert_eq!(index.search("cat", 30).len(), 3);
	assert!(index.search("cat", 0).is_empty());
}

#[test]
fn repeated_query_tokens_accumulate() {
	let index = corpus();
	let once = index.score(&tokenize("dog"))[1];
	let twice = index.score(&tokenize("dog dog"))[1];
	assert!((twice - 2.0 * once).abs() < 1e-12);
}

#[test]
fn empty_corpus_scores_nothing() {
	let index = LexicalIndex::build(vec![], &Bm25Settings::default());
	assert!(index.is_empty());
	assert!(index.search("anything", 5).is_empty());
}
