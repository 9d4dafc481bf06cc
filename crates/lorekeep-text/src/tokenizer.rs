//! Word tokenizer shared by index build and query time.
//!
//! [`WordTokenizer`] cuts text on Unicode (UAX #29) word boundaries, so
//! contractions like `don't` stay one unit; `LowerCaser` folds case, and any
//! unit with digits, apostrophes or other non-letters is then dropped.
use tantivy::tokenizer::{LowerCaser, TextAnalyzer, Token, TokenStream, Tokenizer as TantivyTokenizer};
use unicode_segmentation::{UnicodeSegmentation, UnicodeWordIndices};

/// Tantivy tokenizer emitting UAX #29 words.
#[derive(Clone, Default)]
pub struct WordTokenizer {
	token: Token,
}

pub struct WordTokenStream<'a> {
	words: UnicodeWordIndices<'a>,
	token: &'a mut Token,
}

impl TantivyTokenizer for WordTokenizer {
	type TokenStream<'a> = WordTokenStream<'a>;

	fn token_stream<'a>(&'a mut self, text: &'a str) -> WordTokenStream<'a> {
		self.token.reset();
		WordTokenStream { words: text.unicode_word_indices(), token: &mut self.token }
	}
}

impl TokenStream for WordTokenStream<'_> {
	fn advance(&mut self) -> bool {
		let Some((offset, word)) = self.words.next() else { return false };
		self.token.text.clear();
		self.token.text.push_str(word);
		self.token.offset_from = offset;
		self.token.offset_to = offset + word.len();
		self.token.position = self.token.position.wrapping_add(1);
		true
	}

	fn token(&self) -> &Token { self.token }

	fn token_mut(&mut self) -> &mut Token { self.token }
}

#[derive(Clone)]
pub struct Tokenizer {
	analyzer: TextAnalyzer,
}

impl Default for Tokenizer {
	fn default() -> Self { Self::new() }
}

impl Tokenizer {
	pub fn new() -> Self {
		let analyzer = TextAnalyzer::builder(WordTokenizer::default()).filter(LowerCaser).build();
		Self { analyzer }
	}

	/// Lowercase, purely alphabetic word tokens in text order.
	pub fn tokenize(&self, text: &str) -> Vec<String> {
		// token_stream needs &mut; the analyzer is cheap to clone
		let mut analyzer = self.analyzer.clone();
		let mut stream = analyzer.token_stream(text);
		let mut tokens = Vec::new();
		while stream.advance() {
			let token = &stream.token().text;
			if !token.is_empty() && token.chars().all(char::is_alphabetic) { tokens.push(token.clone()); }
		}
		tokens
	}
}

/// Convenience wrapper over a default [`Tokenizer`].
pub fn tokenize(text: &str) -> Vec<String> { Tokenizer::new().tokenize(text) }

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn lowercases_and_drops_punctuation() {
		assert_eq!(tokenize("Hello, World! It is 2024."), vec!["hello", "world", "it", "is"]);
	}

	#[test]
	fn contractions_are_dropped_whole() {
		assert_eq!(tokenize("Don't touch it's wand"), vec!["touch", "wand"]);
	}

	#[test]
	fn hyphenated_words_split_into_parts() {
		assert_eq!(tokenize("Принц-полукровка"), vec!["принц", "полукровка"]);
	}

	#[test]
	fn drops_tokens_with_digits() {
		assert_eq!(tokenize("room 101 and b2b deals"), vec!["room", "and", "deals"]);
	}

	#[test]
	fn handles_cyrillic() {
		assert_eq!(tokenize("Гарри Поттер, Глава 5"), vec!["гарри", "поттер", "глава"]);
	}

	#[test]
	fn empty_input_is_empty() {
		assert!(tokenize("").is_empty());
		assert!(tokenize("  ... ").is_empty());
	}

	#[test]
	fn offsets_point_into_the_source() {
		let mut tokenizer = WordTokenizer::default();
		let text = "Ёлка и сова";
		let mut stream = tantivy::tokenizer::Tokenizer::token_stream(&mut tokenizer, text);
		let mut seen = Vec::new();
		while stream.advance() {
			let t = stream.token();
			seen.push((t.position, text[t.offset_from..t.offset_to].to_string()));
		}
		assert_eq!(seen, vec![(0, "Ёлка".to_string()), (1, "и".to_string()), (2, "сова".to_string())]);
	}

	#[test]
	fn deterministic() {
		let t = Tokenizer::new();
		assert_eq!(t.tokenize("The wand chooses the wizard"), t.tokenize("The wand chooses the wizard"));
	}
}
