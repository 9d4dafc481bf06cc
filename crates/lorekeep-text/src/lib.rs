pub mod bm25;
pub mod tokenizer;

pub use bm25::LexicalIndex;
pub use tokenizer::{tokenize, Tokenizer, WordTokenizer};
