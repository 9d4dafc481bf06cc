//! Domain types shared by the chunker, both indexes and the retriever.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

pub type ChunkId = String;
pub type Meta = BTreeMap<String, String>;

/// Metadata key holding the collection (book) title.
pub const BOOK_KEY: &str = "book";
/// Metadata key holding the sub-unit (chapter) identifier.
pub const CHAPTER_KEY: &str = "chapter";

/// A unit of source text with provenance labels, e.g. one chapter of a book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    pub metadata: Meta,
}

impl Document {
    pub fn new(text: impl Into<String>, metadata: Meta) -> Self {
        Self { text: text.into(), metadata }
    }

    pub fn book(&self) -> Option<&str> {
        self.metadata.get(BOOK_KEY).map(String::as_str)
    }

    pub fn chapter(&self) -> Option<&str> {
        self.metadata.get(CHAPTER_KEY).map(String::as_str)
    }
}

/// A bounded, semantically coherent span of one document.
///
/// - `id`: `"<document index>:<chunk index>"`, unique within one build
/// - `text`: never empty
/// - `metadata`: copied verbatim from the parent document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
    pub metadata: Meta,
}

impl Chunk {
    pub fn book(&self) -> Option<&str> {
        self.metadata.get(BOOK_KEY).map(String::as_str)
    }

    pub fn chapter(&self) -> Option<&str> {
        self.metadata.get(CHAPTER_KEY).map(String::as_str)
    }
}

/// Best-first chunks from one retrieval strategy. Only the order is meaningful.
pub type RankedList = Vec<Arc<Chunk>>;

/// A retrieved passage as handed to the answer-generation collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub text: String,
    pub book: String,
    pub chapter: String,
}
