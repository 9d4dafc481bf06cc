pub mod chunker;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod error;
pub mod math;
pub mod sentence;
pub mod settings;
pub mod traits;
pub mod types;

pub use chunker::SemanticChunker;
pub use error::{Error, Result};
pub use settings::Settings;
pub use types::{Chunk, Document, Passage, RankedList};
