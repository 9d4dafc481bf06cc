//! Hybrid retrieval: BM25 and dense candidates fused with Reciprocal Rank
//! Fusion, optional LLM query expansion and provenance-annotated context.

pub mod build;
pub mod chat;
pub mod engine;
pub mod expansion;
pub mod format;
pub mod fusion;
pub mod retriever;

pub use build::IndexBuilder;
pub use chat::ChatClient;
pub use engine::{EngineStatus, RetrievalEngine};
pub use expansion::{Expansion, QueryExpander};
pub use format::ContextFormatter;
pub use fusion::{reciprocal_rank_fusion, FusedChunk};
pub use retriever::{HybridRetriever, Retrieval};
