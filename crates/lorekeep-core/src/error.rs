use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Embedding or generation provider unreachable or returned something unusable.
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Index is not ready: {0}")]
    IndexNotReady(String),

    #[error("Corpus is empty: {0}")]
    EmptyCorpus(String),

    #[error("Retrieval engine already initialized")]
    AlreadyInitialized,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Background task failed: {0}")]
    Task(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn provider(e: impl std::fmt::Display) -> Self {
        Self::Provider(e.to_string())
    }

    pub fn storage(e: impl std::fmt::Display) -> Self {
        Self::Storage(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
