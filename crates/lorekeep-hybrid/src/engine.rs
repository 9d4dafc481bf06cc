//! Process-wide retrieval context with an explicit readiness state.
//!
//! Construct one [`RetrievalEngine`] at startup, share it by `Arc`, run
//! [`RetrievalEngine::initialize`] once; until it completes every query
//! answers [`Error::IndexNotReady`].

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{error, info, warn};

use lorekeep_core::error::{Error, Result};
use lorekeep_core::types::Document;

use crate::build::IndexBuilder;
use crate::retriever::{HybridRetriever, Retrieval};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    Pending,
    Building,
    Ready,
    Failed,
}

enum EngineState {
    Pending,
    Building,
    Ready(Arc<HybridRetriever>),
    Failed(String),
}

pub struct RetrievalEngine {
    state: RwLock<EngineState>,
}

impl Default for RetrievalEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RetrievalEngine {
    pub fn new() -> Self {
        Self { state: RwLock::new(EngineState::Pending) }
    }

    /// An engine that is ready from the start.
    pub fn with_retriever(retriever: HybridRetriever) -> Self {
        Self { state: RwLock::new(EngineState::Ready(Arc::new(retriever))) }
    }

    // Writers only swap whole states, so a poisoned lock still holds a consistent one.
    fn read(&self) -> RwLockReadGuard<'_, EngineState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, EngineState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self) -> EngineStatus {
        match &*self.read() {
            EngineState::Pending => EngineStatus::Pending,
            EngineState::Building => EngineStatus::Building,
            EngineState::Ready(_) => EngineStatus::Ready,
            EngineState::Failed(_) => EngineStatus::Failed,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status() == EngineStatus::Ready
    }

    /// Build the indexes. Allowed once; later calls get [`Error::AlreadyInitialized`].
    /// On failure the engine stays `Failed` and reports the cause to queries;
    /// dropping the returned future mid-build counts as a failure too.
    pub async fn initialize(&self, builder: &IndexBuilder, documents: Vec<Document>) -> Result<()> {
        {
            let mut state = self.write();
            if !matches!(*state, EngineState::Pending) {
                return Err(Error::AlreadyInitialized);
            }
            *state = EngineState::Building;
        }
        let _cancelled = BuildGuard { engine: self };
        info!("Retrieval engine initializing");
        let outcome = builder.build(documents).await;
        match outcome {
            Ok(retriever) => {
                *self.write() = EngineState::Ready(Arc::new(retriever));
                info!("Retrieval engine ready");
                Ok(())
            }
            Err(e) => {
                error!("Retrieval engine failed to initialize: {}", e);
                *self.write() = EngineState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// The ready retriever, or [`Error::IndexNotReady`].
    pub fn retriever(&self) -> Result<Arc<HybridRetriever>> {
        match &*self.read() {
            EngineState::Ready(r) => Ok(r.clone()),
            EngineState::Pending => Err(Error::IndexNotReady("initialization has not started".into())),
            EngineState::Building => Err(Error::IndexNotReady("indexes are still being built".into())),
            EngineState::Failed(reason) => Err(Error::IndexNotReady(format!("initialization failed: {reason}"))),
        }
    }

    pub async fn retrieve(&self, question: &str) -> Result<Retrieval> {
        let retriever = self.retriever()?;
        Ok(retriever.retrieve(question).await)
    }
}

/// Marks the engine `Failed` if it is still `Building` when dropped, i.e. the
/// `initialize` future was dropped before the build finished.
struct BuildGuard<'a> {
    engine: &'a RetrievalEngine,
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.engine.write();
        if matches!(*state, EngineState::Building) {
            warn!("Retrieval engine initialization was cancelled");
            *state = EngineState::Failed("initialization was cancelled".into());
        }
    }
}
