//! In-memory checkpointer (MemorySaver). Not persistent; for dev and tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::memory::checkpoint::Checkpoint;
use crate::memory::checkpointer::{thread_id_required, CheckpointError, Checkpointer};
use crate::memory::config::RunnableConfig;

/// In-memory checkpointer. Key: thread_id; value: the thread's latest checkpoint.
///
/// Cloning shares the same storage, so a clone handed to a graph and one kept by
/// the caller see the same threads.
///
/// **Interaction**: Used as `Arc<dyn Checkpointer>` in `StateGraph::compile_with_checkpointer`.
#[derive(Clone, Default)]
pub struct MemorySaver {
    inner: Arc<RwLock<HashMap<String, Checkpoint>>>,
}

impl MemorySaver {
    /// Creates an empty in-memory checkpointer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of threads with a stored checkpoint.
    pub async fn thread_count(&self) -> usize {
        self.inner.read().await.len()
    }
}

#[async_trait]
impl Checkpointer for MemorySaver {
    async fn put(
        &self,
        config: &RunnableConfig,
        checkpoint: &Checkpoint,
    ) -> Result<String, CheckpointError> {
        let thread_id = thread_id_required(config)?.to_string();
        let id = checkpoint.id.clone();
        self.inner.write().await.insert(thread_id, checkpoint.clone());
        Ok(id)
    }

    async fn get_tuple(
        &self,
        config: &RunnableConfig,
    ) -> Result<Option<Checkpoint>, CheckpointError> {
        let thread_id = thread_id_required(config)?;
        Ok(self.inner.read().await.get(thread_id).cloned())
    }

    async fn delete_thread(&self, config: &RunnableConfig) -> Result<(), CheckpointError> {
        let thread_id = thread_id_required(config)?;
        self.inner.write().await.remove(thread_id);
        Ok(())
    }
}
