//! Checkpointer trait and CheckpointError.
//!
//! Saves and loads the latest checkpoint of a thread. Only the newest snapshot is
//! kept: a `put` for the same thread overwrites the previous one.

use async_trait::async_trait;

use crate::memory::checkpoint::Checkpoint;
use crate::memory::config::RunnableConfig;

/// Error type for checkpoint operations.
///
/// Used by Checkpointer::put, get_tuple, delete_thread and by Serializer.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("thread_id required")]
    ThreadIdRequired,
    #[error("serialization: {0}")]
    Serialization(String),
    #[error("storage: {0}")]
    Storage(String),
    #[error("not found: {0}")]
    NotFound(String),
}

/// Saves and loads the latest checkpoint per thread.
///
/// Implementations: [`MemorySaver`](super::MemorySaver) (in-memory) and
/// `SqliteSaver` (feature `sqlite`).
///
/// **Interaction**: Injected at compile via `StateGraph::compile_with_checkpointer`;
/// `CompiledStateGraph` writes after every node transition, sub-graph nodes included.
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// Persist the checkpoint as the thread's latest. Returns the checkpoint id.
    async fn put(
        &self,
        config: &RunnableConfig,
        checkpoint: &Checkpoint,
    ) -> Result<String, CheckpointError>;

    /// Load the latest checkpoint for the thread, if any.
    async fn get_tuple(&self, config: &RunnableConfig)
        -> Result<Option<Checkpoint>, CheckpointError>;

    /// Remove the thread's checkpoint. Removing an unknown thread is not an error.
    async fn delete_thread(&self, config: &RunnableConfig) -> Result<(), CheckpointError>;

    /// Like [`get_tuple`](Self::get_tuple) but a missing thread is `NotFound`.
    async fn get(&self, config: &RunnableConfig) -> Result<Checkpoint, CheckpointError> {
        let thread_id = thread_id_required(config)?.to_string();
        self.get_tuple(config)
            .await?
            .ok_or(CheckpointError::NotFound(thread_id))
    }
}

/// Returns the config's thread id or `ThreadIdRequired`.
pub(crate) fn thread_id_required(config: &RunnableConfig) -> Result<&str, CheckpointError> {
    config
        .thread_id
        .as_deref()
        .ok_or(CheckpointError::ThreadIdRequired)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Display of each CheckpointError variant contains expected keywords.
    #[test]
    fn checkpoint_error_display_all_variants() {
        assert!(CheckpointError::ThreadIdRequired
            .to_string()
            .to_lowercase()
            .contains("thread"));
        assert!(CheckpointError::Serialization("err".into())
            .to_string()
            .to_lowercase()
            .contains("serialization"));
        assert!(CheckpointError::Storage("io".into())
            .to_string()
            .to_lowercase()
            .contains("storage"));
        assert!(CheckpointError::NotFound("id".into())
            .to_string()
            .to_lowercase()
            .contains("not found"));
    }

    /// **Scenario**: thread_id_required rejects configs without a thread.
    #[test]
    fn thread_id_required_errors_without_thread() {
        assert!(matches!(
            thread_id_required(&RunnableConfig::default()),
            Err(CheckpointError::ThreadIdRequired)
        ));
        assert_eq!(
            thread_id_required(&RunnableConfig::for_thread("t")).unwrap(),
            "t"
        );
    }
}
