//! Invoke config: selects the thread (and so the checkpoint) of a run.

/// Config for a single invoke/stream/get_state call.
///
/// When the graph has a checkpointer, `thread_id` is required and binds the call to
/// that thread's checkpoint.
///
/// **Interaction**: Passed to `CompiledStateGraph::invoke(input, config)` and
/// `Checkpointer::put` / `get_tuple` / `delete_thread`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunnableConfig {
    /// Unique id for this thread. Required when using a checkpointer.
    pub thread_id: Option<String>,
}

impl RunnableConfig {
    /// Config bound to `thread_id`.
    pub fn for_thread(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: Some(thread_id.into()),
        }
    }
}
