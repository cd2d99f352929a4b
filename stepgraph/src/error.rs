//! Graph execution error types.
//!
//! Used by `Node::run`, `CompiledStateGraph::invoke` / `stream` / `get_state`.
//! Compile-time problems are reported separately by `GraphConfigError`.

use serde_json::Value;
use thiserror::Error;

use crate::graph::GraphInterrupt;
use crate::memory::CheckpointError;
use crate::state::SchemaViolation;

/// Graph execution error.
///
/// Every failure surfaces to the invoker; the executor never swallows one. Node
/// errors (including failed text-generation calls) are returned unchanged.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Execution failed with a message (e.g. text-generation call failed).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// A node asked for external input via `RunContext::interrupt`.
    ///
    /// This is the suspension signal: nodes propagate it with `?` and the executor
    /// turns it into a checkpointed suspension (`InvokeOutcome::Interrupted`), or
    /// into `InterruptWithoutCheckpointer` when the graph has no checkpointer. It is
    /// never returned from `invoke` or `stream`.
    #[error("graph interrupted: {0}")]
    Interrupted(GraphInterrupt),

    /// A node update or the run input did not match the declared state schema.
    #[error("schema violation in {node}: {source}")]
    SchemaViolation {
        node: String,
        #[source]
        source: SchemaViolation,
    },

    /// A router returned a key missing from its declared target mapping.
    #[error("unknown route {route:?} from node {node}")]
    UnknownRoute { node: String, route: String },

    /// No checkpoint exists for the thread.
    #[error("no checkpoint for thread {0}")]
    NotFound(String),

    /// Resume/retry requested but the thread has nothing to continue.
    #[error("no pending work for thread {0}")]
    NoPendingWork(String),

    /// Fresh input given to a thread that is suspended or stalled mid-run.
    #[error("thread {0} is still in progress; resume or retry it, or clear it first")]
    ThreadInProgress(String),

    /// Resume/retry/get_state on a graph compiled without a checkpointer.
    #[error("graph has no checkpointer")]
    CheckpointerRequired,

    /// A node interrupted during a run that cannot be persisted.
    #[error("interrupt raised without a checkpointer: {0}")]
    InterruptWithoutCheckpointer(Value),

    /// Checkpoint store failure.
    #[error("checkpoint: {0}")]
    Checkpoint(#[from] CheckpointError),
}

impl From<GraphInterrupt> for AgentError {
    fn from(interrupt: GraphInterrupt) -> Self {
        AgentError::Interrupted(interrupt)
    }
}
