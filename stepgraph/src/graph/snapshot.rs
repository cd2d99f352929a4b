//! Run inputs, run outcomes and thread snapshots.

use serde_json::Value;

use crate::memory::{Checkpoint, CheckpointMetadata};
use crate::state::StateRecord;

use super::interrupt::Interrupt;

/// What `invoke` / `stream` is asked to do on a thread.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// Start a run from this state (unknown thread, or no checkpointer).
    State(StateRecord),
    /// Answer the thread's single outstanding interrupt.
    Resume(Value),
    /// Continue a thread whose last run failed, from the node that failed.
    Retry,
}

impl Input {
    pub fn resume(value: impl Into<Value>) -> Self {
        Input::Resume(value.into())
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Input::State(_) => "state",
            Input::Resume(_) => "resume",
            Input::Retry => "retry",
        }
    }
}

impl From<StateRecord> for Input {
    fn from(state: StateRecord) -> Self {
        Input::State(state)
    }
}

/// Result of `invoke`.
#[derive(Debug, Clone, PartialEq)]
pub enum InvokeOutcome {
    /// The run reached END.
    Complete(StateRecord),
    /// A node is suspended; `state` is the top-level state at suspension.
    Interrupted {
        state: StateRecord,
        interrupt: Interrupt,
    },
}

impl InvokeOutcome {
    pub fn state(&self) -> &StateRecord {
        match self {
            InvokeOutcome::Complete(state) | InvokeOutcome::Interrupted { state, .. } => state,
        }
    }

    pub fn into_state(self) -> StateRecord {
        match self {
            InvokeOutcome::Complete(state) | InvokeOutcome::Interrupted { state, .. } => state,
        }
    }

    pub fn interrupt(&self) -> Option<&Interrupt> {
        match self {
            InvokeOutcome::Complete(_) => None,
            InvokeOutcome::Interrupted { interrupt, .. } => Some(interrupt),
        }
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, InvokeOutcome::Interrupted { .. })
    }
}

/// Live state of one suspended sub-graph.
#[derive(Debug, Clone, PartialEq)]
pub struct SubgraphState {
    /// Node path from the top-level graph to the sub-graph node.
    pub namespace: Vec<String>,
    pub values: StateRecord,
    /// Node inside this sub-graph that runs next (or is suspended).
    pub next: String,
}

/// Thread snapshot returned by `get_state`.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSnapshot {
    /// Last persisted top-level state.
    pub values: StateRecord,
    /// Top-level node that runs next; empty once the thread completed.
    pub next: Vec<String>,
    /// Full node path down to the suspended (or next) node.
    pub position: Vec<String>,
    pub interrupts: Vec<Interrupt>,
    /// Suspended sub-graph states, outermost first. Only present while a node
    /// inside them is suspended and only when requested.
    pub subgraphs: Vec<SubgraphState>,
    pub metadata: CheckpointMetadata,
}

impl StateSnapshot {
    pub(crate) fn from_checkpoint(checkpoint: Checkpoint, subgraphs: bool) -> Self {
        let next = checkpoint.position.first().cloned().into_iter().collect();
        let (interrupts, subgraph_states) = match checkpoint.pending_interrupt {
            Some(p) => (vec![p.interrupt], checkpoint.subgraph_states),
            None => (vec![], vec![]),
        };
        let subgraphs = if subgraphs {
            subgraph_states
                .into_iter()
                .enumerate()
                .filter_map(|(i, values)| {
                    let next = checkpoint.position.get(i + 1)?.clone();
                    Some(SubgraphState {
                        namespace: checkpoint.position[..=i].to_vec(),
                        values,
                        next,
                    })
                })
                .collect()
        } else {
            vec![]
        };
        Self {
            values: checkpoint.state,
            next,
            position: checkpoint.position,
            interrupts,
            subgraphs,
            metadata: checkpoint.metadata,
        }
    }

    /// The innermost suspended sub-graph, if any.
    pub fn innermost_subgraph(&self) -> Option<&SubgraphState> {
        self.subgraphs.last()
    }

    pub fn is_complete(&self) -> bool {
        self.position.is_empty()
    }
}
