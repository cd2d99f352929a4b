//! Checkpoint and metadata types.
//!
//! One checkpoint per thread: the merged root state, the node path the run will
//! continue from, the live state of every sub-graph along that path, and the
//! pending interrupt if a node is suspended.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::graph::Interrupt;
use crate::state::StateRecord;

/// Metadata for a single checkpoint (source, step, created_at).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    pub source: CheckpointSource,
    /// Number of top-level node transitions completed on this thread.
    pub step: u64,
    pub created_at: Option<SystemTime>,
}

/// What produced the checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckpointSource {
    /// Written from the caller's input before the first node ran.
    Input,
    /// Written after a node completed, at any sub-graph depth.
    Loop,
    /// Written when a node suspended on an interrupt.
    Interrupt,
}

impl CheckpointSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckpointSource::Input => "input",
            CheckpointSource::Loop => "loop",
            CheckpointSource::Interrupt => "interrupt",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "input" => Some(CheckpointSource::Input),
            "loop" => Some(CheckpointSource::Loop),
            "interrupt" => Some(CheckpointSource::Interrupt),
            _ => None,
        }
    }
}

/// Suspension record of a node waiting on `interrupt(...)`.
///
/// `resume_values` holds the answers already given to earlier interrupt calls of
/// the same node body, replayed in call order when the node re-runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingInterrupt {
    pub interrupt: Interrupt,
    #[serde(default)]
    pub resume_values: Vec<Value>,
}

/// Latest snapshot of one thread.
///
/// `position` is the path of node names from the outermost graph to the node that
/// runs next (or is suspended); empty once the run reached END. When the path goes
/// through sub-graph nodes, `subgraph_states` holds the live state of each of those
/// sub-graphs, outermost first (one fewer than `position`). Inside a sub-graph whose
/// last node completed, the path ends in `__end__`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: String,
    pub ts: String,
    pub state: StateRecord,
    pub position: Vec<String>,
    #[serde(default)]
    pub subgraph_states: Vec<StateRecord>,
    pub pending_interrupt: Option<PendingInterrupt>,
    pub metadata: CheckpointMetadata,
}

impl Checkpoint {
    /// Creates a checkpoint stamped with the current time.
    pub fn new(
        state: StateRecord,
        position: Vec<String>,
        pending_interrupt: Option<PendingInterrupt>,
        source: CheckpointSource,
        step: u64,
    ) -> Self {
        let now = SystemTime::now();
        let ts = format!(
            "{}",
            now.duration_since(SystemTime::UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0)
        );
        let id = format!("{}-{}", ts, step);
        Self {
            id,
            ts,
            state,
            position,
            subgraph_states: Vec::new(),
            pending_interrupt,
            metadata: CheckpointMetadata {
                source,
                step,
                created_at: Some(now),
            },
        }
    }

    /// Attaches the live sub-graph states along `position`.
    pub fn with_subgraph_states(mut self, subgraph_states: Vec<StateRecord>) -> Self {
        self.subgraph_states = subgraph_states;
        self
    }

    /// The run reached END; only fresh threads can run again.
    pub fn is_complete(&self) -> bool {
        self.position.is_empty()
    }

    pub fn is_suspended(&self) -> bool {
        self.pending_interrupt.is_some()
    }
}
