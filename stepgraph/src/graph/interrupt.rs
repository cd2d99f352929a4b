//! Interrupt mechanism for graph execution.
//!
//! A node calls [`RunContext::interrupt`](super::RunContext::interrupt) to pause the
//! run and ask the caller for a value. The executor checkpoints the suspension and
//! returns; the caller answers with `Input::Resume(value)` and the node body runs
//! again from the top, this time receiving the value at the same call site.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Interrupt value surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interrupt {
    /// The interrupt payload (any JSON-serializable data).
    pub value: serde_json::Value,
    /// Identifies the call site: node path plus call index within the node body.
    pub id: Option<String>,
}

impl Interrupt {
    /// Creates a new interrupt with a value.
    pub fn new(value: serde_json::Value) -> Self {
        Self { value, id: None }
    }

    /// Creates a new interrupt with a value and ID.
    pub fn with_id(value: serde_json::Value, id: impl Into<String>) -> Self {
        Self {
            value,
            id: Some(id.into()),
        }
    }
}

/// Signal raised by a node that is waiting for external input.
///
/// Travels as `AgentError::Interrupted` so node bodies can propagate it with `?`.
#[derive(Debug, Clone, Error)]
#[error("interrupt {:?}: {}", .0.id, .0.value)]
pub struct GraphInterrupt(pub Interrupt);

impl From<Interrupt> for GraphInterrupt {
    fn from(interrupt: Interrupt) -> Self {
        GraphInterrupt(interrupt)
    }
}
