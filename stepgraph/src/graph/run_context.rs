//! Run context passed into nodes: config, node path, the interrupt scratchpad and
//! the event channel of a streamed run.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;
use serde_json::Value;

use crate::error::AgentError;
use crate::memory::RunnableConfig;

use super::interrupt::{GraphInterrupt, Interrupt};
use super::logging::log_interrupt_replay;
use super::run_loop::EventSink;

/// Per-node-execution context.
///
/// Created by the executor for every node run. Holds the answers already given to
/// this node's interrupts; [`interrupt`](Self::interrupt) replays them in call order.
pub struct RunContext {
    config: RunnableConfig,
    path: Vec<String>,
    resume_values: Vec<Value>,
    next_interrupt: AtomicUsize,
    events: Option<EventSink>,
}

impl RunContext {
    pub(crate) fn new(config: RunnableConfig, path: Vec<String>, resume_values: Vec<Value>) -> Self {
        Self {
            config,
            path,
            resume_values,
            next_interrupt: AtomicUsize::new(0),
            events: None,
        }
    }

    pub(crate) fn with_events(mut self, events: Option<EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Event channel of the surrounding `stream` call, if any.
    pub(crate) fn events(&self) -> Option<&EventSink> {
        self.events.as_ref()
    }

    /// Config of the current run (thread_id).
    pub fn config(&self) -> &RunnableConfig {
        &self.config
    }

    pub fn thread_id(&self) -> Option<&str> {
        self.config.thread_id.as_deref()
    }

    /// Node names from the outermost graph down to this node.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Name of the running node.
    pub fn node(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or_default()
    }

    /// Suspends the node until the caller supplies a value.
    ///
    /// On first execution this returns `Err(AgentError::Interrupted(..))` carrying
    /// `payload`; propagate it with `?`. When the node re-runs after a resume, the
    /// same call returns `Ok(answer)`. Several calls in one body are answered in the
    /// order they are reached, one resume per suspension.
    ///
    /// The whole node body re-runs on resume, so side effects before this call must
    /// be idempotent (or live in a separate node).
    pub fn interrupt(&self, payload: impl Serialize) -> Result<Value, AgentError> {
        let index = self.next_interrupt.fetch_add(1, Ordering::SeqCst);
        if let Some(answer) = self.resume_values.get(index) {
            log_interrupt_replay(&self.path, index);
            return Ok(answer.clone());
        }
        let value = serde_json::to_value(payload)
            .map_err(|e| AgentError::ExecutionFailed(format!("interrupt payload: {}", e)))?;
        let id = format!("{}:{}", self.path.join("/"), index);
        Err(GraphInterrupt(Interrupt::with_id(value, id)).into())
    }
}
