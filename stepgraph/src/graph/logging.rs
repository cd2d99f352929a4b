//! Logging utilities for graph execution.
//!
//! Structured `tracing` events for runs, node steps, interrupts and checkpoints.
//! Node paths are logged joined with `/` (outermost graph first).

use crate::error::AgentError;
use crate::memory::CheckpointSource;

use super::interrupt::Interrupt;

fn joined(path: &[String]) -> String {
    path.join("/")
}

/// Log graph execution start.
pub fn log_graph_start(thread_id: Option<&str>, input: &str) {
    tracing::info!(thread_id = thread_id.unwrap_or("-"), input, "Starting graph execution");
}

/// Log graph execution completion.
pub fn log_graph_complete(thread_id: Option<&str>, interrupted: bool) {
    tracing::info!(
        thread_id = thread_id.unwrap_or("-"),
        interrupted,
        "Graph execution complete"
    );
}

/// Log graph execution error.
pub fn log_graph_error(error: &AgentError) {
    tracing::error!(?error, "Graph execution error");
}

/// Log node execution start.
pub fn log_node_start(path: &[String]) {
    tracing::debug!(node = %joined(path), "Starting node execution");
}

/// Log node execution completion and the resolved successor.
pub fn log_node_complete(path: &[String], next: &str) {
    tracing::debug!(node = %joined(path), next, "Node execution complete");
}

/// Log the fields a node update touched.
pub fn log_state_update(path: &[String], fields: &[&String]) {
    tracing::trace!(node = %joined(path), ?fields, "State updated");
}

pub fn log_node_error(path: &[String], error: &AgentError) {
    tracing::warn!(node = %joined(path), %error, "Node execution failed");
}

/// Log a node suspending on an interrupt.
pub fn log_interrupt(path: &[String], interrupt: &Interrupt) {
    tracing::info!(
        node = %joined(path),
        id = interrupt.id.as_deref().unwrap_or("-"),
        value = %interrupt.value,
        "Node interrupted"
    );
}

pub fn log_interrupt_replay(path: &[String], index: usize) {
    tracing::debug!(node = %joined(path), index, "Replaying interrupt answer");
}

/// Log a resume of a suspended thread.
pub fn log_resume(thread_id: &str, position: &[String]) {
    tracing::info!(thread_id, position = %joined(position), "Resuming thread");
}

/// Log a checkpoint write.
pub fn log_checkpoint(thread_id: &str, step: u64, source: CheckpointSource) {
    tracing::debug!(thread_id, step, source = source.as_str(), "Checkpoint saved");
}
