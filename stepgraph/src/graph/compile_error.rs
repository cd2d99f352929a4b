//! Graph compilation error.
//!
//! Returned by `StateGraph::compile` when the graph structure is invalid. Every
//! problem found is collected, so one error lists all of them.

use std::fmt;

use thiserror::Error;

/// One structural problem found while compiling a graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigViolation {
    /// A node was registered under `START` or `END`.
    #[error("node name {0:?} is reserved")]
    ReservedNodeName(String),

    /// Two nodes were registered under the same name.
    #[error("duplicate node: {0}")]
    DuplicateNode(String),

    /// An edge references a node that was never added.
    #[error("node not found: {node} (referenced by {edge})")]
    NodeNotFound { node: String, edge: String },

    /// An edge leads back into START.
    #[error("edge from {0} targets START")]
    EdgeIntoStart(String),

    /// An edge leaves END.
    #[error("edge from END to {0}")]
    EdgeFromEnd(String),

    /// Nothing leaves START.
    #[error("graph has no edge from START")]
    MissingEntry,

    /// More than one outgoing edge declared for a node (or START).
    #[error("{0} has more than one outgoing edge")]
    MultipleOutgoing(String),

    /// A node has both an edge and conditional edges.
    #[error("{0} has both an edge and conditional edges")]
    MixedEdges(String),

    /// Conditional edges declared with no targets.
    #[error("conditional edges from {0} declare no targets")]
    EmptyRouteMap(String),

    /// A node has no outgoing edge; it must lead somewhere (END included).
    #[error("node {0} has no outgoing edge")]
    DeadEnd(String),

    /// A node cannot be reached from START.
    #[error("node {0} is unreachable from START")]
    Unreachable(String),
}

/// Error when compiling a state graph: every violation found.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct GraphConfigError {
    pub violations: Vec<ConfigViolation>,
}

impl GraphConfigError {
    pub fn contains(&self, violation: &ConfigViolation) -> bool {
        self.violations.contains(violation)
    }
}

impl fmt::Display for GraphConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid graph ({} problem(s))", self.violations.len())?;
        for v in &self.violations {
            write!(f, "\n  - {}", v)?;
        }
        Ok(())
    }
}
