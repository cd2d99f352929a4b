//! Conditional edges: route to the next node based on state.
//!
//! A source node has a routing function that takes the merged state and returns a
//! key; the key is looked up in the declared target mapping. A key missing from the
//! mapping fails the run with `AgentError::UnknownRoute`.
//!
//! **Interaction**: Used by `StateGraph::add_conditional_edges` and the
//! `CompiledStateGraph` run loop to resolve the next node.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::AgentError;
use crate::state::StateRecord;

/// Router function: takes the merged state and returns a routing key.
pub type RouterFn = Arc<dyn Fn(&StateRecord) -> String + Send + Sync>;

/// Conditional edge definition: routing function plus key -> target mapping.
#[derive(Clone)]
pub struct ConditionalRouter {
    path: RouterFn,
    path_map: BTreeMap<String, String>,
}

impl ConditionalRouter {
    pub fn new(path: RouterFn, path_map: BTreeMap<String, String>) -> Self {
        Self { path, path_map }
    }

    /// Declared `(key, target)` pairs, ordered by key.
    pub fn targets(&self) -> impl Iterator<Item = (&String, &String)> {
        self.path_map.iter()
    }

    /// Resolves the next node id from the state produced by `node`.
    pub fn resolve(&self, node: &str, state: &StateRecord) -> Result<String, AgentError> {
        let key = (self.path)(state);
        self.path_map
            .get(&key)
            .cloned()
            .ok_or_else(|| AgentError::UnknownRoute {
                node: node.to_string(),
                route: key,
            })
    }
}

/// How to determine the next node after a given node (or START).
#[derive(Clone)]
pub(crate) enum NextEntry {
    /// Single fixed next node (or END).
    Unconditional(String),
    /// Decided by the router from the merged state.
    Conditional(ConditionalRouter),
}
