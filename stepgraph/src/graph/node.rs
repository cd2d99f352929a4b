//! Graph node trait and the closure adapter.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::state::StateRecord;

use super::compiled::CompiledStateGraph;
use super::RunContext;

/// One step in a graph: receives the current state, returns a partial update.
///
/// The update may contain only a subset of the schema's fields; each field goes
/// through its reducer when merged. To pause for external input, call
/// [`RunContext::interrupt`] and propagate its error with `?`.
///
/// **Interaction**: Registered with `StateGraph::add_node`; the executor passes a
/// fresh `RunContext` on every run, including re-runs after a resume.
#[async_trait]
pub trait Node: Send + Sync {
    /// Node id (e.g. "router", "approval").
    fn id(&self) -> &str;

    async fn run(&self, state: StateRecord, ctx: &RunContext) -> Result<StateRecord, AgentError>;
}

/// Node built from a synchronous closure.
///
/// ```rust
/// use stepgraph::{FnNode, RunContext, StateRecord};
///
/// let double = FnNode::new("double", |state: &StateRecord, _ctx: &RunContext| {
///     let x = state.get_i64("x").unwrap_or(0);
///     Ok(StateRecord::new().with("x", x * 2))
/// });
/// ```
pub struct FnNode<F> {
    id: String,
    f: F,
}

impl<F> FnNode<F>
where
    F: Fn(&StateRecord, &RunContext) -> Result<StateRecord, AgentError> + Send + Sync + 'static,
{
    pub fn new(id: impl Into<String>, f: F) -> Self {
        Self { id: id.into(), f }
    }
}

#[async_trait]
impl<F> Node for FnNode<F>
where
    F: Fn(&StateRecord, &RunContext) -> Result<StateRecord, AgentError> + Send + Sync + 'static,
{
    fn id(&self) -> &str {
        &self.id
    }

    async fn run(&self, state: StateRecord, ctx: &RunContext) -> Result<StateRecord, AgentError> {
        (self.f)(&state, ctx)
    }
}

/// A registered node: ordinary function node or embedded compiled graph.
#[derive(Clone)]
pub(crate) enum NodeEntry {
    Function(Arc<dyn Node>),
    Subgraph(SubgraphNode),
}

/// Compiled graph embedded as a node. `shared` lists the field names declared by
/// both schemas; only those flow in and out.
#[derive(Clone)]
pub(crate) struct SubgraphNode {
    pub graph: Arc<CompiledStateGraph>,
    pub shared: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::RunnableConfig;

    /// **Scenario**: FnNode runs its closure and exposes its id.
    #[tokio::test]
    async fn fn_node_runs_closure() {
        let node = FnNode::new("double", |s: &StateRecord, _: &RunContext| {
            Ok(StateRecord::new().with("x", s.get_i64("x").unwrap_or(0) * 2))
        });
        assert_eq!(node.id(), "double");
        let ctx = RunContext::new(RunnableConfig::default(), vec!["double".into()], vec![]);
        let out = node
            .run(StateRecord::new().with("x", 3), &ctx)
            .await
            .unwrap();
        assert_eq!(out.get_i64("x"), Some(6));
    }

    /// **Scenario**: Errors from the closure are returned unchanged.
    #[tokio::test]
    async fn fn_node_propagates_error() {
        let node = FnNode::new("fail", |_: &StateRecord, _: &RunContext| {
            Err(AgentError::ExecutionFailed("boom".into()))
        });
        let ctx = RunContext::new(RunnableConfig::default(), vec!["fail".into()], vec![]);
        match node.run(StateRecord::new(), &ctx).await {
            Err(AgentError::ExecutionFailed(msg)) => assert_eq!(msg, "boom"),
            other => panic!("expected ExecutionFailed, got {:?}", other),
        }
    }
}
