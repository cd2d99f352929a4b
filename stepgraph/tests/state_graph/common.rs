//! Shared types for state_graph integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use stepgraph::{
    AgentError, Node, Reducer, RunContext, StateGraph, StateRecord, StateSchema, TextGenerator,
    END, START,
};

/// `{ x }` with `x` required.
pub fn x_schema() -> StateSchema {
    StateSchema::new().field("x")
}

/// START -> double -> END, `x -> x * 2`.
pub fn double_graph() -> StateGraph {
    let mut graph = StateGraph::new(x_schema());
    graph
        .add_fn_node("double", |s, _| {
            Ok(StateRecord::new().with("x", s.get_i64("x").unwrap_or(0) * 2))
        })
        .add_edge(START, "double")
        .add_edge("double", END);
    graph
}

/// `{ log: [] }` appended to by every node.
pub fn log_schema() -> StateSchema {
    StateSchema::new()
        .with_default("log", serde_json::json!([]))
        .with_reducer("log", Reducer::Append)
}

/// Node that appends its id to `log` and counts its runs.
pub struct LogNode {
    pub id: String,
    pub runs: Arc<AtomicUsize>,
}

impl LogNode {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            runs: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Node for LogNode {
    fn id(&self) -> &str {
        &self.id
    }

    async fn run(&self, _state: StateRecord, _ctx: &RunContext) -> Result<StateRecord, AgentError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(StateRecord::new().with("log", self.id.clone()))
    }
}

/// Node that asks a text generator to summarize `log` into `summary`.
pub struct SummarizeNode {
    pub llm: Arc<dyn TextGenerator>,
}

#[async_trait]
impl Node for SummarizeNode {
    fn id(&self) -> &str {
        "summarize"
    }

    async fn run(&self, state: StateRecord, _ctx: &RunContext) -> Result<StateRecord, AgentError> {
        let log = state.get_str_list("log").unwrap_or_default();
        let summary = self
            .llm
            .generate(&format!("Summarize: {}", log.join(", ")))
            .await?;
        Ok(StateRecord::new().with("summary", summary))
    }
}
