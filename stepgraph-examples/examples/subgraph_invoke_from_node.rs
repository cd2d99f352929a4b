//! Sub-graph invoked from inside a node: the schemas share nothing, so the node
//! maps parent fields to child input and the child result back. The child runs
//! through `invoke_from_node`, so its node events show up in the parent's stream.
//!
//! Run: `cargo run -p stepgraph-examples --example subgraph_invoke_from_node`

use std::sync::Arc;

use async_trait::async_trait;
use stepgraph::{
    AgentError, CompiledStateGraph, Node, RunContext, StateGraph, StateRecord, StateSchema,
    StreamEvent, StreamOptions, END, START,
};
use tokio_stream::StreamExt;

struct CallChild {
    child: Arc<CompiledStateGraph>,
}

#[async_trait]
impl Node for CallChild {
    fn id(&self) -> &str {
        "node_2"
    }

    async fn run(&self, state: StateRecord, ctx: &RunContext) -> Result<StateRecord, AgentError> {
        let input = StateRecord::new().with("bar", state.get_str("foo").unwrap_or_default());
        let response = self.child.invoke_from_node(input, ctx).await?;
        Ok(StateRecord::new().with("foo", response.state().get_str("bar").unwrap_or_default()))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    stepgraph_examples::init();

    let mut child = StateGraph::new(StateSchema::new().field("bar").optional("baz"));
    child
        .add_fn_node("subgraph_node_1", |_, _| Ok(StateRecord::new().with("baz", "baz")))
        .add_fn_node("subgraph_node_2", |s, _| {
            let bar = s.get_str("bar").unwrap_or("");
            let baz = s.get_str("baz").unwrap_or("");
            Ok(StateRecord::new().with("bar", format!("{}{}", bar, baz)))
        })
        .add_edge(START, "subgraph_node_1")
        .add_edge("subgraph_node_1", "subgraph_node_2")
        .add_edge("subgraph_node_2", END);
    let child = Arc::new(child.compile()?);

    let mut parent = StateGraph::new(StateSchema::new().field("foo"));
    parent
        .add_fn_node("node_1", |_, _| Ok(StateRecord::new().with("foo", "hi! foo")))
        .add_node("node_2", Arc::new(CallChild { child }))
        .add_edge(START, "node_1")
        .add_edge("node_1", "node_2")
        .add_edge("node_2", END);
    let app = parent.compile()?;

    let mut events = app.stream(
        StateRecord::new().with("foo", "foo"),
        None,
        StreamOptions::updates().with_subgraphs(true),
    );
    while let Some(event) = events.next().await {
        if let StreamEvent::Updates { namespace, node, update } = event? {
            println!("[{}] {}: {}", namespace.join("/"), node, update.into_json());
        }
    }

    let out = app.invoke(StateRecord::new().with("foo", "foo"), None).await?;
    println!("final: {}", out.into_state().into_json());
    Ok(())
}
