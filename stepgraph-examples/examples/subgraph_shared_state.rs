//! Sub-graph added as a node: parent and child share `foo`; the child's private
//! `baz` never reaches the parent.
//!
//! Run: `cargo run -p stepgraph-examples --example subgraph_shared_state`

use std::sync::Arc;

use stepgraph::{StateGraph, StateRecord, StateSchema, StreamEvent, StreamOptions, END, START};
use tokio_stream::StreamExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    stepgraph_examples::init();

    let mut child = StateGraph::new(StateSchema::new().optional("foo").optional("baz"));
    child
        .add_fn_node("subgraph_node_1", |_, _| Ok(StateRecord::new().with("baz", "baz")))
        .add_fn_node("subgraph_node_2", |s, _| {
            let foo = s.get_str("foo").unwrap_or("");
            let baz = s.get_str("baz").unwrap_or("");
            Ok(StateRecord::new().with("foo", format!("{}{}", foo, baz)))
        })
        .add_edge(START, "subgraph_node_1")
        .add_edge("subgraph_node_1", "subgraph_node_2")
        .add_edge("subgraph_node_2", END);
    let child = Arc::new(child.compile()?);

    let mut parent = StateGraph::new(StateSchema::new().field("foo"));
    parent
        .add_fn_node("node_1", |s, _| {
            Ok(StateRecord::new().with("foo", format!("hi! {}", s.get_str("foo").unwrap_or(""))))
        })
        .add_subgraph("node_2", child)
        .add_edge(START, "node_1")
        .add_edge("node_1", "node_2")
        .add_edge("node_2", END);
    let app = parent.compile()?;

    println!("{}", app.draw_mermaid());

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
