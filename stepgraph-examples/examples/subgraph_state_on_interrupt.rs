//! The live state of a sub-graph is visible through `get_state(.., true)` only
//! while one of its nodes is suspended.
//!
//! Run: `cargo run -p stepgraph-examples --example subgraph_state_on_interrupt`

use std::sync::Arc;

use stepgraph::{
    Input, MemorySaver, RunnableConfig, StateGraph, StateRecord, StateSchema, END, START,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    stepgraph_examples::init();

    let mut child = StateGraph::new(StateSchema::new().optional("foo").optional("bar"));
    child
        .add_fn_node("subgraph_node_1", |_, ctx| {
            let value = ctx.interrupt("Provide value:")?;
            Ok(StateRecord::new().with("bar", value))
        })
        .add_edge(START, "subgraph_node_1")
        .add_edge("subgraph_node_1", END);

    let mut parent = StateGraph::new(StateSchema::new().field("foo"));
    parent
        .add_subgraph("node_1", Arc::new(child.compile()?))
        .add_edge(START, "node_1")
        .add_edge("node_1", END);
    let app = parent.compile_with_checkpointer(Arc::new(MemorySaver::new()))?;
    let config = RunnableConfig::for_thread("1");

    let paused = app
        .invoke(StateRecord::new().with("foo", ""), Some(config.clone()))
        .await?;
    if let Some(interrupt) = paused.interrupt() {
        println!("suspended: {}", interrupt.value);
    }

    let snapshot = app.get_state(&config, true).await?;
    for sub in &snapshot.subgraphs {
        println!(
            "[during interrupt] {} next={} values={}",
            sub.namespace.join("/"),
            sub.next,
            sub.values.clone().into_json()
        );
    }

    app.invoke(Input::resume("bar"), Some(config.clone())).await?;

    let snapshot = app.get_state(&config, true).await?;
    if snapshot.subgraphs.is_empty() {
        println!("[after interrupt] run complete, no sub-graph state left");
    }
    println!("final: {}", snapshot.values.into_json());
    Ok(())
}
