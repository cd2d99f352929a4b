//! StateGraph stream: event order and modes match invoke.

use std::sync::Arc;

use serde_json::json;
use stepgraph::{StateGraph, StateRecord, StreamEvent, StreamMode, StreamOptions, END, START};
use tokio_stream::StreamExt;

use crate::common::{log_schema, LogNode};

fn abc_graph() -> StateGraph {
    let mut graph = StateGraph::new(log_schema());
    graph
        .add_node("a", Arc::new(LogNode::new("a")))
        .add_node("b", Arc::new(LogNode::new("b")))
        .add_node("c", Arc::new(LogNode::new("c")))
        .add_edge(START, "a")
        .add_edge("a", "b")
        .add_edge("b", "c")
        .add_edge("c", END);
    graph
}

/// **Scenario**: Updates mode yields one event per node, in execution order.
#[tokio::test]
async fn stream_updates_in_execution_order() {
    let compiled = abc_graph().compile().unwrap();
    let nodes: Vec<String> = compiled
        .stream(StateRecord::new(), None, StreamOptions::updates())
        .map(|event| match event.unwrap() {
            StreamEvent::Updates { node, .. } => node,
            other => panic!("unexpected event {:?}", other),
        })
        .collect()
        .await;
    assert_eq!(nodes, vec!["a", "b", "c"]);
}

/// **Scenario**: The last Values event equals the invoke result.
#[tokio::test]
async fn stream_values_last_equals_invoke() {
    let compiled = abc_graph().compile().unwrap();
    let invoked = compiled.invoke(StateRecord::new(), None).await.unwrap();

    let events: Vec<_> = compiled
        .stream(StateRecord::new(), None, StreamOptions::values())
        .collect()
        .await;
    assert_eq!(events.len(), 3);
    match events.last() {
        Some(Ok(StreamEvent::Values { namespace, state })) => {
            assert!(namespace.is_empty());
            assert_eq!(state, invoked.state());
            assert_eq!(state.get("log"), Some(&json!(["a", "b", "c"])));
        }
        other => panic!("expected Values, got {:?}", other),
    }
}

/// **Scenario**: Update events carry only what the node returned, not the merged state.
#[tokio::test]
async fn stream_update_is_partial() {
    let compiled = abc_graph().compile().unwrap();
    let mut stream = compiled.stream(
        StateRecord::new(),
        None,
        StreamOptions::new([StreamMode::Updates]),
    );
    let _first = stream.next().await;
    match stream.next().await {
        Some(Ok(StreamEvent::Updates { node, update, .. })) => {
            assert_eq!(node, "b");
            assert_eq!(update, StateRecord::new().with("log", "b"));
        }
        other => panic!("expected Updates for b, got {:?}", other),
    }
}
