//! StateGraph invoke: node folding, conditional routing, errors, retry and thread rules.

use std::sync::Arc;

use serde_json::json;
use stepgraph::{
    AgentError, CheckpointSource, Input, InvokeOutcome, MemorySaver, MockLlm, RunnableConfig,
    SchemaViolation, StateGraph, StateRecord, StateSchema, END, START,
};

use crate::common::{double_graph, log_schema, LogNode, SummarizeNode};

/// **Scenario**: START -> double -> END with `{x: 3}` returns `{x: 6}`.
#[tokio::test]
async fn invoke_double_returns_six() {
    let compiled = double_graph().compile().expect("graph compiles");
    let out = compiled
        .invoke(StateRecord::new().with("x", 3), None)
        .await
        .unwrap();
    assert_eq!(out, InvokeOutcome::Complete(StateRecord::new().with("x", 6)));
}

/// **Scenario**: The final state equals folding every node's update in execution order.
#[tokio::test]
async fn invoke_folds_updates_in_order() {
    let a = Arc::new(LogNode::new("a"));
    let b = Arc::new(LogNode::new("b"));
    let c = Arc::new(LogNode::new("c"));
    let mut graph = StateGraph::new(log_schema());
    graph
        .add_node("a", a.clone())
        .add_node("b", b.clone())
        .add_node("c", c.clone())
        .add_edge(START, "a")
        .add_edge("a", "b")
        .add_edge("b", "c")
        .add_edge("c", END);
    let out = graph
        .compile()
        .unwrap()
        .invoke(StateRecord::new(), None)
        .await
        .unwrap();
    assert_eq!(out.state().get("log"), Some(&json!(["a", "b", "c"])));
    assert_eq!((a.runs(), b.runs(), c.runs()), (1, 1, 1));
}

/// **Scenario**: A conditional edge loops back until the router picks END.
#[tokio::test]
async fn invoke_conditional_loop_until_done() {
    let mut graph = StateGraph::new(StateSchema::new().with_default("count", 0));
    graph
        .add_fn_node("tick", |s, _| {
            Ok(StateRecord::new().with("count", s.get_i64("count").unwrap_or(0) + 1))
        })
        .add_edge(START, "tick")
        .add_conditional_edges(
            "tick",
            |s| {
                if s.get_i64("count").unwrap_or(0) < 3 {
                    "again".to_string()
                } else {
                    "done".to_string()
                }
            },
            [("again", "tick"), ("done", END)],
        );
    let out = graph
        .compile()
        .unwrap()
        .invoke(StateRecord::new(), None)
        .await
        .unwrap();
    assert_eq!(out.state().get_i64("count"), Some(3));
}

/// **Scenario**: Conditional edges from START pick the first node from the input.
#[tokio::test]
async fn invoke_conditional_entry() {
    let mut graph = StateGraph::new(StateSchema::new().field("mode").optional("out"));
    graph
        .add_fn_node("fast", |_, _| Ok(StateRecord::new().with("out", "fast")))
        .add_fn_node("slow", |_, _| Ok(StateRecord::new().with("out", "slow")))
        .add_conditional_edges(
            START,
            |s| s.get_str("mode").unwrap_or_default().to_string(),
            [("fast", "fast"), ("slow", "slow")],
        )
        .add_edge("fast", END)
        .add_edge("slow", END);
    let compiled = graph.compile().unwrap();
    let out = compiled
        .invoke(StateRecord::new().with("mode", "slow"), None)
        .await
        .unwrap();
    assert_eq!(out.state().get_str("out"), Some("slow"));
}

/// **Scenario**: Router returns "go_left" but only "go_right" is declared: UnknownRoute,
/// and the checkpoint still holds the state before the routing node.
#[tokio::test]
async fn unknown_route_leaves_checkpoint_unchanged() {
    let mut graph = StateGraph::new(StateSchema::new().with_default("visited", false));
    graph
        .add_fn_node("decide", |_, _| Ok(StateRecord::new().with("visited", true)))
        .add_fn_node("right", |_, _| Ok(StateRecord::new()))
        .add_edge(START, "decide")
        .add_conditional_edges("decide", |_| "go_left".to_string(), [("go_right", "right")])
        .add_edge("right", END);
    let compiled = graph
        .compile_with_checkpointer(Arc::new(MemorySaver::new()))
        .unwrap();
    let config = RunnableConfig::for_thread("route");

    match compiled.invoke(StateRecord::new(), Some(config.clone())).await {
        Err(AgentError::UnknownRoute { node, route }) => {
            assert_eq!(node, "decide");
            assert_eq!(route, "go_left");
        }
        other => panic!("expected UnknownRoute, got {:?}", other),
    }

    let snapshot = compiled.get_state(&config, false).await.unwrap();
    assert_eq!(snapshot.values.get_bool("visited"), Some(false));
    assert_eq!(snapshot.next, vec!["decide".to_string()]);
    assert_eq!(snapshot.metadata.source, CheckpointSource::Input);
    assert_eq!(snapshot.metadata.step, 0);
}

/// **Scenario**: A node update naming an undeclared field is a SchemaViolation; the
/// checkpoint stays at the last completed node.
#[tokio::test]
async fn schema_violation_stops_run() {
    let mut graph = StateGraph::new(StateSchema::new().with_default("x", 0));
    graph
        .add_fn_node("ok", |_, _| Ok(StateRecord::new().with("x", 1)))
        .add_fn_node("bad", |_, _| Ok(StateRecord::new().with("y", 2)))
        .add_edge(START, "ok")
        .add_edge("ok", "bad")
        .add_edge("bad", END);
    let compiled = graph
        .compile_with_checkpointer(Arc::new(MemorySaver::new()))
        .unwrap();
    let config = RunnableConfig::for_thread("schema");

    match compiled.invoke(StateRecord::new(), Some(config.clone())).await {
        Err(AgentError::SchemaViolation { node, source }) => {
            assert_eq!(node, "bad");
            assert_eq!(
                source,
                SchemaViolation::UnknownField {
                    field: "y".to_string()
                }
            );
        }
        other => panic!("expected SchemaViolation, got {:?}", other),
    }
    let snapshot = compiled.get_state(&config, false).await.unwrap();
    assert_eq!(snapshot.values.get_i64("x"), Some(1));
    assert!(!snapshot.values.contains_key("y"));
    assert_eq!(snapshot.next, vec!["bad".to_string()]);
}

/// **Scenario**: An external call failure propagates unchanged; after the cause is
/// fixed, Retry continues from the failed node without re-running earlier nodes.
#[tokio::test]
async fn retry_after_text_generation_failure() {
    let llm = Arc::new(MockLlm::new("two steps ran"));
    llm.set_failing(true);
    let prepare = Arc::new(LogNode::new("prepare"));
    let mut graph = StateGraph::new(log_schema().optional("summary"));
    graph
        .add_node("prepare", prepare.clone())
        .add_node("summarize", Arc::new(SummarizeNode { llm: llm.clone() }))
        .add_edge(START, "prepare")
        .add_edge("prepare", "summarize")
        .add_edge("summarize", END);
    let compiled = graph
        .compile_with_checkpointer(Arc::new(MemorySaver::new()))
        .unwrap();
    let config = RunnableConfig::for_thread("retry");

    match compiled.invoke(StateRecord::new(), Some(config.clone())).await {
        Err(AgentError::ExecutionFailed(msg)) => assert!(msg.contains("mock"), "{}", msg),
        other => panic!("expected ExecutionFailed, got {:?}", other),
    }
    // Fresh input on a stalled thread is refused.
    assert!(matches!(
        compiled.invoke(StateRecord::new(), Some(config.clone())).await,
        Err(AgentError::ThreadInProgress(_))
    ));
    // A stalled thread has no interrupt to answer.
    assert!(matches!(
        compiled.invoke(Input::resume("x"), Some(config.clone())).await,
        Err(AgentError::NoPendingWork(_))
    ));

    llm.set_failing(false);
    let out = compiled
        .invoke(Input::Retry, Some(config.clone()))
        .await
        .unwrap();
    assert_eq!(out.state().get_str("summary"), Some("two steps ran"));
    assert_eq!(out.state().get("log"), Some(&json!(["prepare"])));
    assert_eq!(prepare.runs(), 1);
    assert_eq!(llm.prompts().await, vec!["Summarize: prepare"; 2]);

    assert!(matches!(
        compiled.invoke(Input::Retry, Some(config)).await,
        Err(AgentError::NoPendingWork(_))
    ));
}

/// **Scenario**: Thread rules for unknown and completed threads.
#[tokio::test]
async fn thread_rules_for_unknown_and_completed_threads() {
    let compiled = double_graph()
        .compile_with_checkpointer(Arc::new(MemorySaver::new()))
        .unwrap();
    let unknown = RunnableConfig::for_thread("never-started");
    assert!(matches!(
        compiled.invoke(Input::resume("42"), Some(unknown.clone())).await,
        Err(AgentError::NotFound(id)) if id == "never-started"
    ));
    assert!(matches!(
        compiled.invoke(Input::Retry, Some(unknown.clone())).await,
        Err(AgentError::NotFound(_))
    ));
    assert!(matches!(
        compiled.get_state(&unknown, false).await,
        Err(AgentError::NotFound(_))
    ));

    let done = RunnableConfig::for_thread("done");
    compiled
        .invoke(StateRecord::new().with("x", 3), Some(done.clone()))
        .await
        .unwrap();
    assert!(matches!(
        compiled.invoke(Input::resume("42"), Some(done.clone())).await,
        Err(AgentError::NoPendingWork(_))
    ));
    assert!(matches!(
        compiled.invoke(StateRecord::new().with("x", 1), Some(done.clone())).await,
        Err(AgentError::NoPendingWork(_))
    ));
    let snapshot = compiled.get_state(&done, true).await.unwrap();
    assert!(snapshot.is_complete());
    assert!(snapshot.next.is_empty());
    assert_eq!(snapshot.values.get_i64("x"), Some(6));
}
