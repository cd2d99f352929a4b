//! StateGraph compile failure cases: unknown nodes, unreachable nodes, bad routes.

use stepgraph::{ConfigViolation, StateGraph, StateRecord, END, START};

use crate::common::x_schema;

/// **Scenario**: An edge to an undeclared node is reported with the edge that named it.
#[test]
fn compile_fails_when_edge_refers_to_unknown_node() {
    let mut graph = StateGraph::new(x_schema());
    graph
        .add_fn_node("echo", |_, _| Ok(StateRecord::new()))
        .add_edge(START, "echo")
        .add_edge("echo", "missing");

    let err = graph.compile().unwrap_err();
    assert_eq!(
        err.violations,
        vec![ConfigViolation::NodeNotFound {
            node: "missing".into(),
            edge: "edge echo -> missing".into(),
        }]
    );
}

/// **Scenario**: A node with edges but no path from START is unreachable.
#[test]
fn compile_fails_when_node_unreachable() {
    let mut graph = StateGraph::new(x_schema());
    graph
        .add_fn_node("a", |_, _| Ok(StateRecord::new()))
        .add_fn_node("island", |_, _| Ok(StateRecord::new()))
        .add_edge(START, "a")
        .add_edge("a", END)
        .add_edge("island", END);

    let err = graph.compile().unwrap_err();
    assert_eq!(
        err.violations,
        vec![ConfigViolation::Unreachable("island".into())]
    );
}

/// **Scenario**: Validation is exhaustive: every problem is listed in one error.
#[test]
fn compile_reports_all_violations_together() {
    let mut graph = StateGraph::new(x_schema());
    graph
        .add_fn_node("decide", |_, _| Ok(StateRecord::new()))
        .add_fn_node("stuck", |_, _| Ok(StateRecord::new()))
        .add_edge(START, "decide")
        .add_conditional_edges(
            "decide",
            |_| "go_right".to_string(),
            [("go_right", "right"), ("stay", "stuck")],
        );

    let err = graph.compile().unwrap_err();
    assert!(err.contains(&ConfigViolation::NodeNotFound {
        node: "right".into(),
        edge: "conditional edges from decide (route \"go_right\")".into(),
    }));
    assert!(err.contains(&ConfigViolation::DeadEnd("stuck".into())));
    assert_eq!(err.violations.len(), 2, "{}", err);
    let message = err.to_string();
    assert!(message.contains("right"), "{}", message);
    assert!(message.contains("stuck"), "{}", message);
}

/// **Scenario**: A graph with nodes but no entry edge fails with MissingEntry.
#[test]
fn compile_fails_without_entry() {
    let mut graph = StateGraph::new(x_schema());
    graph
        .add_fn_node("a", |_, _| Ok(StateRecord::new()))
        .add_edge("a", END);

    let err = graph.compile().unwrap_err();
    assert!(err.contains(&ConfigViolation::MissingEntry), "{}", err);
    assert!(err.contains(&ConfigViolation::Unreachable("a".into())), "{}", err);
}
