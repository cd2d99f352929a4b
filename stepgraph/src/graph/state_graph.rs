//! State graph: nodes, explicit edges and conditional edges over one schema.
//!
//! Add nodes with `add_node` / `add_fn_node` / `add_subgraph`, connect them with
//! `add_edge(from, to)` and `add_conditional_edges`, using `START` and `END` for
//! entry and exit, then `compile` or `compile_with_checkpointer` to get a
//! `CompiledStateGraph`.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use crate::error::AgentError;
use crate::memory::Checkpointer;
use crate::state::{StateRecord, StateSchema};

use super::compile_error::{ConfigViolation, GraphConfigError};
use super::compiled::CompiledStateGraph;
use super::conditional::{ConditionalRouter, NextEntry};
use super::node::{FnNode, Node, NodeEntry, SubgraphNode};
use super::RunContext;

/// Sentinel for graph entry: use as `from` in `add_edge(START, first_node)`.
pub const START: &str = "__start__";

/// Sentinel for graph exit: use as `to` in `add_edge(last_node, END)`.
pub const END: &str = "__end__";

enum Outgoing {
    Edge(String),
    Conditional(ConditionalRouter),
}

/// State graph builder.
///
/// Holds the declared schema every node update is checked against. Nothing is
/// validated until `compile`, which reports all structural problems at once.
///
/// **Interaction**: Accepts `Arc<dyn Node>` and compiled sub-graphs; produces
/// `CompiledStateGraph`.
pub struct StateGraph {
    schema: StateSchema,
    nodes: Vec<(String, NodeEntry)>,
    outgoing: Vec<(String, Outgoing)>,
}

impl StateGraph {
    /// Creates an empty graph over `schema`.
    pub fn new(schema: StateSchema) -> Self {
        Self {
            schema,
            nodes: Vec::new(),
            outgoing: Vec::new(),
        }
    }

    pub fn schema(&self) -> &StateSchema {
        &self.schema
    }

    /// Adds a function node. Names must be unique; duplicates are reported by `compile`.
    pub fn add_node(&mut self, id: impl Into<String>, node: Arc<dyn Node>) -> &mut Self {
        self.nodes.push((id.into(), NodeEntry::Function(node)));
        self
    }

    /// Adds a node built from a synchronous closure returning the partial update.
    pub fn add_fn_node<F>(&mut self, id: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&StateRecord, &RunContext) -> Result<StateRecord, AgentError>
            + Send
            + Sync
            + 'static,
    {
        let id = id.into();
        let node = Arc::new(FnNode::new(id.clone(), f));
        self.add_node(id, node)
    }

    /// Embeds a compiled graph as a node.
    ///
    /// Fields declared by both schemas are copied in when the node starts and
    /// copied back when the sub-graph finishes; the child's other fields start from
    /// its defaults and never reach this graph. The child's own checkpointer, if
    /// any, is not used; its suspensions are stored in this graph's checkpoint.
    pub fn add_subgraph(
        &mut self,
        id: impl Into<String>,
        graph: Arc<CompiledStateGraph>,
    ) -> &mut Self {
        let shared = self.schema.shared_fields(graph.schema());
        self.nodes
            .push((id.into(), NodeEntry::Subgraph(SubgraphNode { graph, shared })));
        self
    }

    /// Adds an edge from `from` to `to`. Use `START` for entry and `END` for exit.
    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.outgoing.push((from.into(), Outgoing::Edge(to.into())));
        self
    }

    /// Adds conditional edges from `from`.
    ///
    /// After `from` completes, `router` is called with the merged state; the key it
    /// returns is looked up in `path_map` (key -> node name or `END`). A key missing
    /// from the map fails the run with `AgentError::UnknownRoute`.
    pub fn add_conditional_edges<R, I, K, V>(
        &mut self,
        from: impl Into<String>,
        router: R,
        path_map: I,
    ) -> &mut Self
    where
        R: Fn(&StateRecord) -> String + Send + Sync + 'static,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: BTreeMap<String, String> = path_map
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.outgoing.push((
            from.into(),
            Outgoing::Conditional(ConditionalRouter::new(Arc::new(router), map)),
        ));
        self
    }

    /// Builds the executable graph without persistence.
    ///
    /// Runs are ephemeral: interrupts fail with `InterruptWithoutCheckpointer`.
    pub fn compile(self) -> Result<CompiledStateGraph, GraphConfigError> {
        self.compile_internal(None)
    }

    /// Builds the executable graph bound to a checkpointer (thread_id in config).
    pub fn compile_with_checkpointer(
        self,
        checkpointer: Arc<dyn Checkpointer>,
    ) -> Result<CompiledStateGraph, GraphConfigError> {
        self.compile_internal(Some(checkpointer))
    }

    fn compile_internal(
        self,
        checkpointer: Option<Arc<dyn Checkpointer>>,
    ) -> Result<CompiledStateGraph, GraphConfigError> {
        let mut violations = Vec::new();

        let mut node_order: Vec<String> = Vec::new();
        let mut nodes: HashMap<String, NodeEntry> = HashMap::new();
        for (id, entry) in self.nodes {
            if id == START || id == END {
                violations.push(ConfigViolation::ReservedNodeName(id));
                continue;
            }
            if nodes.contains_key(&id) {
                violations.push(ConfigViolation::DuplicateNode(id));
                continue;
            }
            node_order.push(id.clone());
            nodes.insert(id, entry);
        }

        let check_target = |from: &str, to: &str, via: String, out: &mut Vec<ConfigViolation>| {
            if to == START {
                out.push(ConfigViolation::EdgeIntoStart(from.to_string()));
            } else if to != END && !nodes.contains_key(to) {
                out.push(ConfigViolation::NodeNotFound {
                    node: to.to_string(),
                    edge: via,
                });
            }
        };

        let mut next: HashMap<String, NextEntry> = HashMap::new();
        let mut edge_count: HashMap<String, usize> = HashMap::new();
        let mut conditional_count: HashMap<String, usize> = HashMap::new();
        let mut reported_sources: HashSet<String> = HashSet::new();
        for (from, out) in self.outgoing {
            if from == END {
                let to = match &out {
                    Outgoing::Edge(to) => to.clone(),
                    Outgoing::Conditional(_) => "conditional edges".to_string(),
                };
                violations.push(ConfigViolation::EdgeFromEnd(to));
                continue;
            }
            let source_known = from == START || nodes.contains_key(&from);
            if !source_known && reported_sources.insert(from.clone()) {
                let edge = match &out {
                    Outgoing::Edge(to) => format!("edge {} -> {}", from, to),
                    Outgoing::Conditional(_) => format!("conditional edges from {}", from),
                };
                violations.push(ConfigViolation::NodeNotFound {
                    node: from.clone(),
                    edge,
                });
            }
            match &out {
                Outgoing::Edge(to) => {
                    *edge_count.entry(from.clone()).or_default() += 1;
                    check_target(&from, to, format!("edge {} -> {}", from, to), &mut violations);
                }
                Outgoing::Conditional(router) => {
                    *conditional_count.entry(from.clone()).or_default() += 1;
                    if router.targets().next().is_none() {
                        violations.push(ConfigViolation::EmptyRouteMap(from.clone()));
                    }
                    for (key, to) in router.targets() {
                        let via = format!("conditional edges from {} (route {:?})", from, key);
                        check_target(&from, to, via, &mut violations);
                    }
                }
            }
            // First declaration wins; the rest are reported below.
            if source_known && !next.contains_key(&from) {
                let entry = match out {
                    Outgoing::Edge(to) => NextEntry::Unconditional(to),
                    Outgoing::Conditional(router) => NextEntry::Conditional(router),
                };
                next.insert(from, entry);
            }
        }

        let mut sources: Vec<String> = vec![START.to_string()];
        sources.extend(node_order.iter().cloned());
        for source in &sources {
            let edges = edge_count.get(source).copied().unwrap_or(0);
            let conditionals = conditional_count.get(source).copied().unwrap_or(0);
            if edges > 0 && conditionals > 0 {
                violations.push(ConfigViolation::MixedEdges(source.clone()));
            } else if edges > 1 || conditionals > 1 {
                violations.push(ConfigViolation::MultipleOutgoing(source.clone()));
            } else if edges + conditionals == 0 {
                if source == START {
                    violations.push(ConfigViolation::MissingEntry);
                } else {
                    violations.push(ConfigViolation::DeadEnd(source.clone()));
                }
            }
        }

        let reachable = reachable_from_start(&next);
        for id in &node_order {
            if !reachable.contains(id.as_str()) {
                violations.push(ConfigViolation::Unreachable(id.clone()));
            }
        }

        if !violations.is_empty() {
            return Err(GraphConfigError { violations });
        }

        Ok(CompiledStateGraph {
            schema: Arc::new(self.schema),
            nodes: Arc::new(nodes),
            node_order: Arc::new(node_order),
            next: Arc::new(next),
            checkpointer,
        })
    }
}

fn reachable_from_start(next: &HashMap<String, NextEntry>) -> HashSet<&str> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::from([START]);
    while let Some(id) = queue.pop_front() {
        let targets: Vec<&str> = match next.get(id) {
            Some(NextEntry::Unconditional(to)) => vec![to.as_str()],
            Some(NextEntry::Conditional(router)) => {
                router.targets().map(|(_, to)| to.as_str()).collect()
            }
            None => vec![],
        };
        for to in targets {
            if to != END && seen.insert(to) {
                queue.push_back(to);
            }
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &StateRecord, _: &RunContext) -> Result<StateRecord, AgentError> {
        Ok(StateRecord::new())
    }

    fn schema() -> StateSchema {
        StateSchema::new().optional("x")
    }

    /// **Scenario**: A linear START -> a -> b -> END graph compiles.
    #[test]
    fn compile_linear_graph() {
        let mut g = StateGraph::new(schema());
        g.add_fn_node("a", noop)
            .add_fn_node("b", noop)
            .add_edge(START, "a")
            .add_edge("a", "b")
            .add_edge("b", END);
        let compiled = g.compile().expect("valid graph");
        assert_eq!(compiled.node_names(), vec!["a", "b"]);
    }

    /// **Scenario**: Conditional edges from START and loops back to a node are accepted.
    #[test]
    fn compile_conditional_start_and_cycle() {
        let mut g = StateGraph::new(schema());
        g.add_fn_node("menu", noop)
            .add_fn_node("play", noop)
            .add_conditional_edges(START, |_| "menu".to_string(), [("menu", "menu")])
            .add_conditional_edges(
                "menu",
                |s| s.get_str("x").unwrap_or("quit").to_string(),
                [("play", "play"), ("quit", END)],
            )
            .add_edge("play", "menu");
        assert!(g.compile().is_ok());
    }

    /// **Scenario**: Several independent problems are all reported in one error.
    #[test]
    fn compile_reports_every_violation() {
        let mut g = StateGraph::new(schema());
        g.add_fn_node("a", noop)
            .add_fn_node("a", noop)
            .add_fn_node("orphan", noop)
            .add_fn_node(END, noop)
            .add_edge("a", "missing")
            .add_edge("ghost", "a")
            .add_edge("orphan", START)
            .add_conditional_edges("a", |_| "x".to_string(), [("x", END)]);
        let err = g.compile().unwrap_err();
        let v = &err.violations;
        assert!(v.contains(&ConfigViolation::DuplicateNode("a".into())), "{}", err);
        assert!(v.contains(&ConfigViolation::ReservedNodeName(END.into())), "{}", err);
        assert!(v.contains(&ConfigViolation::MissingEntry), "{}", err);
        assert!(v.contains(&ConfigViolation::MixedEdges("a".into())), "{}", err);
        assert!(v.contains(&ConfigViolation::EdgeIntoStart("orphan".into())), "{}", err);
        assert!(v.contains(&ConfigViolation::Unreachable("orphan".into())), "{}", err);
        assert!(v.contains(&ConfigViolation::NodeNotFound {
            node: "missing".into(),
            edge: "edge a -> missing".into(),
        }));
        assert!(v.contains(&ConfigViolation::NodeNotFound {
            node: "ghost".into(),
            edge: "edge ghost -> a".into(),
        }));
    }

    /// **Scenario**: A router target naming an undeclared node is a compile error.
    #[test]
    fn compile_rejects_dangling_route_target() {
        let mut g = StateGraph::new(schema());
        g.add_fn_node("decide", noop)
            .add_edge(START, "decide")
            .add_conditional_edges("decide", |_| "l".to_string(), [("l", "left")]);
        let err = g.compile().unwrap_err();
        assert!(err.contains(&ConfigViolation::NodeNotFound {
            node: "left".into(),
            edge: "conditional edges from decide (route \"l\")".into(),
        }));
    }

    /// **Scenario**: A node without an outgoing edge and an empty route map are reported.
    #[test]
    fn compile_rejects_dead_end_and_empty_map() {
        let mut g = StateGraph::new(schema());
        g.add_fn_node("a", noop)
            .add_fn_node("b", noop)
            .add_edge(START, "a")
            .add_conditional_edges("a", |_| "b".to_string(), Vec::<(String, String)>::new());
        let err = g.compile().unwrap_err();
        assert!(err.contains(&ConfigViolation::EmptyRouteMap("a".into())), "{}", err);
        assert!(err.contains(&ConfigViolation::DeadEnd("b".into())), "{}", err);
        assert!(err.contains(&ConfigViolation::Unreachable("b".into())), "{}", err);
    }

    /// **Scenario**: Two plain edges from one node is fan-out, which is rejected.
    #[test]
    fn compile_rejects_fan_out() {
        let mut g = StateGraph::new(schema());
        g.add_fn_node("a", noop)
            .add_fn_node("b", noop)
            .add_edge(START, "a")
            .add_edge("a", "b")
            .add_edge("a", END)
            .add_edge("b", END);
        let err = g.compile().unwrap_err();
        assert_eq!(err.violations, vec![ConfigViolation::MultipleOutgoing("a".into())]);
    }

    /// **Scenario**: Edges out of END are rejected.
    #[test]
    fn compile_rejects_edge_from_end() {
        let mut g = StateGraph::new(schema());
        g.add_fn_node("a", noop)
            .add_edge(START, "a")
            .add_edge("a", END)
            .add_edge(END, "a");
        let err = g.compile().unwrap_err();
        assert_eq!(err.violations, vec![ConfigViolation::EdgeFromEnd("a".into())]);
    }

    /// **Scenario**: add_subgraph records the fields shared by both schemas.
    #[test]
    fn add_subgraph_computes_shared_fields() {
        let mut child = StateGraph::new(StateSchema::new().optional("foo").optional("baz"));
        child.add_fn_node("c", noop).add_edge(START, "c").add_edge("c", END);
        let child = Arc::new(child.compile().unwrap());

        let mut parent = StateGraph::new(StateSchema::new().optional("foo").optional("bar"));
        parent.add_subgraph("sub", child);
        match &parent.nodes[0].1 {
            NodeEntry::Subgraph(sub) => assert_eq!(sub.shared, vec!["foo".to_string()]),
            NodeEntry::Function(_) => panic!("expected sub-graph entry"),
        }
    }
}
