//! Mermaid flowchart rendering of a compiled graph.

use std::fmt::Write;

use super::compiled::CompiledStateGraph;
use super::conditional::NextEntry;
use super::node::NodeEntry;
use super::state_graph::{END, START};

impl CompiledStateGraph {
    /// Renders the graph as a Mermaid `graph TD` flowchart.
    ///
    /// Conditional edges are dotted and labelled with their route key. Sub-graph
    /// nodes are expanded into nested `subgraph` blocks whose node ids are prefixed
    /// with the sub-graph node's name.
    pub fn draw_mermaid(&self) -> String {
        let mut out = String::from("graph TD;\n");
        self.write_mermaid(&mut out, "", 1);
        out
    }

    fn write_mermaid(&self, out: &mut String, prefix: &str, depth: usize) {
        let indent = "\t".repeat(depth);
        let id = |name: &str| format!("{}{}", prefix, name);

        let _ = writeln!(out, "{}{}([{}]):::first", indent, id(START), START);
        for name in self.node_order.iter() {
            match self.nodes.get(name) {
                Some(NodeEntry::Subgraph(sub)) => {
                    let _ = writeln!(out, "{}subgraph {}", indent, id(name));
                    sub.graph
                        .write_mermaid(out, &format!("{}{}_", prefix, name), depth + 1);
                    let _ = writeln!(out, "{}end", indent);
                }
                Some(NodeEntry::Function(_)) | None => {
                    let _ = writeln!(out, "{}{}({})", indent, id(name), name);
                }
            }
        }
        let _ = writeln!(out, "{}{}([{}]):::last", indent, id(END), END);

        let mut sources = vec![START.to_string()];
        sources.extend(self.node_order.iter().cloned());
        for source in &sources {
            match self.next.get(source) {
                Some(NextEntry::Unconditional(to)) => {
                    let _ = writeln!(out, "{}{} --> {};", indent, id(source), id(to));
                }
                Some(NextEntry::Conditional(router)) => {
                    for (key, to) in router.targets() {
                        let _ = writeln!(
                            out,
                            "{}{} -.->|{}| {};",
                            indent,
                            id(source),
                            key,
                            id(to)
                        );
                    }
                }
                None => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::graph::{StateGraph, END, START};
    use crate::state::{StateRecord, StateSchema};

    /// **Scenario**: Plain and conditional edges are rendered; sub-graphs become nested blocks.
    #[test]
    fn draw_mermaid_renders_edges_and_subgraphs() {
        let mut child = StateGraph::new(StateSchema::new().optional("foo"));
        child
            .add_fn_node("inner", |_, _| Ok(StateRecord::new()))
            .add_edge(START, "inner")
            .add_edge("inner", END);
        let child = Arc::new(child.compile().unwrap());

        let mut parent = StateGraph::new(StateSchema::new().optional("foo"));
        parent
            .add_fn_node("decide", |_, _| Ok(StateRecord::new()))
            .add_subgraph("sub", child)
            .add_edge(START, "decide")
            .add_conditional_edges("decide", |_| "go".to_string(), [("go", "sub"), ("stop", END)])
            .add_edge("sub", END);
        let mermaid = parent.compile().unwrap().draw_mermaid();

        assert!(mermaid.starts_with("graph TD;\n"), "{}", mermaid);
        assert!(mermaid.contains("__start__ --> decide;"), "{}", mermaid);
        assert!(mermaid.contains("decide -.->|go| sub;"), "{}", mermaid);
        assert!(mermaid.contains("decide -.->|stop| __end__;"), "{}", mermaid);
        assert!(mermaid.contains("subgraph sub"), "{}", mermaid);
        assert!(mermaid.contains("sub___start__ --> sub_inner;"), "{}", mermaid);
        assert!(mermaid.contains("sub --> __end__;"), "{}", mermaid);
    }
}
