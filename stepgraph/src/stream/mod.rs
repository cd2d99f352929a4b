//! Streaming types for graph runs.
//!
//! Defines stream modes, options and events. Used by `CompiledStateGraph::stream`.
//! Every event carries the namespace it came from: the node path of the sub-graph
//! that produced it, empty for the top-level graph.

use std::collections::HashSet;

use crate::graph::Interrupt;
use crate::state::StateRecord;

/// Stream mode selector: which kinds of events to emit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamMode {
    /// Emit full state after each node completes.
    Values,
    /// Emit the partial update a node returned, with its name.
    Updates,
}

/// What a `stream` call emits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamOptions {
    pub modes: HashSet<StreamMode>,
    /// Also emit events of nodes inside embedded sub-graphs.
    pub subgraphs: bool,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self::updates()
    }
}

impl StreamOptions {
    pub fn new(modes: impl IntoIterator<Item = StreamMode>) -> Self {
        Self {
            modes: modes.into_iter().collect(),
            subgraphs: false,
        }
    }

    /// Updates only.
    pub fn updates() -> Self {
        Self::new([StreamMode::Updates])
    }

    /// Full state only.
    pub fn values() -> Self {
        Self::new([StreamMode::Values])
    }

    pub fn with_subgraphs(mut self, subgraphs: bool) -> Self {
        self.subgraphs = subgraphs;
        self
    }

    pub(crate) fn wants(&self, mode: StreamMode) -> bool {
        self.modes.contains(&mode)
    }
}

/// Streamed event emitted while running a graph.
#[derive(Clone, Debug, PartialEq)]
pub enum StreamEvent {
    /// Full state of the graph at `namespace` after a node finished.
    Values {
        namespace: Vec<String>,
        state: StateRecord,
    },
    /// Partial update returned by `node` (for a sub-graph node: the lifted fields).
    Updates {
        namespace: Vec<String>,
        node: String,
        update: StateRecord,
    },
    /// The run suspended; `namespace` is the full path of the suspended node.
    Interrupt {
        namespace: Vec<String>,
        interrupt: Interrupt,
    },
}

impl StreamEvent {
    pub fn namespace(&self) -> &[String] {
        match self {
            StreamEvent::Values { namespace, .. }
            | StreamEvent::Updates { namespace, .. }
            | StreamEvent::Interrupt { namespace, .. } => namespace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Default options stream updates of the top-level graph only.
    #[test]
    fn default_options_updates_only() {
        let opts = StreamOptions::default();
        assert!(opts.wants(StreamMode::Updates));
        assert!(!opts.wants(StreamMode::Values));
        assert!(!opts.subgraphs);
    }

    /// **Scenario**: Options can combine modes and enable sub-graph events.
    #[test]
    fn combined_modes_with_subgraphs() {
        let opts = StreamOptions::new([StreamMode::Values, StreamMode::Updates]).with_subgraphs(true);
        assert!(opts.wants(StreamMode::Values));
        assert!(opts.wants(StreamMode::Updates));
        assert!(opts.subgraphs);
    }

    /// **Scenario**: StreamEvent variants carry expected data and namespace.
    #[test]
    fn stream_event_variants_hold_data() {
        let updates = StreamEvent::Updates {
            namespace: vec!["sub".into()],
            node: "n1".into(),
            update: StateRecord::new().with("x", 2),
        };
        assert_eq!(updates.namespace(), &["sub".to_string()]);
        match updates {
            StreamEvent::Updates { node, update, .. } => {
                assert_eq!(node, "n1");
                assert_eq!(update.get_i64("x"), Some(2));
            }
            _ => panic!("expected Updates variant"),
        }

        let interrupt = StreamEvent::Interrupt {
            namespace: vec!["ask".into()],
            interrupt: Interrupt::new(serde_json::json!("q")),
        };
        match interrupt {
            StreamEvent::Interrupt { interrupt, .. } => assert_eq!(interrupt.value, "q"),
            _ => panic!("expected Interrupt variant"),
        }
    }
}
