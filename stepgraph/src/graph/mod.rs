//! State graph: nodes, edges and conditional edges over a declared schema;
//! compile, then invoke / stream / get_state.
//!
//! Nodes are either function nodes ([`Node`], [`FnNode`]) or compiled graphs
//! embedded with [`StateGraph::add_subgraph`]. A node may pause the run with
//! [`RunContext::interrupt`]; with a checkpointer the suspension is persisted and
//! the caller resumes it with [`Input::Resume`].

mod compile_error;
mod compiled;
mod conditional;
mod interrupt;
mod logging;
mod mermaid;
mod node;
mod run_context;
mod run_loop;
mod snapshot;
mod state_graph;

pub use compile_error::{ConfigViolation, GraphConfigError};
pub use compiled::CompiledStateGraph;
pub use conditional::{ConditionalRouter, RouterFn};
pub use interrupt::{GraphInterrupt, Interrupt};
pub use node::{FnNode, Node};
pub use run_context::RunContext;
pub use snapshot::{Input, InvokeOutcome, StateSnapshot, SubgraphState};
pub use state_graph::{StateGraph, END, START};
