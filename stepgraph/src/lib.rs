//! # stepgraph
//!
//! Resumable state graphs: named steps ("nodes") read and update one shared
//! [`StateRecord`], compose into sub-graphs with shared or private fields, pause
//! for external input, and resume from a persisted checkpoint.
//!
//! ## Design Principles
//!
//! - **Declared state**: each graph has a [`StateSchema`]. Nodes return partial
//!   updates; every field goes through its [`Reducer`] and undeclared fields are
//!   rejected.
//! - **Sub-graphs**: a compiled graph embedded with `add_subgraph` sees only the
//!   fields both schemas declare; its private fields start from its own defaults
//!   and never leak into the parent.
//! - **Interrupts**: a node calls [`RunContext::interrupt`]; the run is checkpointed
//!   and returned as [`InvokeOutcome::Interrupted`]. [`Input::Resume`] re-runs the
//!   node from the top and the same call returns the answer. Side effects before
//!   an interrupt must be idempotent.
//! - **One checkpoint per thread**: the latest state, node path and pending
//!   interrupt, written after every node, so a failed run can be retried.
//! - **Strictly sequential**: one node at a time; no parallel branches.
//!
//! ## Main Modules
//!
//! - [`graph`]: `StateGraph`, `CompiledStateGraph`, `Node`, `RunContext`, interrupts.
//! - [`state`]: `StateRecord`, `StateSchema`, reducers.
//! - [`memory`]: `Checkpointer`, `MemorySaver`, optional `SqliteSaver`.
//! - [`stream`]: stream modes and events.
//! - [`llm`]: `TextGenerator`, `MockLlm`, optional `ChatOpenAI`.
//!
//! ## Features
//!
//! - `sqlite` (default): persistent checkpointer.
//! - `openai`: `ChatOpenAI` text generator via `async-openai`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stepgraph::{Input, MemorySaver, RunnableConfig, StateGraph, StateRecord, StateSchema, END, START};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut graph = StateGraph::new(StateSchema::new().optional("name").optional("greeting"));
//! graph
//!     .add_fn_node("ask", |_, ctx| {
//!         let name = ctx.interrupt("What is your name?")?;
//!         Ok(StateRecord::new().with("name", name))
//!     })
//!     .add_fn_node("greet", |s, _| {
//!         let greeting = format!("Hello, {}!", s.get_str("name").unwrap_or("stranger"));
//!         Ok(StateRecord::new().with("greeting", greeting))
//!     })
//!     .add_edge(START, "ask")
//!     .add_edge("ask", "greet")
//!     .add_edge("greet", END);
//! let app = graph.compile_with_checkpointer(Arc::new(MemorySaver::new()))?;
//!
//! let config = RunnableConfig::for_thread("t1");
//! let paused = app.invoke(StateRecord::new(), Some(config.clone())).await?;
//! assert!(paused.is_interrupted());
//! let done = app.invoke(Input::resume("Ada"), Some(config)).await?;
//! assert_eq!(done.state().get_str("greeting"), Some("Hello, Ada!"));
//! # Ok(())
//! # }
//! ```
//!
//! Runnable scenarios live in `stepgraph-examples`, e.g.
//! `cargo run -p stepgraph-examples --example cctv_approval`.

pub mod error;
pub mod graph;
pub mod llm;
pub mod memory;
pub mod state;
pub mod stream;

pub use error::AgentError;
pub use graph::{
    CompiledStateGraph, ConfigViolation, FnNode, GraphConfigError, GraphInterrupt, Input,
    Interrupt, InvokeOutcome, Node, RunContext, StateGraph, StateSnapshot, SubgraphState, END,
    START,
};
pub use llm::{MockLlm, TextGenerator};
#[cfg(feature = "openai")]
pub use llm::ChatOpenAI;
pub use memory::{
    Checkpoint, CheckpointError, CheckpointMetadata, CheckpointSource, Checkpointer,
    JsonSerializer, MemorySaver, PendingInterrupt, RunnableConfig, Serializer,
};
#[cfg(feature = "sqlite")]
pub use memory::SqliteSaver;
pub use state::{FieldSpec, Reducer, SchemaViolation, StateRecord, StateSchema};
pub use stream::{StreamEvent, StreamMode, StreamOptions};
