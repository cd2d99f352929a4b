//! # Memory: Checkpointing
//!
//! ## Overview
//!
//! A **Checkpointer** stores the latest snapshot of each thread: the merged state,
//! the node path execution continues from, and the pending interrupt (with the live
//! state of any suspended sub-graphs). It is what lets a suspended run resume after
//! the process restarts.
//!
//! Only the newest snapshot per thread is kept. Nothing is expired automatically;
//! use `CompiledStateGraph::clear_thread` (or `Checkpointer::delete_thread`).
//!
//! ## Config
//!
//! [`RunnableConfig`] is passed to `CompiledStateGraph::invoke`. When using a
//! checkpointer, `thread_id` is required and identifies the thread.
//!
//! ## Checkpointer Implementations
//!
//! | Type             | Persistence | Use case                    | Feature  |
//! |------------------|-------------|-----------------------------|----------|
//! | [`MemorySaver`]  | In-memory   | Dev, tests                  | -        |
//! | [`SqliteSaver`]  | SQLite file | Single process, restarts    | `sqlite` |
//!
//! Use with [`StateGraph::compile_with_checkpointer`](crate::graph::StateGraph::compile_with_checkpointer).
//! [`JsonSerializer`] is the default payload format of `SqliteSaver`.

mod checkpoint;
mod checkpointer;
mod config;
mod memory_saver;
mod serializer;

#[cfg(feature = "sqlite")]
mod sqlite_saver;

pub use checkpoint::{Checkpoint, CheckpointMetadata, CheckpointSource, PendingInterrupt};
pub use checkpointer::{CheckpointError, Checkpointer};
pub use config::RunnableConfig;
pub use memory_saver::MemorySaver;
pub use serializer::{JsonSerializer, Serializer};

#[cfg(feature = "sqlite")]
pub use sqlite_saver::SqliteSaver;

pub(crate) use checkpointer::thread_id_required;
