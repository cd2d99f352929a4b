//! Shared state threaded through a graph run.
//!
//! A [`StateRecord`] is a field-name -> JSON value map. A [`StateSchema`] declares
//! which fields exist, which are required, their defaults and the [`Reducer`] used
//! when a node update touches them. Nodes never mutate the record directly: they
//! return a partial record and the executor calls [`StateRecord::merge`].
//!
//! Sub-graph scoping uses [`StateRecord::project`] on the way in and
//! [`StateRecord::lift`] on the way out; only fields declared by both schemas cross
//! the boundary.

mod record;
mod schema;

pub use record::StateRecord;
pub use schema::{FieldSpec, Reducer, ReducerFn, SchemaViolation, StateSchema};
