//! Step machine shared by `invoke` and `stream`.
//!
//! One call of [`CompiledStateGraph::run_from`] drives one graph level: run the
//! current node, merge its update, resolve the next node, checkpoint, emit events,
//! repeat until END. Sub-graph nodes recurse one level down; every level
//! checkpoints the whole thread (top-level state, node path, the state of each
//! enclosing sub-graph) after each of its nodes completes. A suspension anywhere
//! below unwinds back up as [`RunStep::Suspended`], each level prepending its node
//! name and live state so the full path can be checkpointed.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::AgentError;
use crate::memory::{Checkpoint, CheckpointSource, Checkpointer, PendingInterrupt, RunnableConfig};
use crate::state::StateRecord;
use crate::stream::{StreamEvent, StreamMode, StreamOptions};

use super::compiled::CompiledStateGraph;
use super::interrupt::{GraphInterrupt, Interrupt};
use super::logging::{
    log_checkpoint, log_interrupt, log_node_complete, log_node_error, log_node_start,
    log_state_update,
};
use super::node::NodeEntry;
use super::state_graph::END;
use super::RunContext;

pub(crate) type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Where to continue inside a suspended node, or inside a sub-graph whose run failed.
///
/// `path` starts at the node of the current graph level; `states` holds the live
/// state of each sub-graph below it (one fewer than `path`).
pub(crate) struct Resumption {
    pub path: Vec<String>,
    pub states: Vec<StateRecord>,
    pub resume_values: Vec<Value>,
}

impl Resumption {
    /// Splits off the frame of the sub-graph at the head of the path.
    fn descend(mut self) -> Result<(StateRecord, String, Resumption), AgentError> {
        if self.path.len() < 2 || self.states.is_empty() {
            return Err(position_mismatch(&self.path));
        }
        self.path.remove(0);
        let state = self.states.remove(0);
        let start = self.path[0].clone();
        Ok((state, start, self))
    }
}

fn position_mismatch(path: &[String]) -> AgentError {
    AgentError::ExecutionFailed(format!(
        "checkpoint position {:?} does not match the graph",
        path
    ))
}

/// A node suspended somewhere at or below this graph level.
pub(crate) struct Suspension {
    /// This level's state at suspension.
    pub state: StateRecord,
    pub path: Vec<String>,
    pub subgraph_states: Vec<StateRecord>,
    pub interrupt: Interrupt,
    pub resume_values: Vec<Value>,
}

pub(crate) enum RunStep {
    Done(StateRecord),
    Suspended(Suspension),
}

/// Event channel of a `stream` call.
#[derive(Clone)]
pub(crate) struct EventSink {
    pub tx: mpsc::Sender<Result<StreamEvent, AgentError>>,
    pub options: StreamOptions,
}

impl EventSink {
    async fn send(&self, event: StreamEvent) {
        let _ = self.tx.send(Ok(event)).await;
    }
}

/// Position of one graph level inside the top-level run.
#[derive(Debug, Clone, Default)]
pub(crate) struct Frame {
    /// Node path of this graph inside the top-level graph.
    pub namespace: Vec<String>,
    /// State of every enclosing graph level, outermost first.
    pub outer_states: Vec<StateRecord>,
}

impl Frame {
    fn child(&self, node: &str, state: &StateRecord) -> Frame {
        let mut namespace = self.namespace.clone();
        namespace.push(node.to_string());
        let mut outer_states = self.outer_states.clone();
        outer_states.push(state.clone());
        Frame {
            namespace,
            outer_states,
        }
    }

    /// Top-level state, node path and sub-graph states of a checkpoint taken at
    /// this level with `state` about to run `next`.
    fn checkpoint_parts(
        &self,
        state: &StateRecord,
        next: &str,
    ) -> (StateRecord, Vec<String>, Vec<StateRecord>) {
        match self.outer_states.split_first() {
            None => (state.clone(), position_of(next), Vec::new()),
            Some((top, rest)) => {
                let mut position = self.namespace.clone();
                position.push(next.to_string());
                let mut subgraph_states = rest.to_vec();
                subgraph_states.push(state.clone());
                (top.clone(), position, subgraph_states)
            }
        }
    }
}

/// Per-invocation context shared by every level of the run.
pub(crate) struct ExecContext<'a> {
    pub config: &'a RunnableConfig,
    pub sink: Option<&'a EventSink>,
}

impl ExecContext<'_> {
    async fn node_finished(
        &self,
        namespace: &[String],
        node: &str,
        update: &StateRecord,
        state: &StateRecord,
    ) {
        let Some(sink) = self.sink else { return };
        if !namespace.is_empty() && !sink.options.subgraphs {
            return;
        }
        if sink.options.wants(StreamMode::Updates) {
            sink.send(StreamEvent::Updates {
                namespace: namespace.to_vec(),
                node: node.to_string(),
                update: update.clone(),
            })
            .await;
        }
        if sink.options.wants(StreamMode::Values) {
            sink.send(StreamEvent::Values {
                namespace: namespace.to_vec(),
                state: state.clone(),
            })
            .await;
        }
    }

    pub(crate) async fn interrupted(&self, path: &[String], interrupt: &Interrupt) {
        if let Some(sink) = self.sink {
            sink.send(StreamEvent::Interrupt {
                namespace: path.to_vec(),
                interrupt: interrupt.clone(),
            })
            .await;
        }
    }
}

/// Checkpoint writer of the top-level graph.
pub(crate) struct Persist<'a> {
    pub checkpointer: &'a dyn Checkpointer,
    pub config: &'a RunnableConfig,
    pub thread_id: &'a str,
    step: AtomicU64,
}

impl<'a> Persist<'a> {
    pub fn new(
        checkpointer: &'a dyn Checkpointer,
        config: &'a RunnableConfig,
        thread_id: &'a str,
        step: u64,
    ) -> Self {
        Self {
            checkpointer,
            config,
            thread_id,
            step: AtomicU64::new(step),
        }
    }

    /// Writes the thread's latest checkpoint. `Loop` checkpoints of top-level
    /// transitions advance the step; those taken inside a sub-graph do not.
    pub async fn save(
        &self,
        state: StateRecord,
        position: Vec<String>,
        subgraph_states: Vec<StateRecord>,
        pending: Option<PendingInterrupt>,
        source: CheckpointSource,
    ) -> Result<(), AgentError> {
        let step = match source {
            CheckpointSource::Loop if position.len() <= 1 => {
                self.step.fetch_add(1, Ordering::SeqCst) + 1
            }
            _ => self.step.load(Ordering::SeqCst),
        };
        let checkpoint = Checkpoint::new(state, position, pending, source, step)
            .with_subgraph_states(subgraph_states);
        self.checkpointer.put(self.config, &checkpoint).await?;
        log_checkpoint(self.thread_id, step, source);
        Ok(())
    }
}

impl CompiledStateGraph {
    /// Runs this graph level from `current` until END or a suspension.
    ///
    /// `persist` is set when the run belongs to a thread; it is shared by all levels.
    pub(crate) fn run_from<'a>(
        &'a self,
        mut state: StateRecord,
        mut current: String,
        mut resume: Option<Resumption>,
        frame: Frame,
        ctx: &'a ExecContext<'a>,
        persist: Option<&'a Persist<'a>>,
    ) -> BoxFuture<'a, Result<RunStep, AgentError>> {
        Box::pin(async move {
            let namespace = &frame.namespace;
            while current != END {
                let entry = self
                    .nodes
                    .get(&current)
                    .ok_or_else(|| position_mismatch(&[current.clone()]))?;
                let mut node_path = namespace.clone();
                node_path.push(current.clone());
                log_node_start(&node_path);

                let (update, from_subgraph) = match entry {
                    NodeEntry::Function(node) => {
                        let resume_values = match resume.take() {
                            Some(r) if r.path.len() == 1 => r.resume_values,
                            Some(r) => return Err(position_mismatch(&r.path)),
                            None => Vec::new(),
                        };
                        let run_ctx = RunContext::new(
                            ctx.config.clone(),
                            node_path.clone(),
                            resume_values.clone(),
                        )
                        .with_events(ctx.sink.cloned());
                        match node.run(state.clone(), &run_ctx).await {
                            Ok(update) => (update, false),
                            Err(AgentError::Interrupted(GraphInterrupt(interrupt))) => {
                                log_interrupt(&node_path, &interrupt);
                                return Ok(RunStep::Suspended(Suspension {
                                    state,
                                    path: vec![current],
                                    subgraph_states: Vec::new(),
                                    interrupt,
                                    resume_values,
                                }));
                            }
                            Err(e) => {
                                log_node_error(&node_path, &e);
                                return Err(e);
                            }
                        }
                    }
                    NodeEntry::Subgraph(sub) => {
                        let (child_state, child_start, child_resume) = match resume.take() {
                            Some(r) => {
                                let (s, start, rest) = r.descend()?;
                                (s, start, Some(rest))
                            }
                            None => {
                                let input = state.project(&sub.shared, sub.graph.schema());
                                let start = sub.graph.entry(&input)?;
                                (input, start, None)
                            }
                        };
                        let step = sub
                            .graph
                            .run_from(
                                child_state,
                                child_start,
                                child_resume,
                                frame.child(&current, &state),
                                ctx,
                                persist,
                            )
                            .await;
                        match step {
                            Ok(RunStep::Done(child_final)) => {
                                (StateRecord::lift(&child_final, &sub.shared), true)
                            }
                            Ok(RunStep::Suspended(inner)) => {
                                let mut path = vec![current];
                                path.extend(inner.path);
                                let mut subgraph_states = vec![inner.state];
                                subgraph_states.extend(inner.subgraph_states);
                                return Ok(RunStep::Suspended(Suspension {
                                    state,
                                    path,
                                    subgraph_states,
                                    interrupt: inner.interrupt,
                                    resume_values: inner.resume_values,
                                }));
                            }
                            Err(e) => {
                                log_node_error(&node_path, &e);
                                return Err(e);
                            }
                        }
                    }
                };

                let merged = if from_subgraph {
                    state.merge_replacing(&self.schema, update.clone())
                } else {
                    state.merge(&self.schema, update.clone())
                }
                .map_err(|source| AgentError::SchemaViolation {
                    node: current.clone(),
                    source,
                })?;
                log_state_update(&node_path, &update.keys().collect::<Vec<_>>());
                let next = self.resolve_next(&current, &merged)?;
                log_node_complete(&node_path, &next);
                state = merged;

                if let Some(persist) = persist {
                    let (top, position, subgraph_states) = frame.checkpoint_parts(&state, &next);
                    persist
                        .save(top, position, subgraph_states, None, CheckpointSource::Loop)
                        .await?;
                }
                ctx.node_finished(namespace, &current, &update, &state)
                    .await;
                current = next;
            }
            Ok(RunStep::Done(state))
        })
    }
}

/// Top-level checkpoint position for the node about to run.
pub(crate) fn position_of(next: &str) -> Vec<String> {
    if next == END {
        Vec::new()
    } else {
        vec![next.to_string()]
    }
}
