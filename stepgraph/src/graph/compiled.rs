//! Compiled state graph: immutable, supports invoke, stream and get_state.
//!
//! Built by `StateGraph::compile` or `compile_with_checkpointer`. With a
//! checkpointer, every call is bound to `config.thread_id`: the thread's
//! checkpoint is written before the first node, after every completed node (inside
//! sub-graphs too) and on suspension, so a failed or interrupted run continues from
//! the last completed node.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::AgentError;
use crate::memory::{thread_id_required, CheckpointSource, Checkpointer, PendingInterrupt, RunnableConfig};
use crate::state::{StateRecord, StateSchema};
use crate::stream::{StreamEvent, StreamOptions};

use super::conditional::NextEntry;
use super::logging::{log_graph_complete, log_graph_error, log_graph_start, log_resume};
use super::node::NodeEntry;
use super::run_loop::{position_of, EventSink, ExecContext, Frame, Persist, Resumption, RunStep};
use super::snapshot::{Input, InvokeOutcome, StateSnapshot};
use super::RunContext;
use super::state_graph::START;

/// Compiled graph: immutable structure, cheap to clone.
///
/// Can be embedded in other graphs via `StateGraph::add_subgraph` or invoked
/// programmatically from inside a node (ephemeral run, `invoke_from_node(state, ctx)`).
#[derive(Clone)]
pub struct CompiledStateGraph {
    pub(crate) schema: Arc<StateSchema>,
    pub(crate) nodes: Arc<HashMap<String, NodeEntry>>,
    pub(crate) node_order: Arc<Vec<String>>,
    pub(crate) next: Arc<HashMap<String, NextEntry>>,
    pub(crate) checkpointer: Option<Arc<dyn Checkpointer>>,
}

impl std::fmt::Debug for CompiledStateGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledStateGraph")
            .field("nodes", &self.node_order)
            .field("checkpointer", &self.checkpointer.is_some())
            .finish()
    }
}

impl CompiledStateGraph {
    pub fn schema(&self) -> &StateSchema {
        &self.schema
    }

    /// Node names in registration order.
    pub fn node_names(&self) -> Vec<&str> {
        self.node_order.iter().map(String::as_str).collect()
    }

    pub fn has_checkpointer(&self) -> bool {
        self.checkpointer.is_some()
    }

    /// First node to run for `state` (resolves conditional edges from START).
    pub(crate) fn entry(&self, state: &StateRecord) -> Result<String, AgentError> {
        self.resolve_next(START, state)
    }

    pub(crate) fn resolve_next(&self, node: &str, state: &StateRecord) -> Result<String, AgentError> {
        match self.next.get(node) {
            Some(NextEntry::Unconditional(to)) => Ok(to.clone()),
            Some(NextEntry::Conditional(router)) => router.resolve(node, state),
            None => Err(AgentError::ExecutionFailed(format!(
                "no outgoing edge from {}",
                node
            ))),
        }
    }

    /// Runs the graph.
    ///
    /// - `Input::State`: start a run. With a checkpointer the thread must be new.
    /// - `Input::Resume(answer)`: re-enter the suspended node; its pending
    ///   `interrupt(...)` call returns `answer`.
    /// - `Input::Retry`: continue a thread whose last run failed, from the node
    ///   that failed.
    ///
    /// Returns `InvokeOutcome::Interrupted` when a node suspends.
    pub async fn invoke(
        &self,
        input: impl Into<Input>,
        config: Option<RunnableConfig>,
    ) -> Result<InvokeOutcome, AgentError> {
        self.execute(input.into(), config.unwrap_or_default(), None)
            .await
    }

    /// Streams graph execution, emitting events via a channel-backed Stream.
    ///
    /// Events arrive in execution order; an inner sub-graph node's events come
    /// before the event of the sub-graph node that contains it. A failure is
    /// delivered as the last item.
    pub fn stream(
        &self,
        input: impl Into<Input>,
        config: Option<RunnableConfig>,
        options: StreamOptions,
    ) -> ReceiverStream<Result<StreamEvent, AgentError>> {
        let (tx, rx) = mpsc::channel(128);
        let graph = self.clone();
        let input = input.into();

        tokio::spawn(async move {
            let sink = EventSink {
                tx: tx.clone(),
                options,
            };
            if let Err(e) = graph
                .execute(input, config.unwrap_or_default(), Some(&sink))
                .await
            {
                let _ = tx.send(Err(e)).await;
            }
        });

        ReceiverStream::new(rx)
    }

    /// Runs this graph from inside a node body, without a checkpointer.
    ///
    /// Same as `invoke(input, None)`, except that when the calling run is streamed
    /// with sub-graph events, this run's events go to the same stream, namespaced
    /// under the calling node's path. An interrupt inside fails with
    /// `InterruptWithoutCheckpointer`.
    pub async fn invoke_from_node(
        &self,
        input: StateRecord,
        ctx: &RunContext,
    ) -> Result<InvokeOutcome, AgentError> {
        let exec = ExecContext {
            config: ctx.config(),
            sink: ctx.events(),
        };
        let frame = Frame {
            namespace: ctx.path().to_vec(),
            outer_states: Vec::new(),
        };
        self.run_ephemeral(input, frame, &exec).await
    }

    /// Latest snapshot of the thread.
    ///
    /// With `subgraphs`, includes the live state of every sub-graph containing the
    /// suspended node. Once that node completes only the lifted shared fields remain.
    pub async fn get_state(
        &self,
        config: &RunnableConfig,
        subgraphs: bool,
    ) -> Result<StateSnapshot, AgentError> {
        let checkpointer = self
            .checkpointer
            .as_ref()
            .ok_or(AgentError::CheckpointerRequired)?;
        let thread_id = thread_id_required(config)?;
        let checkpoint = checkpointer
            .get_tuple(config)
            .await?
            .ok_or_else(|| AgentError::NotFound(thread_id.to_string()))?;
        Ok(StateSnapshot::from_checkpoint(checkpoint, subgraphs))
    }

    /// Deletes the thread's checkpoint.
    pub async fn clear_thread(&self, config: &RunnableConfig) -> Result<(), AgentError> {
        let checkpointer = self
            .checkpointer
            .as_ref()
            .ok_or(AgentError::CheckpointerRequired)?;
        checkpointer.delete_thread(config).await?;
        Ok(())
    }

    async fn execute(
        &self,
        input: Input,
        config: RunnableConfig,
        sink: Option<&EventSink>,
    ) -> Result<InvokeOutcome, AgentError> {
        log_graph_start(config.thread_id.as_deref(), input.kind());
        let ctx = ExecContext {
            config: &config,
            sink,
        };
        let result = match &self.checkpointer {
            Some(checkpointer) => self.execute_thread(input, checkpointer.as_ref(), &ctx).await,
            None => self.execute_ephemeral(input, &ctx).await,
        };
        match &result {
            Ok(outcome) => log_graph_complete(config.thread_id.as_deref(), outcome.is_interrupted()),
            Err(e) => log_graph_error(e),
        }
        result
    }

    fn initial_state(&self, input: StateRecord) -> Result<StateRecord, AgentError> {
        self.schema
            .initial(input)
            .map_err(|source| AgentError::SchemaViolation {
                node: START.to_string(),
                source,
            })
    }

    async fn execute_ephemeral(
        &self,
        input: Input,
        ctx: &ExecContext<'_>,
    ) -> Result<InvokeOutcome, AgentError> {
        let Input::State(input) = input else {
            return Err(AgentError::CheckpointerRequired);
        };
        self.run_ephemeral(input, Frame::default(), ctx).await
    }

    async fn run_ephemeral(
        &self,
        input: StateRecord,
        frame: Frame,
        ctx: &ExecContext<'_>,
    ) -> Result<InvokeOutcome, AgentError> {
        let state = self.initial_state(input)?;
        let start = self.entry(&state)?;
        match self.run_from(state, start, None, frame, ctx, None).await? {
            RunStep::Done(state) => Ok(InvokeOutcome::Complete(state)),
            RunStep::Suspended(s) => Err(AgentError::InterruptWithoutCheckpointer(s.interrupt.value)),
        }
    }

    async fn execute_thread(
        &self,
        input: Input,
        checkpointer: &dyn Checkpointer,
        ctx: &ExecContext<'_>,
    ) -> Result<InvokeOutcome, AgentError> {
        let config = ctx.config;
        let thread_id = thread_id_required(config)?;
        let existing = checkpointer.get_tuple(config).await?;

        let (state, start, resume, persist) = match (input, existing) {
            (Input::State(input), None) => {
                let state = self.initial_state(input)?;
                let start = self.entry(&state)?;
                let persist = Persist::new(checkpointer, config, thread_id, 0);
                persist
                    .save(
                        state.clone(),
                        position_of(&start),
                        Vec::new(),
                        None,
                        CheckpointSource::Input,
                    )
                    .await?;
                (state, start, None, persist)
            }
            (Input::State(_), Some(checkpoint)) => {
                return Err(if checkpoint.is_complete() {
                    AgentError::NoPendingWork(thread_id.to_string())
                } else {
                    AgentError::ThreadInProgress(thread_id.to_string())
                });
            }
            (Input::Resume(_), None) | (Input::Retry, None) => {
                return Err(AgentError::NotFound(thread_id.to_string()));
            }
            (Input::Resume(answer), Some(checkpoint)) => {
                let (Some(pending), Some(start)) =
                    (checkpoint.pending_interrupt, checkpoint.position.first().cloned())
                else {
                    return Err(AgentError::NoPendingWork(thread_id.to_string()));
                };
                log_resume(thread_id, &checkpoint.position);
                let mut resume_values = pending.resume_values;
                resume_values.push(answer);
                let resume = Resumption {
                    path: checkpoint.position,
                    states: checkpoint.subgraph_states,
                    resume_values,
                };
                let persist = Persist::new(checkpointer, config, thread_id, checkpoint.metadata.step);
                (checkpoint.state, start, Some(resume), persist)
            }
            (Input::Retry, Some(checkpoint)) => {
                let start = match checkpoint.position.first() {
                    Some(start) if !checkpoint.is_suspended() => start.clone(),
                    _ => return Err(AgentError::NoPendingWork(thread_id.to_string())),
                };
                log_resume(thread_id, &checkpoint.position);
                // Failed inside a sub-graph: continue from its last completed node.
                let resume = (checkpoint.position.len() > 1).then(|| Resumption {
                    path: checkpoint.position,
                    states: checkpoint.subgraph_states,
                    resume_values: Vec::new(),
                });
                let persist = Persist::new(checkpointer, config, thread_id, checkpoint.metadata.step);
                (checkpoint.state, start, resume, persist)
            }
        };

        match self
            .run_from(state, start, resume, Frame::default(), ctx, Some(&persist))
            .await?
        {
            RunStep::Done(state) => Ok(InvokeOutcome::Complete(state)),
            RunStep::Suspended(s) => {
                let pending = PendingInterrupt {
                    interrupt: s.interrupt.clone(),
                    resume_values: s.resume_values,
                };
                persist
                    .save(
                        s.state.clone(),
                        s.path.clone(),
                        s.subgraph_states,
                        Some(pending),
                        CheckpointSource::Interrupt,
                    )
                    .await?;
                ctx.interrupted(&s.path, &s.interrupt).await;
                Ok(InvokeOutcome::Interrupted {
                    state: s.state,
                    interrupt: s.interrupt,
                })
            }
        }
    }
}
