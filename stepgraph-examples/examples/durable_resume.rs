//! Durable resume: a run suspends inside a sub-graph, the graph and its SQLite
//! checkpointer are dropped (as on a process restart), then a freshly built graph
//! over the same database file resumes the thread.
//!
//! Run: `cargo run -p stepgraph-examples --example durable_resume -- --answer approved`
//!
//! With `--step start` or `--step resume` each half runs on its own, so the two
//! halves can be separate processes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use serde_json::json;
use stepgraph::{
    AgentError, CompiledStateGraph, Input, InvokeOutcome, RunnableConfig, SqliteSaver,
    StateGraph, StateRecord, StateSchema, END, START,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Step {
    Start,
    Resume,
    Both,
}

#[derive(Parser, Debug)]
#[command(name = "durable_resume")]
#[command(about = "Suspend a thread, restart, and resume it from SQLite")]
struct Args {
    /// SQLite file holding the checkpoints.
    #[arg(long, default_value = "stepgraph-durable.db")]
    db: PathBuf,

    #[arg(long, default_value = "order-1001")]
    thread: String,

    /// Answer given to the pending approval.
    #[arg(long, default_value = "approved")]
    answer: String,

    #[arg(long, value_enum, default_value_t = Step::Both)]
    step: Step,
}

/// Built the same way by both halves; nothing but the database is shared.
fn build(db: &Path) -> Result<CompiledStateGraph, Box<dyn std::error::Error>> {
    let mut review = StateGraph::new(
        StateSchema::new()
            .optional("order")
            .optional("status")
            .optional("risk"),
    );
    review
        .add_fn_node("score", |s, _| {
            let amount = s.get("order").and_then(|o| o.get("amount")).and_then(|a| a.as_i64());
            let risk = if amount.unwrap_or(0) > 500 { "high" } else { "low" };
            Ok(StateRecord::new().with("risk", risk))
        })
        .add_fn_node("approve", |s, ctx| {
            let decision = ctx.interrupt(json!({
                "question": "approve this order?",
                "order": s.get("order"),
                "risk": s.get_str("risk"),
            }))?;
            Ok(StateRecord::new().with("status", decision))
        })
        .add_edge(START, "score")
        .add_edge("score", "approve")
        .add_edge("approve", END);

    let mut graph = StateGraph::new(StateSchema::new().field("order").optional("status"));
    graph
        .add_fn_node("receive", |_, _| Ok(StateRecord::new().with("status", "received")))
        .add_subgraph("review", Arc::new(review.compile()?))
        .add_fn_node("ship", |s, _| {
            let status = match s.get_str("status") {
                Some("approved") => "shipped",
                _ => "cancelled",
            };
            Ok(StateRecord::new().with("status", status))
        })
        .add_edge(START, "receive")
        .add_edge("receive", "review")
        .add_edge("review", "ship")
        .add_edge("ship", END);
    Ok(graph.compile_with_checkpointer(Arc::new(SqliteSaver::new(db)?))?)
}

async fn start(args: &Args, config: &RunnableConfig) -> Result<(), Box<dyn std::error::Error>> {
    let app = build(&args.db)?;
    let input = StateRecord::new().with("order", json!({"id": 1001, "amount": 900}));
    match app.invoke(input, Some(config.clone())).await {
        Ok(InvokeOutcome::Interrupted { interrupt, .. }) => {
            println!("suspended ({:?}): {}", interrupt.id, interrupt.value)
        }
        Ok(InvokeOutcome::Complete(state)) => println!("completed: {}", state.into_json()),
        Err(AgentError::ThreadInProgress(id)) => println!("thread {} is already waiting", id),
        Err(AgentError::NoPendingWork(id)) => {
            println!("thread {} already finished; pick another --thread", id)
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

async fn resume(args: &Args, config: &RunnableConfig) -> Result<(), Box<dyn std::error::Error>> {
    let app = build(&args.db)?;
    let snapshot = app.get_state(config, true).await?;
    println!("restored position: {}", snapshot.position.join(" / "));
    if let Some(sub) = snapshot.innermost_subgraph() {
        println!("sub-graph {} state: {}", sub.namespace.join("/"), sub.values.clone().into_json());
    }
    let done = app
        .invoke(Input::resume(args.answer.as_str()), Some(config.clone()))
        .await?;
    println!("final: {}", done.into_state().into_json());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    stepgraph_examples::init();
    let args = Args::parse();
    let config = RunnableConfig::for_thread(args.thread.clone());

    if args.step != Step::Resume {
        start(&args, &config).await?;
    }
    if args.step != Step::Start {
        resume(&args, &config).await?;
    }
    Ok(())
}
