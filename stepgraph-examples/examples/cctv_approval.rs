//! CCTV monitoring workflow combining the three sub-graph patterns:
//!
//! - `vlm_detection`: sub-graph added as a node, sharing detection fields and
//!   keeping its confidence score private.
//! - `llm_analysis`: node that invokes a separate analysis graph and maps fields.
//! - `human_approval`: high-threat frames wait for an operator decision.
//!
//! Run: `cargo run -p stepgraph-examples --example cctv_approval`
//! (`--features openai` writes the analysis with a real model).

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use stepgraph::{
    AgentError, CompiledStateGraph, Input, MemorySaver, Node, RunContext, RunnableConfig,
    StateGraph, StateRecord, StateSchema, StreamEvent, StreamOptions, TextGenerator, END, START,
};
use tokio_stream::StreamExt;

const MANUALS: &[(&str, &str)] = &[
    ("fallen_person", "1) announce 2) call ambulance 3) dispatch guard"),
    ("violence", "1) dispatch guard 2) call police 3) keep recording"),
    ("fire", "1) fire alarm 2) call fire service 3) guide evacuation"),
];

fn vlm_detection() -> Result<CompiledStateGraph, AgentError> {
    let mut graph = StateGraph::new(
        StateSchema::new()
            .field("frame_id")
            .with_default("detected_objects", json!([]))
            .with_default("threat_level", "low")
            .optional("raw_confidence"),
    );
    graph
        .add_fn_node("vlm_detect", |s, _| {
            tracing::info!(frame = s.get_str("frame_id"), "detecting objects");
            Ok(StateRecord::new()
                .with("detected_objects", json!(["person", "person", "fallen_person"]))
                .with("raw_confidence", 0.87))
        })
        .add_fn_node("vlm_classify", |s, _| {
            let objects = s.get_str_list("detected_objects").unwrap_or_default();
            let has = |o: &str| objects.iter().any(|x| x == o);
            let threat = if has("fire") || has("weapon") {
                "critical"
            } else if has("fallen_person") || has("violence") {
                "high"
            } else if has("intrusion") {
                "medium"
            } else {
                "low"
            };
            tracing::info!(?objects, threat, confidence = s.get_f64("raw_confidence"), "classified");
            Ok(StateRecord::new().with("threat_level", threat))
        })
        .add_edge(START, "vlm_detect")
        .add_edge("vlm_detect", "vlm_classify")
        .add_edge("vlm_classify", END);
    graph
        .compile()
        .map_err(|e| AgentError::ExecutionFailed(e.to_string()))
}

struct GenerateAnalysis {
    llm: Arc<dyn TextGenerator>,
}

#[async_trait]
impl Node for GenerateAnalysis {
    fn id(&self) -> &str {
        "generate_analysis"
    }

    async fn run(&self, state: StateRecord, _ctx: &RunContext) -> Result<StateRecord, AgentError> {
        let prompt = format!(
            "Summarize this CCTV situation in one sentence: {}. Procedure: {}",
            state.get_str("context_input").unwrap_or(""),
            state.get_str("manual_reference").unwrap_or("")
        );
        let analysis = self.llm.generate(&prompt).await?;
        Ok(StateRecord::new().with("analysis_result", analysis))
    }
}

fn llm_analysis_graph(llm: Arc<dyn TextGenerator>) -> Result<CompiledStateGraph, AgentError> {
    let mut graph = StateGraph::new(
        StateSchema::new()
            .field("context_input")
            .optional("manual_reference")
            .optional("analysis_result"),
    );
    graph
        .add_fn_node("load_manual", |s, _| {
            let context = s.get_str("context_input").unwrap_or("").to_lowercase();
            let manual = MANUALS
                .iter()
                .find(|(key, _)| context.contains(key))
                .map(|(_, m)| *m)
                .unwrap_or("1) keep monitoring 2) report anomalies");
            Ok(StateRecord::new().with("manual_reference", manual))
        })
        .add_node("generate_analysis", Arc::new(GenerateAnalysis { llm }))
        .add_edge(START, "load_manual")
        .add_edge("load_manual", "generate_analysis")
        .add_edge("generate_analysis", END);
    graph
        .compile()
        .map_err(|e| AgentError::ExecutionFailed(e.to_string()))
}

/// Maps parent fields to the analysis graph's input and its result back.
struct LlmAnalysis {
    analysis: CompiledStateGraph,
}

#[async_trait]
impl Node for LlmAnalysis {
    fn id(&self) -> &str {
        "llm_analysis"
    }

    async fn run(&self, state: StateRecord, _ctx: &RunContext) -> Result<StateRecord, AgentError> {
        let context = format!(
            "location: {}, detected: {:?}, threat: {}",
            state.get_str("camera_location").unwrap_or(""),
            state.get_str_list("detected_objects").unwrap_or_default(),
            state.get_str("threat_level").unwrap_or("")
        );
        let response = self
            .analysis
            .invoke(StateRecord::new().with("context_input", context), None)
            .await?
            .into_state();
        Ok(StateRecord::new()
            .with(
                "situation_summary",
                response.get_str("analysis_result").unwrap_or_default(),
            )
            .with(
                "recommended_action",
                response.get_str("manual_reference").unwrap_or_default(),
            ))
    }
}

fn cctv_graph(llm: Arc<dyn TextGenerator>) -> Result<CompiledStateGraph, AgentError> {
    let schema = StateSchema::new()
        .field("frame_id")
        .field("camera_location")
        .field("timestamp")
        .with_default("detected_objects", json!([]))
        .with_default("threat_level", "low")
        .optional("situation_summary")
        .optional("recommended_action")
        .optional("approval_status")
        .optional("final_report");
    let mut graph = StateGraph::new(schema);
    graph
        .add_fn_node("initialize", |s, _| {
            tracing::info!(
                location = s.get_str("camera_location"),
                at = s.get_str("timestamp"),
                "frame received"
            );
            Ok(StateRecord::new().with("approval_status", "pending"))
        })
        .add_subgraph("vlm_detection", Arc::new(vlm_detection()?))
        .add_node(
            "llm_analysis",
            Arc::new(LlmAnalysis {
                analysis: llm_analysis_graph(llm)?,
            }),
        )
        .add_fn_node("human_approval", |s, ctx| {
            let decision = ctx.interrupt(json!({
                "type": "approval_request",
                "message": format!("{} threat", s.get_str("threat_level").unwrap_or("").to_uppercase()),
                "location": s.get_str("camera_location"),
                "detected": s.get("detected_objects"),
                "options": ["approved", "rejected"],
            }))?;
            Ok(StateRecord::new().with("approval_status", decision))
        })
        .add_fn_node("generate_report", |s, _| {
            let report = format!(
                "frame: {}\nlocation: {}\ntime: {}\ndetected: {}\nthreat: {}\napproval: {}\nsummary: {}",
                s.get_str("frame_id").unwrap_or(""),
                s.get_str("camera_location").unwrap_or(""),
                s.get_str("timestamp").unwrap_or(""),
                s.get_str_list("detected_objects").unwrap_or_default().join(", "),
                s.get_str("threat_level").unwrap_or("").to_uppercase(),
                s.get_str("approval_status").unwrap_or(""),
                s.get_str("situation_summary").unwrap_or(""),
            );
            Ok(StateRecord::new().with("final_report", report))
        })
        .add_edge(START, "initialize")
        .add_edge("initialize", "vlm_detection")
        .add_edge("vlm_detection", "llm_analysis")
        .add_conditional_edges(
            "llm_analysis",
            |s| match s.get_str("threat_level") {
                Some("high") | Some("critical") => "human_approval".to_string(),
                _ => "generate_report".to_string(),
            },
            [
                ("human_approval", "human_approval"),
                ("generate_report", "generate_report"),
            ],
        )
        .add_edge("human_approval", "generate_report")
        .add_edge("generate_report", END);
    graph
        .compile_with_checkpointer(Arc::new(MemorySaver::new()))
        .map_err(|e| AgentError::ExecutionFailed(e.to_string()))
}

fn print_event(event: StreamEvent) {
    match event {
        StreamEvent::Updates { namespace, node, update } if namespace.is_empty() => {
            println!("  [event] {} {:?}", node, update.keys().collect::<Vec<_>>())
        }
        StreamEvent::Updates { namespace, node, update } => println!(
            "  [subgraph:{}] {} {:?}",
            namespace.join("/"),
            node,
            update.keys().collect::<Vec<_>>()
        ),
        StreamEvent::Interrupt { namespace, interrupt } => {
            println!("  [interrupt at {}] {}", namespace.join("/"), interrupt.value)
        }
        StreamEvent::Values { .. } => {}
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    stepgraph_examples::init();

    let llm = stepgraph_examples::text_generator(
        "A person has fallen in parking zone B; dispatch a guard and call an ambulance.",
    );
    let app = cctv_graph(llm)?;
    println!("{}", app.draw_mermaid());

    let config = RunnableConfig::for_thread("cctv-frame-001");
    let input = StateRecord::new()
        .with("frame_id", "FRAME_001")
        .with("camera_location", "Parking B, level 3")
        .with("timestamp", "2024-01-01 09:00:00");

    println!("step 1: run until approval is needed");
    let mut events = app.stream(
        input,
        Some(config.clone()),
        StreamOptions::updates().with_subgraphs(true),
    );
    while let Some(event) = events.next().await {
        print_event(event?);
    }

    let snapshot = app.get_state(&config, true).await?;
    if !snapshot.next.is_empty() {
        println!("next node: {:?}", snapshot.next);
        for interrupt in &snapshot.interrupts {
            println!("waiting for operator: {}", interrupt.value);
        }

        println!("step 2: operator approves");
        let mut events = app.stream(
            Input::resume("approved"),
            Some(config.clone()),
            StreamOptions::updates(),
        );
        while let Some(event) = events.next().await {
            print_event(event?);
        }
    }

    let last = app.get_state(&config, false).await?;
    println!(
        "\n{}",
        last.values.get_str("final_report").unwrap_or("no report")
    );
    Ok(())
}
