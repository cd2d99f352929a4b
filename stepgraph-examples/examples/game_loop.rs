//! Menu-driven game loop: the manager node asks for an action on every pass, and
//! the item shop sub-graph asks a nested question of its own. Every question is an
//! interrupt answered with `Input::Resume`.
//!
//! Run: `cargo run -p stepgraph-examples --example game_loop -- --moves 1,2,3,1,4`
//! or `-- --interactive` to answer from stdin.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use async_trait::async_trait;
use clap::Parser;
use stepgraph::{
    AgentError, CompiledStateGraph, Input, MemorySaver, Node, RunContext, RunnableConfig,
    StateGraph, StateRecord, StateSchema, TextGenerator, END, START,
};

#[derive(Parser, Debug)]
#[command(name = "game_loop")]
#[command(about = "Train, battle and shop in a resumable game loop")]
struct Args {
    /// Scripted answers, one per question (manager: 1 train, 2 battle, 3 item, 4 end).
    #[arg(long, value_delimiter = ',', default_value = "1,2,3,1,4")]
    moves: Vec<String>,

    /// Read answers from stdin instead of `--moves`.
    #[arg(long)]
    interactive: bool,
}

fn schema() -> StateSchema {
    StateSchema::new()
        .field("name")
        .with_default("level", 50)
        .with_default("hp", 100)
        .with_default("max_hp", 100)
        .with_default("pp", 20)
        .with_default("max_pp", 20)
        .with_default("attack", 120)
        .with_default("speed", 105)
        .with_default("log", "Ready for adventure.")
        .with_default("next_action", "")
}

fn int(s: &StateRecord, key: &str) -> i64 {
    s.get_i64(key).unwrap_or(0)
}

struct Train {
    llm: Arc<dyn TextGenerator>,
}

#[async_trait]
impl Node for Train {
    fn id(&self) -> &str {
        "train_logic"
    }

    async fn run(&self, s: StateRecord, _ctx: &RunContext) -> Result<StateRecord, AgentError> {
        let atk_gain = 1 + int(&s, "level") % 3;
        let spd_gain = 1 + int(&s, "attack") % 3;
        let prompt = format!(
            "Describe {} training in at most three sentences. End with: attack +{}, speed +{}.",
            s.get_str("name").unwrap_or(""),
            atk_gain,
            spd_gain
        );
        let text = self.llm.generate(&prompt).await?;
        Ok(StateRecord::new()
            .with("hp", (int(&s, "hp") - 10).max(0))
            .with("attack", int(&s, "attack") + atk_gain)
            .with("speed", int(&s, "speed") + spd_gain)
            .with("log", text))
    }
}

struct Battle {
    llm: Arc<dyn TextGenerator>,
}

#[async_trait]
impl Node for Battle {
    fn id(&self) -> &str {
        "battle_logic"
    }

    async fn run(&self, s: StateRecord, _ctx: &RunContext) -> Result<StateRecord, AgentError> {
        let (hp, pp) = (int(&s, "hp"), int(&s, "pp"));
        if hp <= 10 || pp <= 0 {
            return Ok(StateRecord::new().with("log", "Too tired to fight, use an item first."));
        }
        let damage = 10 + (hp + pp) % 16;
        let prompt = format!(
            "A wild opponent appears! Describe {}'s battle in three sentences; it takes {} damage.",
            s.get_str("name").unwrap_or(""),
            damage
        );
        let text = self.llm.generate(&prompt).await?;
        let (new_hp, new_pp) = ((hp - damage).max(0), (pp - 5).max(0));
        Ok(StateRecord::new().with("hp", new_hp).with("pp", new_pp).with(
            "log",
            format!("{}\nHP: {} -> {}\nPP: {} -> {}", text, hp, new_hp, pp, new_pp),
        ))
    }
}

fn single_node(node_id: &str, node: Arc<dyn Node>) -> Result<Arc<CompiledStateGraph>, AgentError> {
    let mut graph = StateGraph::new(schema());
    graph
        .add_node(node_id, node)
        .add_edge(START, node_id)
        .add_edge(node_id, END);
    graph
        .compile()
        .map(Arc::new)
        .map_err(|e| AgentError::ExecutionFailed(e.to_string()))
}

fn item_shop() -> Result<Arc<CompiledStateGraph>, AgentError> {
    let mut graph = StateGraph::new(schema());
    graph
        .add_fn_node("item_logic", |s, ctx| {
            let choice = ctx.interrupt("Pick an item: 1 potion (HP), 2 ether (PP), 3 rare candy (level up)")?;
            let update = match choice.as_str() {
                Some("1") => StateRecord::new()
                    .with("hp", int(s, "max_hp"))
                    .with("log", "Used a potion. HP fully restored."),
                Some("2") => StateRecord::new()
                    .with("pp", int(s, "max_pp"))
                    .with("log", "Used an ether. PP fully restored."),
                Some("3") => {
                    let max_hp = int(s, "max_hp") + 5;
                    StateRecord::new()
                        .with("level", int(s, "level") + 1)
                        .with("max_hp", max_hp)
                        .with("hp", max_hp)
                        .with("log", format!("Rare candy! Level {}.", int(s, "level") + 1))
                }
                _ => StateRecord::new().with("log", "No item used."),
            };
            Ok(update)
        })
        .add_edge(START, "item_logic")
        .add_edge("item_logic", END);
    graph
        .compile()
        .map(Arc::new)
        .map_err(|e| AgentError::ExecutionFailed(e.to_string()))
}

fn game(llm: Arc<dyn TextGenerator>) -> Result<CompiledStateGraph, AgentError> {
    let mut graph = StateGraph::new(schema());
    graph
        .add_fn_node("manager", |s, ctx| {
            let log = s.get_str("log").unwrap_or("");
            let short: String = log.chars().take(40).collect();
            println!(
                "== {} (Lv.{}) HP {}/{} PP {}/{} ATK {} SPD {} ==\n   {}",
                s.get_str("name").unwrap_or(""),
                int(s, "level"),
                int(s, "hp"),
                int(s, "max_hp"),
                int(s, "pp"),
                int(s, "max_pp"),
                int(s, "attack"),
                int(s, "speed"),
                short
            );
            let choice = ctx.interrupt("Action (1 train / 2 battle / 3 item / 4 end)")?;
            Ok(StateRecord::new().with("next_action", choice))
        })
        .add_subgraph("TrainingGym", single_node("train_logic", Arc::new(Train { llm: llm.clone() }))?)
        .add_subgraph("BattleArena", single_node("battle_logic", Arc::new(Battle { llm }))?)
        .add_subgraph("ItemShop", item_shop()?)
        .add_edge(START, "manager")
        .add_conditional_edges(
            "manager",
            |s| {
                match s.get_str("next_action") {
                    Some("1") => "go_train",
                    Some("2") => "go_battle",
                    Some("3") => "go_item",
                    _ => "go_end",
                }
                .to_string()
            },
            [
                ("go_train", "TrainingGym"),
                ("go_battle", "BattleArena"),
                ("go_item", "ItemShop"),
                ("go_end", END),
            ],
        )
        .add_edge("TrainingGym", "manager")
        .add_edge("BattleArena", "manager")
        .add_edge("ItemShop", "manager");
    graph
        .compile_with_checkpointer(Arc::new(MemorySaver::new()))
        .map_err(|e| AgentError::ExecutionFailed(e.to_string()))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    stepgraph_examples::init();
    let args = Args::parse();

    let app = game(stepgraph_examples::text_generator(
        "A short, fierce scene unfolds.",
    ))?;
    let config = RunnableConfig::for_thread("save_v2");
    app.invoke(StateRecord::new().with("name", "Dragonite"), Some(config.clone()))
        .await?;

    let mut scripted = args.moves.into_iter();
    let stdin = io::stdin();
    loop {
        let snapshot = app.get_state(&config, true).await?;
        if snapshot.is_complete() {
            println!("Game over. Bye!");
            break;
        }
        let Some(question) = snapshot.interrupts.first() else {
            break;
        };
        println!("> {} [{}]", question.value, snapshot.position.join(" / "));

        let answer = if args.interactive {
            print!("input: ");
            io::stdout().flush()?;
            let mut line = String::new();
            stdin.lock().read_line(&mut line)?;
            line.trim().to_string()
        } else {
            match scripted.next() {
                Some(answer) => answer,
                None => break,
            }
        };
        if answer.eq_ignore_ascii_case("q") {
            println!("Leaving without finishing the thread.");
            break;
        }
        println!("input: {}", answer);

        let outcome = app.invoke(Input::resume(answer), Some(config.clone())).await?;
        if let Some(log) = outcome.state().get_str("log") {
            println!("[log] {}", log);
        }
    }
    Ok(())
}
