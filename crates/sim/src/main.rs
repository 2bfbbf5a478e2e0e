//! Headless battle simulator.
//!
//! Loads a content directory, hands every combatant to the AI and runs the
//! battle to completion, logging each event on the way.
//! Run with: `cargo run -p battle-sim -- --content content`

use std::path::PathBuf;

use anyhow::{Context, Result};
use battle_content::ContentFactory;
use battle_core::{BattleAi, BattleEvent, StateAlteredKind};
use battle_runtime::{BattleReport, BattleRuntime, EventBus, RuntimeConfig, Topic};
use clap::Parser;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Run an AI-vs-AI battle from a content directory
#[derive(Parser)]
#[command(name = "battle-sim")]
#[command(about = "Headless turn-based battle simulator", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding config.toml, skills.ron and roster.ron
    #[arg(short, long, value_name = "DIR", default_value = "content")]
    content: PathBuf,

    /// Override the RNG seed from config.toml
    #[arg(short, long)]
    seed: Option<u64>,

    /// Give up after this many ticks
    #[arg(long, default_value_t = RuntimeConfig::DEFAULT_MAX_TICKS)]
    max_ticks: u64,

    /// Pace ticks in wall-clock time instead of running flat out
    #[arg(long)]
    realtime: bool,

    /// Output format for the final report
    #[arg(short, long, value_enum, default_value = "summary")]
    format: OutputFormat,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// Outcome, duration and survivors
    Summary,
    /// Full JSON report
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let report = run(&cli).await?;

    match cli.format {
        OutputFormat::Summary => print_summary(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

async fn run(cli: &Cli) -> Result<BattleReport> {
    let factory = ContentFactory::new(cli.content.clone());
    let mut config = factory
        .load_config()
        .with_context(|| format!("loading config from {}", cli.content.display()))?;
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    let roster = factory.load_roster()?;

    let mut prepared = factory.prepare(config, &roster)?;
    for id in &prepared.unplaced {
        warn!(enemy = %id, "no room on the mat, enemy sits this battle out");
    }
    for spec in roster.combatants() {
        if prepared.controller.is_player_controlled(spec.id) {
            prepared.controller.set_ai(spec.id, Some(BattleAi::random()));
        }
    }

    let runtime_config = RuntimeConfig {
        realtime: cli.realtime,
        max_ticks: cli.max_ticks,
        event_buffer_size: 1024,
        ..RuntimeConfig::default()
    };
    let bus = EventBus::with_capacity(runtime_config.event_buffer_size);
    let loggers: Vec<JoinHandle<()>> = Topic::ALL
        .iter()
        .map(|&topic| tokio::spawn(log_topic(topic, bus.subscribe(topic))))
        .collect();
    let runtime = BattleRuntime::start_with_bus(prepared.controller, runtime_config, bus)?;

    let report = runtime.wait().await?;
    for logger in loggers {
        if let Err(e) = logger.await {
            warn!(error = %e, "event logger task failed");
        }
    }
    Ok(report)
}

async fn log_topic(topic: Topic, mut rx: broadcast::Receiver<BattleEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => log_event(&event),
            Err(RecvError::Lagged(skipped)) => {
                warn!(?topic, skipped, "event logger fell behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

fn log_event(event: &BattleEvent) {
    match event {
        BattleEvent::StateChanged { state, outcome, .. } => {
            info!(%state, %outcome, "battle state");
        }
        BattleEvent::SequenceProcessed(sequence) => {
            info!(
                sender = %sequence.sender,
                recipient = %sequence.recipient,
                skill = %sequence.skill,
                "resolving"
            );
        }
        BattleEvent::CombatantAltered { combatant, kind } => match kind {
            StateAlteredKind::Died => info!(%combatant, "down"),
            StateAlteredKind::Resurrected => info!(%combatant, "back on their feet"),
            StateAlteredKind::HpChanged { delta, hp } => {
                info!(%combatant, delta, hp, "hp");
            }
            other => debug!(%combatant, change = ?other, "altered"),
        },
        BattleEvent::EntityAdded {
            combatant, row, column, ..
        } => debug!(%combatant, %row, column, "joined"),
        BattleEvent::EntityRemoved { combatant } => debug!(%combatant, "left"),
    }
}

fn print_summary(report: &BattleReport) {
    println!("outcome:    {}", report.outcome);
    println!("duration:   {:.2}s ({} ticks)", report.elapsed, report.ticks);
    println!("experience: {}", report.experience);
    println!("survivors:");
    for survivor in &report.survivors {
        println!(
            "  {:<12} {:>6.1}/{:<6.1} hp  {:>5.1}/{:<5.1} ap",
            survivor.name, survivor.hp, survivor.max_hp, survivor.ap, survivor.max_ap
        );
    }
}
