//! analysis-worker: replays an NDJSON event log through threshold detection.
//!
//! Loads detection point and system group policies from the rules directory,
//! feeds every event through the ingestion pipeline in file order and writes
//! the resulting attacks as NDJSON (to `--attacks-out` or stdout).

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use sensor_analysis::{EventPipeline, ThresholdEngine};
use sensor_core::config::load_dotenv;
use sensor_core::{Clock, Config, FixedClock, SystemClock};
use sensor_rules::{LoadStatus, PolicyLoader};
use sensor_storage::{read_events, write_attacks, InMemoryAttackStore, InMemoryEventStore};

// ── CLI ─────────────────────────────────────────────────────────────

/// Which instant bounds the counting windows during replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ClockMode {
    /// Each event's own timestamp, as if analyzed when it happened.
    Event,
    /// Wall-clock time.
    System,
}

/// Threshold detection over a recorded event log.
#[derive(Parser, Debug)]
#[command(name = "analysis-worker", version, about)]
struct Cli {
    /// Directory of detection point and system group YAML files.
    #[arg(long, env = "RULES_DIR")]
    rules_dir: Option<PathBuf>,

    /// NDJSON file of events to replay.
    #[arg(long, env = "EVENTS_FILE")]
    events: Option<PathBuf>,

    /// Write attacks here instead of stdout.
    #[arg(long, env = "ATTACKS_FILE")]
    attacks_out: Option<PathBuf>,

    /// Clock used for interval windows.
    #[arg(long, value_enum, default_value_t = ClockMode::Event)]
    clock: ClockMode,

    /// Keep watching the rules directory for changes while replaying.
    #[arg(long)]
    watch: bool,
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(dir) = cli.rules_dir {
        config.rules.dir = dir;
    }
    if cli.events.is_some() {
        config.storage.events_file = cli.events;
    }
    if cli.attacks_out.is_some() {
        config.storage.attacks_file = cli.attacks_out;
    }
    config.rules.watch |= cli.watch;
    config.log_summary();

    let events_file = config
        .storage
        .events_file
        .clone()
        .context("no events file given (--events or EVENTS_FILE)")?;

    // Policies
    let mut loader = PolicyLoader::new(config.rules.dir.clone());
    let results = loader.load_all()?;
    for result in &results {
        if let LoadStatus::Failed { error } = &result.status {
            warn!(path = %result.path.display(), error = %error, "policy not loaded");
        }
    }
    if config.rules.watch {
        loader.watch()?;
    }
    let resolver = Arc::new(loader);

    // Stores and engine
    let event_store = Arc::new(InMemoryEventStore::new());
    let attack_store = Arc::new(InMemoryAttackStore::new(
        config.storage.attack_channel_capacity,
    ));

    let replay_clock = Arc::new(FixedClock::new(chrono::Utc::now()));
    let clock: Arc<dyn Clock> = match cli.clock {
        ClockMode::Event => replay_clock.clone(),
        ClockMode::System => Arc::new(SystemClock),
    };

    let engine = ThresholdEngine::new(clock, resolver, event_store.clone(), attack_store.clone())
        .with_lock_prune_threshold(config.analysis.lock_prune_threshold);
    let pipeline = EventPipeline::new(event_store.clone(), attack_store.clone())
        .with_analyzer(Arc::new(engine));

    // Replay
    let events = read_events(&events_file)
        .with_context(|| format!("reading {}", events_file.display()))?;
    info!(events = events.len(), "replaying events");

    for event in events {
        if cli.clock == ClockMode::Event {
            replay_clock.set(event.timestamp);
        }
        pipeline.add_event(event).await?;
    }

    let attacks = attack_store.attacks().await;
    info!(
        events = event_store.len().await,
        attacks = attacks.len(),
        "replay complete"
    );

    match &config.storage.attacks_file {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
            write_attacks(BufWriter::new(file), &attacks)?;
            info!(path = %path.display(), "wrote attacks");
        }
        None => write_attacks(io::stdout().lock(), &attacks)?,
    }

    Ok(())
}
