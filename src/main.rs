//! Scenario runner
//!
//! Plays a scripted battle through the turn engine and prints its events.

use clap::Parser;
use pokemon_turn_engine::scenario::Scenario;
use pokemon_turn_engine::{BattleEngine, EngineConfig, MoveCatalogue};
use std::path::PathBuf;
use std::process::ExitCode;

/// Run a scripted battle and print what happened
#[derive(Parser, Debug)]
#[command(name = "pokemon-turn-engine")]
#[command(about = "Play a scripted battle through the turn engine")]
struct Args {
    /// Scenario file (RON). Runs the built-in Instruct demo when omitted.
    scenario: Option<PathBuf>,

    /// Engine configuration file (RON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Move entries (RON) that replace the standard ones
    #[arg(long)]
    moves: Option<PathBuf>,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Dump events as JSON instead of battle text
    #[arg(long)]
    json: bool,

    /// Wait out presentation timings instead of completing them instantly
    #[arg(long)]
    animate: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if args.seed.is_some() {
        config.rng_seed = args.seed;
    }
    if args.animate {
        config.instant_presentation = false;
    }

    let scenario = match &args.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::instruct_demo(),
    };
    let scenario = match &args.moves {
        Some(path) => scenario.with_move_overrides(MoveCatalogue::load(path)?),
        None => scenario,
    };
    tracing::info!(scenario = %scenario.name, "starting");

    let mut engine: BattleEngine = scenario.build_engine(config);
    let results = scenario.run(&mut engine).await?;

    if args.json {
        let events: Vec<_> = results.iter().flat_map(|r| r.events.iter()).collect();
        println!("{}", serde_json::to_string_pretty(&events)?);
        return Ok(());
    }

    println!("{}", scenario.name);
    let state = engine.state();
    for result in &results {
        for event in &result.events {
            if let Some(line) = event.format(state) {
                println!("  {}", line);
            }
        }
    }
    println!();
    for pokemon in engine.player_party().iter().chain(engine.enemy_party()) {
        println!(
            "  {:<10} {:>3}/{:<3} HP  history: {}",
            pokemon.name,
            pokemon.current_hp(),
            pokemon.max_hp,
            pokemon
                .move_history()
                .iter()
                .map(|entry| entry.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    Ok(())
}
