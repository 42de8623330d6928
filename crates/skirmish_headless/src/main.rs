//! Headless AI runner.
//!
//! Runs AI controllers against the built-in engine without graphics,
//! for CI verification and seeded reproduction of AI behavior.
//!
//! # Usage
//!
//! ```bash
//! # Run the built-in 1v1 skirmish for 2000 ticks
//! cargo run -p skirmish_headless -- run
//!
//! # Run a scenario file with a fixed seed and write a JSON report
//! cargo run -p skirmish_headless -- run --scenario maps/duel.ron --seed 7 --report out.json
//! ```
//!
//! Logs go to stderr; the report goes to the `--report` path, or to
//! stdout when no path is given.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use skirmish_headless::runner::HeadlessRunner;
use skirmish_headless::scenario::Scenario;

#[derive(Parser)]
#[command(name = "skirmish_headless")]
#[command(about = "Headless AI runner for testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single headless game
    Run {
        /// Scenario file to load (built-in 1v1 skirmish if omitted)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Number of ticks to simulate
        #[arg(short, long, default_value = "2000")]
        ticks: u64,

        /// Run seed mixed into every controller's seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        report: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            scenario,
            ticks,
            seed,
            report,
        } => match run_game(scenario, ticks, seed, report) {
            Ok(()) => ExitCode::SUCCESS,
            Err(message) => {
                tracing::error!("{message}");
                ExitCode::FAILURE
            }
        },
    }
}

fn run_game(
    scenario_path: Option<PathBuf>,
    ticks: u64,
    seed: u64,
    report_path: Option<PathBuf>,
) -> Result<(), String> {
    let scenario = match scenario_path {
        Some(path) => Scenario::load(&path).map_err(|e| e.to_string())?,
        None => Scenario::skirmish_1v1(),
    };
    tracing::info!(name = %scenario.name, ticks, seed, "starting headless run");

    let mut runner = HeadlessRunner::from_scenario(&scenario, seed).map_err(|e| e.to_string())?;
    let report = runner.run(ticks);

    for player in &report.players {
        tracing::info!(
            player = player.player,
            commands = player.commands_issued,
            units = player.units,
            minerals = player.minerals,
            oil = player.oil,
            revealed = player.revealed_cells,
            "final standing"
        );
    }

    let json = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
    match report_path {
        Some(path) => {
            std::fs::write(&path, json).map_err(|e| e.to_string())?;
            tracing::info!(path = %path.display(), "report written");
        }
        None => println!("{json}"),
    }
    Ok(())
}
