//! Skirmish CLI - Command-line interface
//!
//! Commands:
//! - duel: Play one headless AI vs AI match
//! - batch: Play many seeded matches in parallel
//! - reach / path / sight: Visualise the grid queries
//! - map: Generate and convert map files

mod batch;
mod common;
mod duel;
mod inspect;
mod map_cmd;
mod sim;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "skirmish")]
#[command(about = "Turn-based grid combat simulator")]
struct Cli {
    /// Random seed for reproducibility
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Log debug output (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single match between two greedy AIs
    Duel(duel::DuelArgs),
    /// Play many matches in parallel and report win rates
    Batch(batch::BatchArgs),
    /// Show the cells reachable within a movement budget
    Reach(inspect::ReachArgs),
    /// Show the shortest path between two cells
    Path(inspect::PathArgs),
    /// Show the cells a spell range band can target
    Sight(inspect::SightArgs),
    /// Generate or convert map files
    Map(map_cmd::MapArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Duel(args) => duel::run(args, cli.seed),
        Commands::Batch(args) => batch::run(args, cli.seed),
        Commands::Reach(args) => inspect::run_reach(args),
        Commands::Path(args) => inspect::run_path(args),
        Commands::Sight(args) => inspect::run_sight(args),
        Commands::Map(args) => map_cmd::run(args, cli.seed),
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
