//! Batch command - many seeded matches in parallel
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: play_batch(), report_results()
//! - Level 3: play_seeded_game(), compute_statistics()
//! - Level 4: formatting utilities

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;

use skirmish_core::{Grid, Outcome, Position, RulesConfig, SpellBook};

use crate::common::{default_spawns, load_map, load_rules, random_arena, RulesArgs};
use crate::sim::{play_match, MatchSetup};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct BatchArgs {
    #[command(flatten)]
    pub rules: RulesArgs,

    /// Number of matches to play
    #[arg(long, default_value = "100")]
    pub games: usize,

    /// Fixed map for every match; random arenas when absent
    #[arg(long, value_name = "FILE")]
    pub map: Option<PathBuf>,

    /// Obstacle density for random arenas
    #[arg(long, default_value = "0.15")]
    pub density: f64,

    /// Maximum rounds per match
    #[arg(long, default_value = "50")]
    pub max_rounds: u32,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Result of one match in the batch
#[derive(Clone, Debug, Serialize)]
struct GameSummary {
    game_number: usize,
    seed: u64,
    outcome: Outcome,
    rounds: u32,
    player_health: u32,
    enemy_health: u32,
}

/// Aggregated batch results
#[derive(Clone, Debug, Serialize)]
struct BatchResults {
    total_games: usize,
    player_wins: usize,
    enemy_wins: usize,
    draws: usize,
    avg_rounds: f32,
    player_win_rate: f32,
    games: Vec<GameSummary>,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run batch command
pub fn run(args: BatchArgs, seed: Option<u64>) -> Result<()> {
    let (spells, config) = load_rules(&args.rules)?;
    let fixed_map = match &args.map {
        Some(path) => Some(load_map(path, config.grid_size)?),
        None => None,
    };

    tracing::info!(
        "Starting batch: {} games, max {} rounds, {}",
        args.games,
        args.max_rounds,
        if fixed_map.is_some() { "fixed map" } else { "random arenas" }
    );

    let results = play_batch(&spells, &config, fixed_map.as_ref(), &args, seed.unwrap_or(42))?;

    report_results(&results, args.json);
    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Play every game in parallel; game `i` uses seed `base_seed + i`
fn play_batch(
    spells: &SpellBook,
    config: &RulesConfig,
    fixed_map: Option<&Grid>,
    args: &BatchArgs,
    base_seed: u64,
) -> Result<BatchResults> {
    let games = (0..args.games)
        .into_par_iter()
        .map(|index| {
            let seed = base_seed.wrapping_add(index as u64);
            play_seeded_game(spells, config, fixed_map, args, index + 1, seed)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(compute_statistics(games))
}

fn report_results(results: &BatchResults, json: bool) {
    if json {
        if let Ok(text) = serde_json::to_string_pretty(results) {
            println!("{}", text);
        }
    } else {
        print_text_results(results);
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

fn play_seeded_game(
    spells: &SpellBook,
    config: &RulesConfig,
    fixed_map: Option<&Grid>,
    args: &BatchArgs,
    game_number: usize,
    seed: u64,
) -> Result<GameSummary> {
    let (grid, setup) = match fixed_map {
        Some(grid) => {
            let (player, enemy) = default_spawns(grid.width().min(grid.height()));
            if !grid.is_walkable(player) || !grid.is_walkable(enemy) {
                anyhow::bail!("map blocks the spawn cells {} and {}", player, enemy);
            }
            (grid.clone(), setup_for(player, enemy, args))
        }
        None => {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let spawns = default_spawns(config.grid_size);
            let grid = random_arena(&mut rng, config.grid_size, args.density, spawns);
            (grid, setup_for(spawns.0, spawns.1, args))
        }
    };

    let record = play_match(&grid, spells, config, &setup)?;
    tracing::debug!("Game {}: {:?} ({} rounds)", game_number, record.outcome, record.rounds);

    Ok(GameSummary {
        game_number,
        seed,
        outcome: record.outcome,
        rounds: record.rounds,
        player_health: record.player_health,
        enemy_health: record.enemy_health,
    })
}

fn compute_statistics(games: Vec<GameSummary>) -> BatchResults {
    let count = |outcome: Outcome| games.iter().filter(|g| g.outcome == outcome).count();
    let player_wins = count(Outcome::PlayerWins);
    let enemy_wins = count(Outcome::EnemyWins);
    let draws = count(Outcome::Ongoing);

    let total = games.len();
    let total_rounds: u32 = games.iter().map(|g| g.rounds).sum();
    let (avg_rounds, player_win_rate) = if total == 0 {
        (0.0, 0.0)
    } else {
        (total_rounds as f32 / total as f32, player_wins as f32 / total as f32)
    };

    BatchResults {
        total_games: total,
        player_wins,
        enemy_wins,
        draws,
        avg_rounds,
        player_win_rate,
        games,
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn setup_for(player: Position, enemy: Position, args: &BatchArgs) -> MatchSetup {
    MatchSetup {
        player,
        enemy,
        max_rounds: args.max_rounds,
    }
}

fn percent(part: usize, total: usize) -> f32 {
    if total == 0 {
        0.0
    } else {
        100.0 * part as f32 / total as f32
    }
}

fn print_text_results(results: &BatchResults) {
    let total = results.total_games;

    println!("\n=== Batch Results ===");
    println!("Total games: {}", total);
    println!(
        "Player wins: {} ({:.1}%)",
        results.player_wins,
        percent(results.player_wins, total)
    );
    println!(
        "Enemy wins:  {} ({:.1}%)",
        results.enemy_wins,
        percent(results.enemy_wins, total)
    );
    println!("Draws:       {} ({:.1}%)", results.draws, percent(results.draws, total));
    println!("Avg rounds:  {:.1}", results.avg_rounds);
}
