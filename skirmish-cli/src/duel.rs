//! Duel command - play one headless match and print its log
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: prepare_arena(), report_duel()
//! - Level 3: print_text_report(), print_json_report()
//! - Level 4: formatting utilities

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use skirmish_core::{Grid, Outcome, Position, SpellBook, TurnEvent};

use crate::common::{create_rng, default_spawns, load_map, load_rules, parse_position, random_arena, render_grid, RulesArgs};
use crate::sim::{play_match, MatchRecord, MatchSetup};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct DuelArgs {
    #[command(flatten)]
    pub rules: RulesArgs,

    /// Map file (JSON, or sibling CSV); a random arena when absent
    #[arg(long, value_name = "FILE")]
    pub map: Option<PathBuf>,

    /// Obstacle density for random arenas
    #[arg(long, default_value = "0.15")]
    pub density: f64,

    /// Player start cell as x,y
    #[arg(long, value_parser = parse_position)]
    pub player: Option<Position>,

    /// Enemy start cell as x,y
    #[arg(long, value_parser = parse_position)]
    pub enemy: Option<Position>,

    /// Maximum rounds before calling a draw
    #[arg(long, default_value = "50")]
    pub max_rounds: u32,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run duel command
pub fn run(args: DuelArgs, seed: Option<u64>) -> Result<()> {
    let (spells, config) = load_rules(&args.rules)?;
    let (grid, setup) = prepare_arena(&args, config.grid_size, seed)?;

    tracing::info!(
        "Starting duel: player at {} vs enemy at {} on {}x{} ({} blocked)",
        setup.player,
        setup.enemy,
        grid.width(),
        grid.height(),
        grid.blocked_count()
    );

    let record = play_match(&grid, &spells, &config, &setup)?;

    report_duel(&grid, &spells, &setup, &record, args.json);
    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Load or generate the map and choose start cells
fn prepare_arena(args: &DuelArgs, grid_size: i32, seed: Option<u64>) -> Result<(Grid, MatchSetup)> {
    let grid = match &args.map {
        Some(path) => Some(load_map(path, grid_size)?),
        None => None,
    };
    let (default_player, default_enemy) = default_spawns(grid_size);
    let player = args.player.unwrap_or(default_player);
    let enemy = args.enemy.unwrap_or(default_enemy);

    let grid = match grid {
        Some(grid) => grid,
        None => {
            let mut rng = create_rng(seed);
            random_arena(&mut rng, grid_size, args.density, (player, enemy))
        }
    };

    for (label, cell) in [("player", player), ("enemy", enemy)] {
        if !grid.is_walkable(cell) {
            anyhow::bail!("{} start {} is outside the map or blocked", label, cell);
        }
    }
    if player == enemy {
        anyhow::bail!("player and enemy cannot start on the same cell");
    }

    Ok((
        grid,
        MatchSetup {
            player,
            enemy,
            max_rounds: args.max_rounds,
        },
    ))
}

fn report_duel(grid: &Grid, spells: &SpellBook, setup: &MatchSetup, record: &MatchRecord, json: bool) {
    if json {
        print_json_report(record);
    } else {
        print_text_report(grid, spells, setup, record);
    }
}

// ============================================================================
// LEVEL 3 - OUTPUT
// ============================================================================

fn print_json_report(record: &MatchRecord) {
    if let Ok(json) = serde_json::to_string_pretty(record) {
        println!("{}", json);
    }
}

fn print_text_report(grid: &Grid, spells: &SpellBook, setup: &MatchSetup, record: &MatchRecord) {
    println!("\n=== Arena ===");
    print!("{}", render_grid(grid, &[], &[(setup.player, 'P'), (setup.enemy, 'E')]));

    println!("\n=== Log ===");
    for event in &record.events {
        println!("{}", describe_event(event));
    }

    println!("\n=== Result ===");
    println!("Outcome:       {}", outcome_label(record.outcome));
    println!("Rounds:        {}", record.rounds);
    println!("Player health: {}", record.player_health);
    println!("Enemy health:  {}", record.enemy_health);
    println!("Spells known:  {}", spells.len());
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn describe_event(event: &TurnEvent) -> String {
    match event {
        TurnEvent::TurnStarted { round, combatant, side } => {
            format!("[round {}] {:?} #{} starts its turn", round, side, combatant)
        }
        TurnEvent::MoveStarted { combatant, from, to } => format!("  #{} moves {} -> {}", combatant, from, to),
        TurnEvent::SpellCast {
            combatant,
            spell,
            cell,
            target,
        } => match target {
            Some(t) => format!("  #{} casts {} on #{} at {}", combatant, spell, t, cell),
            None => format!("  #{} casts {} at empty {}", combatant, spell, cell),
        },
        TurnEvent::Defeated { combatant } => format!("  #{} is defeated", combatant),
        TurnEvent::TurnEnded { combatant } => format!("  #{} ends its turn", combatant),
    }
}

fn outcome_label(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Ongoing => "draw (round limit)",
        Outcome::PlayerWins => "player wins",
        Outcome::EnemyWins => "enemy wins",
    }
}
