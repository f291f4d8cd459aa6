//! Query commands - print ASCII views of reachability, paths and sight

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use skirmish_core::{castable_cells, find_path, reachable_tiles, Grid, Position, GRID_SIZE, MAX_GRID_SIZE};

use crate::common::{load_map, parse_position, render_grid};

// ============================================================================
// COMMAND ARGUMENTS
// ============================================================================

#[derive(Args, Clone, Debug)]
pub struct MapSource {
    /// Map file (JSON, or sibling CSV); an open grid when absent
    #[arg(long, value_name = "FILE")]
    pub map: Option<PathBuf>,

    /// Side length the map must have
    #[arg(long, default_value_t = GRID_SIZE)]
    pub size: i32,
}

#[derive(Args)]
pub struct ReachArgs {
    #[command(flatten)]
    pub source: MapSource,

    /// Start cell as x,y
    #[arg(long, value_parser = parse_position)]
    pub from: Position,

    /// Movement points available
    #[arg(long, default_value = "3")]
    pub budget: u32,
}

#[derive(Args)]
pub struct PathArgs {
    #[command(flatten)]
    pub source: MapSource,

    #[arg(long, value_parser = parse_position)]
    pub from: Position,

    #[arg(long, value_parser = parse_position)]
    pub to: Position,
}

#[derive(Args)]
pub struct SightArgs {
    #[command(flatten)]
    pub source: MapSource,

    /// Caster cell as x,y
    #[arg(long, value_parser = parse_position)]
    pub from: Position,

    #[arg(long, default_value = "1")]
    pub min_range: i32,

    #[arg(long, default_value = "3")]
    pub max_range: i32,

    /// Ignore line of sight
    #[arg(long)]
    pub no_los: bool,
}

// ============================================================================
// COMMANDS
// ============================================================================

pub fn run_reach(args: ReachArgs) -> Result<()> {
    let grid = open_map(&args.source)?;
    ensure_on_grid(&grid, args.from, "--from")?;
    let tiles = reachable_tiles(&grid, args.from, args.budget);

    println!("{} cells reachable from {} with {} MP", tiles.len(), args.from, args.budget);
    print!("{}", render_grid(&grid, &tiles, &[(args.from, '@')]));
    Ok(())
}

pub fn run_path(args: PathArgs) -> Result<()> {
    let grid = open_map(&args.source)?;
    ensure_on_grid(&grid, args.from, "--from")?;
    ensure_on_grid(&grid, args.to, "--to")?;
    let path = find_path(&grid, args.from, args.to);

    if path.is_empty() {
        println!("No path from {} to {}", args.from, args.to);
    } else {
        let steps: Vec<String> = path.iter().map(ToString::to_string).collect();
        println!("{} steps: {}", path.len(), steps.join(" "));
    }
    print!("{}", render_grid(&grid, &path, &[(args.from, '@'), (args.to, 'X')]));
    Ok(())
}

pub fn run_sight(args: SightArgs) -> Result<()> {
    let grid = open_map(&args.source)?;
    ensure_on_grid(&grid, args.from, "--from")?;
    let cells = castable_cells(&grid, args.from, args.min_range, args.max_range, !args.no_los);

    println!(
        "{} cells in range {}..={} of {}{}",
        cells.len(),
        args.min_range,
        args.max_range,
        args.from,
        if args.no_los { "" } else { " with line of sight" }
    );
    print!("{}", render_grid(&grid, &cells, &[(args.from, '@')]));
    Ok(())
}

fn open_map(source: &MapSource) -> Result<Grid> {
    if source.size <= 0 || source.size > MAX_GRID_SIZE {
        anyhow::bail!("map size must be in 1..={}, got {}", MAX_GRID_SIZE, source.size);
    }
    match &source.map {
        Some(path) => load_map(path, source.size),
        None => Ok(Grid::with_size(source.size, source.size)),
    }
}

fn ensure_on_grid(grid: &Grid, pos: Position, flag: &str) -> Result<()> {
    if !grid.contains(pos) {
        anyhow::bail!(
            "{} {} is outside the {}x{} map",
            flag,
            pos,
            grid.width(),
            grid.height()
        );
    }
    Ok(())
}
