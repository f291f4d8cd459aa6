//! Loading and formatting helpers shared by the commands

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use skirmish_core::{find_path, mapfile, Grid, Position, RulesConfig, SpellBook};

/// Attempts at generating a map where both spawns are connected
const ARENA_ATTEMPTS: usize = 32;

#[derive(Args, Clone, Debug, Default)]
pub struct RulesArgs {
    /// Rules config JSON file (defaults when absent)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Spell catalog JSON file (standard catalog when absent)
    #[arg(long, value_name = "FILE")]
    pub spells: Option<PathBuf>,
}

/// Load the spell catalog and rules, checking they agree
pub fn load_rules(args: &RulesArgs) -> Result<(SpellBook, RulesConfig)> {
    let spells = match &args.spells {
        Some(path) => SpellBook::load(path)
            .with_context(|| format!("Failed to load spell catalog: {}", path.display()))?,
        None => SpellBook::standard(),
    };

    let config = match &args.config {
        Some(path) => {
            RulesConfig::load(path).with_context(|| format!("Failed to load rules config: {}", path.display()))?
        }
        None => RulesConfig::default(),
    };

    config.validate(&spells).context("Rules config does not match the spell catalog")?;
    Ok((spells, config))
}

/// Load a map file (JSON, or the sibling CSV) that must be `size` x `size`
pub fn load_map(path: &Path, size: i32) -> Result<Grid> {
    mapfile::load_grid(path, size, size).with_context(|| format!("Failed to load map: {}", path.display()))
}

/// Create RNG from seed or random
pub fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Parse "x,y"
pub fn parse_position(s: &str) -> Result<Position, String> {
    let (x, y) = s.split_once(',').ok_or_else(|| format!("expected x,y but got {:?}", s))?;
    let x = x.trim().parse().map_err(|_| format!("bad x coordinate in {:?}", s))?;
    let y = y.trim().parse().map_err(|_| format!("bad y coordinate in {:?}", s))?;
    Ok(Position::new(x, y))
}

/// Opposite ends of the middle row
pub fn default_spawns(size: i32) -> (Position, Position) {
    let row = size / 2;
    let left = (size - 1).min(1);
    let right = (size - 2).max(0);
    (Position::new(left, row), Position::new(right, row))
}

/// Random obstacles with both spawns left open and connected. Falls back to
/// an open grid if no attempt connects them.
pub fn random_arena(rng: &mut ChaCha8Rng, size: i32, density: f64, spawns: (Position, Position)) -> Grid {
    for _ in 0..ARENA_ATTEMPTS {
        let mut grid = Grid::with_size(size, size);
        grid.scatter_obstacles(rng, density, &[spawns.0, spawns.1]);
        if spawns.0 == spawns.1 || !find_path(&grid, spawns.0, spawns.1).is_empty() {
            return grid;
        }
    }
    tracing::warn!("no connected arena after {} attempts, using an open grid", ARENA_ATTEMPTS);
    Grid::with_size(size, size)
}

/// ASCII view of the grid: `#` blocked, `.` open, `*` highlighted; `marks`
/// take precedence
pub fn render_grid(grid: &Grid, highlight: &[Position], marks: &[(Position, char)]) -> String {
    let mut out = String::new();
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let pos = Position::new(x, y);
            let glyph = if let Some(&(_, c)) = marks.iter().find(|(p, _)| *p == pos) {
                c
            } else if highlight.contains(&pos) {
                '*'
            } else if grid.is_blocked(x, y) {
                '#'
            } else {
                '.'
            };
            out.push(glyph);
        }
        out.push('\n');
    }
    out
}
