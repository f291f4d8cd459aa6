//! Map command - generate random maps and convert between JSON and CSV

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use skirmish_core::{Grid, MapData, GRID_SIZE, MAX_GRID_SIZE};

use crate::common::{create_rng, default_spawns, render_grid};

#[derive(Args)]
pub struct MapArgs {
    #[command(subcommand)]
    pub action: MapAction,
}

#[derive(Subcommand)]
pub enum MapAction {
    /// Write a random square map
    Generate {
        /// Output file; `.csv` writes CSV, anything else JSON
        #[arg(long, value_name = "FILE")]
        output: PathBuf,

        #[arg(long, default_value_t = GRID_SIZE)]
        size: i32,

        /// Chance for each cell to be blocked
        #[arg(long, default_value = "0.15")]
        density: f64,

        /// Print the map after writing it
        #[arg(long)]
        show: bool,
    },
    /// Read a map (JSON with CSV fallback) and write it in another format
    Convert {
        #[arg(long, value_name = "FILE")]
        input: PathBuf,

        /// Output file; `.csv` writes CSV, anything else JSON
        #[arg(long, value_name = "FILE")]
        output: PathBuf,
    },
}

pub fn run(args: MapArgs, seed: Option<u64>) -> Result<()> {
    match args.action {
        MapAction::Generate {
            output,
            size,
            density,
            show,
        } => {
            if size <= 0 || size > MAX_GRID_SIZE {
                anyhow::bail!("map size must be in 1..={}, got {}", MAX_GRID_SIZE, size);
            }
            let mut rng = create_rng(seed);
            let (left, right) = default_spawns(size);
            let mut grid = Grid::with_size(size, size);
            grid.scatter_obstacles(&mut rng, density, &[left, right]);

            save_map(&MapData::from_grid(&grid), &output)?;
            tracing::info!("Wrote {}x{} map ({} blocked) to {}", size, size, grid.blocked_count(), output.display());
            if show {
                print!("{}", render_grid(&grid, &[], &[]));
            }
            Ok(())
        }
        MapAction::Convert { input, output } => {
            let data = MapData::load(&input).with_context(|| format!("Failed to load map: {}", input.display()))?;
            save_map(&data, &output)?;
            tracing::info!("Converted {} -> {}", input.display(), output.display());
            Ok(())
        }
    }
}

/// Write JSON or CSV depending on the extension
fn save_map(data: &MapData, path: &Path) -> Result<()> {
    let is_csv = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    let result = if is_csv { data.save_csv(path) } else { data.save_json(path) };
    result.with_context(|| format!("Failed to write map: {}", path.display()))
}
