//! Skirmish Core - Tactical combat rules engine
//!
//! This crate provides the rules for turn-based grid combat:
//! - Grid map with blocked cells and map file loading
//! - Movement-point reachability and A* pathfinding
//! - Bresenham line of sight and spell range checks
//! - Combatants with resources, health and step-by-step movement
//! - Turn sequencing with a greedy AI, sharing one validation path with input

pub mod error;
pub mod grid;
pub mod pathfinding;
pub mod sight;
pub mod spells;
pub mod config;
pub mod combatant;
pub mod rules;
pub mod ai;
pub mod turn;
pub mod mapfile;

// Re-exports for convenient access
pub use error::{ConfigError, MapError};
pub use grid::{Grid, Position, DIRECTIONS, GRID_SIZE, MAX_GRID_SIZE};
pub use pathfinding::{find_path, reachable_tiles, MoveCost};
pub use sight::{castable_cells, has_line_of_sight, manhattan_distance, raycast_cells};
pub use spells::{EffectKind, Spell, SpellBook, SpellId};
pub use config::RulesConfig;
pub use combatant::{Combatant, MotionState, ResourcePool, Side};
pub use rules::{CastRejection, CommandRejection, MoveRejection};
pub use ai::{AiAction, GreedyAi};
pub use turn::{CombatantId, Command, Controller, Outcome, Targeting, TurnEvent, TurnSystem};
pub use mapfile::MapData;
