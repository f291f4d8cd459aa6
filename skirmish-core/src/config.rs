//! Rules configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::grid::{GRID_SIZE, MAX_GRID_SIZE};
use crate::spells::{SpellBook, ARROW, HEAL, STRIKE};

/// Tunable rules for a match. Missing JSON fields take the defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Side length of the square grid
    pub grid_size: i32,
    /// Movement points per turn
    pub movement_points: u32,
    /// Action points per turn
    pub action_points: u32,
    pub max_health: u32,
    /// Seconds a combatant spends on each step of a move
    pub step_seconds: f32,
    /// Spell the AI strikes with
    pub ai_spell: String,
    pub player_spells: Vec<String>,
    pub enemy_spells: Vec<String>,
    /// How many turn events to retain
    pub event_log_capacity: usize,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            grid_size: GRID_SIZE,
            movement_points: 3,
            action_points: 6,
            max_health: 100,
            step_seconds: 0.18,
            ai_spell: STRIKE.to_string(),
            player_spells: vec![STRIKE.to_string(), ARROW.to_string(), HEAL.to_string()],
            enemy_spells: vec![STRIKE.to_string()],
            event_log_capacity: 256,
        }
    }
}

impl RulesConfig {
    /// Set per-turn resource totals
    pub fn with_points(mut self, movement_points: u32, action_points: u32) -> Self {
        self.movement_points = movement_points;
        self.action_points = action_points;
        self
    }

    pub fn with_grid_size(mut self, grid_size: i32) -> Self {
        self.grid_size = grid_size;
        self
    }

    /// Check values and that every named spell exists in `spells`.
    ///
    /// Either side may be AI controlled, so `ai_spell` must be in both loadouts.
    pub fn validate(&self, spells: &SpellBook) -> Result<(), ConfigError> {
        if self.grid_size <= 0 || self.grid_size > MAX_GRID_SIZE {
            return Err(ConfigError::Invalid(format!(
                "grid_size must be in 1..={}, got {}",
                MAX_GRID_SIZE, self.grid_size
            )));
        }
        if self.step_seconds.is_nan() || self.step_seconds <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "step_seconds must be positive, got {}",
                self.step_seconds
            )));
        }
        if self.max_health == 0 {
            return Err(ConfigError::Invalid("max_health must be positive".to_string()));
        }

        spells.resolve(&self.player_spells)?;
        spells.resolve(&self.enemy_spells)?;
        if spells.id_of(&self.ai_spell).is_none() {
            return Err(ConfigError::UnknownSpell(self.ai_spell.clone()));
        }
        for (side, loadout) in [("player_spells", &self.player_spells), ("enemy_spells", &self.enemy_spells)] {
            if !loadout.contains(&self.ai_spell) {
                return Err(ConfigError::Invalid(format!(
                    "ai_spell {:?} is missing from {}",
                    self.ai_spell, side
                )));
            }
        }
        Ok(())
    }

    /// Load from JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save to JSON file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
