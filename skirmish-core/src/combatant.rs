//! Combatants: position, resources, health and the Idle/Moving state machine

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::RulesConfig;
use crate::grid::{Grid, Position};
use crate::pathfinding::{find_path, reachable_tiles};
use crate::rules::{validate_cast, validate_target};
use crate::sight::castable_cells;
use crate::spells::{EffectKind, Spell};

// ============================================================================
// CONSTANTS
// ============================================================================

pub const DEFAULT_MOVEMENT_POINTS: u32 = 3;
pub const DEFAULT_ACTION_POINTS: u32 = 6;
pub const DEFAULT_MAX_HEALTH: u32 = 100;

/// Seconds spent on each grid step
pub const DEFAULT_STEP_SECONDS: f32 = 0.18;

// ============================================================================
// CORE TYPES
// ============================================================================

/// Which side a combatant fights for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Player,
    Enemy,
}

impl Side {
    pub fn opponent(self) -> Self {
        match self {
            Side::Player => Side::Enemy,
            Side::Enemy => Side::Player,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionState {
    Idle,
    Moving,
}

/// Per-turn resource budget. `current` never exceeds `total`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePool {
    current: u32,
    total: u32,
}

impl ResourcePool {
    pub fn full(total: u32) -> Self {
        Self { current: total, total }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn can_afford(&self, amount: u32) -> bool {
        self.current >= amount
    }

    /// Deduct, flooring at zero
    pub fn spend(&mut self, amount: u32) {
        self.current = self.current.saturating_sub(amount);
    }

    pub fn refill(&mut self) {
        self.current = self.total;
    }
}

// ============================================================================
// COMBATANT
// ============================================================================

#[derive(Clone, Debug)]
pub struct Combatant {
    side: Side,
    position: Position,
    movement: ResourcePool,
    action: ResourcePool,
    health: u32,
    max_health: u32,
    state: MotionState,

    /// Remaining steps of the current move, next step first
    steps: VecDeque<Position>,
    /// Time spent on the current step
    step_elapsed: f32,
    step_seconds: f32,
}

impl Combatant {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Combatant with the stock resources
    pub fn new(side: Side, start: Position) -> Self {
        Self::with_stats(
            side,
            start,
            DEFAULT_MOVEMENT_POINTS,
            DEFAULT_ACTION_POINTS,
            DEFAULT_MAX_HEALTH,
            DEFAULT_STEP_SECONDS,
        )
    }

    pub fn from_config(side: Side, start: Position, config: &RulesConfig) -> Self {
        Self::with_stats(
            side,
            start,
            config.movement_points,
            config.action_points,
            config.max_health,
            config.step_seconds,
        )
    }

    pub fn with_stats(
        side: Side,
        start: Position,
        movement_points: u32,
        action_points: u32,
        max_health: u32,
        step_seconds: f32,
    ) -> Self {
        let step_seconds = if step_seconds.is_finite() && step_seconds > 0.0 {
            step_seconds
        } else {
            tracing::warn!("invalid step duration {}, using {}", step_seconds, DEFAULT_STEP_SECONDS);
            DEFAULT_STEP_SECONDS
        };
        Self {
            side,
            position: start,
            movement: ResourcePool::full(movement_points),
            action: ResourcePool::full(action_points),
            health: max_health,
            max_health,
            state: MotionState::Idle,
            steps: VecDeque::new(),
            step_elapsed: 0.0,
            step_seconds,
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn side(&self) -> Side {
        self.side
    }

    /// Current logical cell (advances one step at a time while moving)
    pub fn position(&self) -> Position {
        self.position
    }

    pub fn state(&self) -> MotionState {
        self.state
    }

    pub fn is_moving(&self) -> bool {
        self.state == MotionState::Moving
    }

    /// Queued steps still to walk
    pub fn steps_remaining(&self) -> usize {
        self.steps.len()
    }

    pub fn queued_steps(&self) -> impl Iterator<Item = Position> + '_ {
        self.steps.iter().copied()
    }

    /// Fraction of the current step already walked, for interpolation
    pub fn step_progress(&self) -> f32 {
        if self.is_moving() {
            (self.step_elapsed / self.step_seconds).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn movement_points(&self) -> ResourcePool {
        self.movement
    }

    pub fn action_points(&self) -> ResourcePool {
        self.action
    }

    pub fn remaining_movement_points(&self) -> u32 {
        self.movement.current()
    }

    pub fn remaining_action_points(&self) -> u32 {
        self.action.current()
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn max_health(&self) -> u32 {
        self.max_health
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Cells reachable with the movement points left
    pub fn reachable_tiles(&self, grid: &Grid) -> Vec<Position> {
        reachable_tiles(grid, self.position, self.movement.current())
    }

    /// Cells `spell` could be aimed at from here, ignoring action points
    pub fn castable_cells(&self, spell: &Spell, grid: &Grid) -> Vec<Position> {
        castable_cells(grid, self.position, spell.min_range, spell.max_range, spell.needs_los)
    }

    // ========================================================================
    // MOVEMENT
    // ========================================================================

    /// Start walking towards `target`.
    ///
    /// The path is cut to the movement points left; every queued step costs
    /// one point when taken. Returns false (and changes nothing) if already
    /// moving, already there, or nothing is left of the path.
    pub fn move_to(&mut self, target: Position, grid: &Grid) -> bool {
        if self.is_moving() || target == self.position {
            return false;
        }

        let mut path = find_path(grid, self.position, target);
        path.truncate(self.movement.current() as usize);
        if path.is_empty() {
            return false;
        }

        self.steps = path.into();
        self.step_elapsed = 0.0;
        self.state = MotionState::Moving;
        true
    }

    /// Advance motion by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        if !self.is_moving() {
            return;
        }

        self.step_elapsed += dt;
        if self.step_elapsed >= self.step_seconds {
            self.step_elapsed = 0.0;
            if let Some(next) = self.steps.pop_front() {
                self.position = next;
                self.movement.spend(1);
            }
        }

        if self.steps.is_empty() {
            self.stop();
        }
    }

    /// Teleport, dropping any queued motion
    pub fn set_position(&mut self, position: Position) {
        self.position = position;
        self.stop();
    }

    fn stop(&mut self) {
        self.steps.clear();
        self.step_elapsed = 0.0;
        self.state = MotionState::Idle;
    }

    // ========================================================================
    // TURN HOOKS
    // ========================================================================

    /// Refill both pools and force Idle. Queued steps are dropped.
    pub fn start_turn(&mut self) {
        self.movement.refill();
        self.action.refill();
        self.stop();
    }

    /// Force Idle. Queued steps are dropped without refund.
    pub fn end_turn(&mut self) {
        self.stop();
    }

    // ========================================================================
    // COMBAT
    // ========================================================================

    /// Action points, range band and (if needed) line of sight all allow it
    pub fn can_cast(&self, spell: &Spell, cell: Position, grid: &Grid) -> bool {
        validate_cast(self, spell, cell, grid).is_ok()
    }

    /// Cast at `target`, which must stand on `cell`. Applies the effect and
    /// pays the cost, or changes nothing and returns false.
    pub fn cast(&mut self, spell: &Spell, cell: Position, grid: &Grid, target: &mut Combatant) -> bool {
        let checked = validate_cast(self, spell, cell, grid).and_then(|_| validate_target(target, cell));
        if let Err(reason) = checked {
            tracing::debug!("{:?} cast {} at {} rejected: {}", self.side, spell.name, cell, reason);
            return false;
        }

        target.receive(spell.effect, spell.magnitude);
        self.action.spend(spell.cost);
        true
    }

    /// Cast on the caster's own cell (spells whose range band includes 0)
    pub fn cast_on_self(&mut self, spell: &Spell, grid: &Grid) -> bool {
        let cell = self.position;
        if let Err(reason) = validate_cast(self, spell, cell, grid) {
            tracing::debug!("{:?} self-cast {} rejected: {}", self.side, spell.name, reason);
            return false;
        }

        self.receive(spell.effect, spell.magnitude);
        self.action.spend(spell.cost);
        true
    }

    /// Free cast on a cell with nobody on it: pays the cost, no effect
    pub fn cast_at_empty_cell(&mut self, spell: &Spell, cell: Position, grid: &Grid) -> bool {
        if let Err(reason) = validate_cast(self, spell, cell, grid) {
            tracing::debug!("{:?} free cast {} at {} rejected: {}", self.side, spell.name, cell, reason);
            return false;
        }

        self.action.spend(spell.cost);
        true
    }

    pub fn receive(&mut self, effect: EffectKind, magnitude: u32) {
        match effect {
            EffectKind::Damage => self.apply_damage(magnitude),
            EffectKind::Heal => self.apply_heal(magnitude),
        }
    }

    /// Lose health, never below zero
    pub fn apply_damage(&mut self, amount: u32) {
        self.set_health(i64::from(self.health) - i64::from(amount));
    }

    /// Regain health, never above the maximum
    pub fn apply_heal(&mut self, amount: u32) {
        self.set_health(i64::from(self.health) + i64::from(amount));
    }

    fn set_health(&mut self, value: i64) {
        self.health = value.clamp(0, i64::from(self.max_health)) as u32;
    }

    pub fn spend_action_points(&mut self, amount: u32) {
        self.action.spend(amount);
    }
}

// ============================================================================
// TESTS
// ============================================================================
