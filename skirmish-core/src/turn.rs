//! Turn sequencing, command handling and AI stepping
//!
//! The turn system owns every combatant in the match. Input (manual or AI)
//! goes through `rules` before anything is mutated, and rejected commands
//! return `false` without side effects.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::ai::{AiAction, GreedyAi};
use crate::combatant::{Combatant, Side};
use crate::config::RulesConfig;
use crate::error::ConfigError;
use crate::grid::{Grid, Position};
use crate::rules::{validate_cast, validate_move, CastRejection, CommandRejection, MoveRejection};
use crate::sight::manhattan_distance;
use crate::spells::{SpellBook, SpellId};

/// Index into the turn order
pub type CombatantId = usize;

// ============================================================================
// CORE TYPES
// ============================================================================

/// Who issues commands for a combatant
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Controller {
    Manual,
    Ai,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Ongoing,
    PlayerWins,
    EnemyWins,
}

/// Something that happened during the match, in order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnEvent {
    TurnStarted {
        round: u32,
        combatant: CombatantId,
        side: Side,
    },
    MoveStarted {
        combatant: CombatantId,
        from: Position,
        to: Position,
    },
    SpellCast {
        combatant: CombatantId,
        spell: String,
        cell: Position,
        target: Option<CombatantId>,
    },
    Defeated {
        combatant: CombatantId,
    },
    TurnEnded {
        combatant: CombatantId,
    },
}

/// Input from outside the engine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    MoveTo(Position),
    /// Index into the current combatant's loadout
    SelectSpell(usize),
    Cast(Position),
    CancelTargeting,
    EndTurn,
}

/// Spell selected for casting, with the cells it can be aimed at
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Targeting {
    spell: SpellId,
    castable: Vec<Position>,
}

impl Targeting {
    pub fn spell(&self) -> SpellId {
        self.spell
    }

    pub fn castable_cells(&self) -> &[Position] {
        &self.castable
    }

    pub fn is_castable(&self, cell: Position) -> bool {
        self.castable.contains(&cell)
    }
}

struct Seat {
    controller: Controller,
    loadout: Vec<SpellId>,
}

// ============================================================================
// TURN SYSTEM
// ============================================================================

pub struct TurnSystem<'a> {
    spells: &'a SpellBook,
    config: RulesConfig,
    ai: GreedyAi,
    player_loadout: Vec<SpellId>,
    enemy_loadout: Vec<SpellId>,

    combatants: Vec<Combatant>,
    seats: Vec<Seat>,
    cursor: usize,
    phase: Side,
    started: bool,
    round: u32,
    targeting: Option<Targeting>,
    outcome: Outcome,
    events: VecDeque<TurnEvent>,
}

impl<'a> TurnSystem<'a> {
    /// Empty match using `config`; fails if the config names unknown spells
    pub fn new(spells: &'a SpellBook, config: RulesConfig) -> Result<Self, ConfigError> {
        config.validate(spells)?;
        let strike = spells
            .id_of(&config.ai_spell)
            .ok_or_else(|| ConfigError::UnknownSpell(config.ai_spell.clone()))?;
        let player_loadout = spells.resolve(&config.player_spells)?;
        let enemy_loadout = spells.resolve(&config.enemy_spells)?;

        Ok(Self {
            spells,
            config,
            ai: GreedyAi::new(strike),
            player_loadout,
            enemy_loadout,
            combatants: Vec::new(),
            seats: Vec::new(),
            cursor: 0,
            phase: Side::Player,
            started: false,
            round: 0,
            targeting: None,
            outcome: Outcome::Ongoing,
            events: VecDeque::new(),
        })
    }

    /// Append to the turn order. The loadout comes from the combatant's side.
    pub fn add_combatant(&mut self, combatant: Combatant, controller: Controller) -> CombatantId {
        let loadout = match combatant.side() {
            Side::Player => self.player_loadout.clone(),
            Side::Enemy => self.enemy_loadout.clone(),
        };
        self.combatants.push(combatant);
        self.seats.push(Seat { controller, loadout });
        self.outcome = self.compute_outcome();
        self.combatants.len() - 1
    }

    /// Add a combatant built from the rules config
    pub fn spawn(&mut self, side: Side, position: Position, controller: Controller) -> CombatantId {
        let combatant = Combatant::from_config(side, position, &self.config);
        self.add_combatant(combatant, controller)
    }

    pub fn set_controller(&mut self, id: CombatantId, controller: Controller) {
        if let Some(seat) = self.seats.get_mut(id) {
            seat.controller = controller;
        }
    }

    // ========================================================================
    // TURN FLOW
    // ========================================================================

    /// Give the first living combatant its turn
    pub fn start_game(&mut self) {
        if self.combatants.is_empty() {
            tracing::error!("start_game called with no combatants");
            return;
        }
        let Some(first) = self.combatants.iter().position(Combatant::is_alive) else {
            tracing::error!("start_game called with no living combatants");
            return;
        };

        self.cursor = first;
        self.round = 1;
        self.started = true;
        self.targeting = None;
        self.begin_turn();
    }

    /// End the current turn and hand over to the next living combatant
    pub fn end_current_turn(&mut self) {
        if !self.started {
            return;
        }

        self.targeting = None;
        self.combatants[self.cursor].end_turn();
        self.push_event(TurnEvent::TurnEnded { combatant: self.cursor });
        tracing::debug!("turn ended for {}", self.cursor);

        let count = self.combatants.len();
        for _ in 0..count {
            self.cursor = (self.cursor + 1) % count;
            if self.cursor == 0 {
                self.round += 1;
            }
            if self.combatants[self.cursor].is_alive() {
                break;
            }
        }

        self.begin_turn();
    }

    fn begin_turn(&mut self) {
        let current = &mut self.combatants[self.cursor];
        current.start_turn();
        self.phase = current.side();
        self.push_event(TurnEvent::TurnStarted {
            round: self.round,
            combatant: self.cursor,
            side: self.phase,
        });
        tracing::info!("round {}: {:?} turn ({})", self.round, self.phase, self.cursor);
    }

    /// Advance one frame: tick the current combatant, then let the AI act if
    /// it controls the current combatant and nothing is in motion
    pub fn update(&mut self, dt: f32, grid: &Grid) {
        if !self.started {
            return;
        }

        self.combatants[self.cursor].update(dt);

        if self.outcome != Outcome::Ongoing {
            return;
        }
        if self.seats[self.cursor].controller == Controller::Ai && !self.combatants[self.cursor].is_moving() {
            self.ai_step(grid);
        }
    }

    fn ai_step(&mut self, grid: &Grid) {
        let actor = self.cursor;
        let Some(target) = self.nearest_opponent(actor) else {
            self.end_current_turn();
            return;
        };
        let Some(strike) = self.spells.get(self.ai.strike) else {
            tracing::error!("AI spell {} missing from catalog", self.ai.strike);
            self.end_current_turn();
            return;
        };

        let occupied = self.occupied_cells(actor);
        let action = self.ai.decide(
            &self.combatants[actor],
            &self.combatants[target],
            grid,
            strike,
            &occupied,
        );
        tracing::debug!("AI {} decided {:?}", actor, action);

        match action {
            AiAction::Cast { spell, cell } => {
                if let Err(reason) = self.perform_cast(actor, spell, cell, grid) {
                    tracing::debug!("AI cast rejected: {}", reason);
                }
                self.end_current_turn();
            }
            AiAction::MoveTo(cell) => {
                if let Err(reason) = self.perform_move(actor, cell, grid) {
                    tracing::debug!("AI move rejected: {}", reason);
                    self.end_current_turn();
                }
            }
            AiAction::EndTurn => self.end_current_turn(),
        }
    }

    // ========================================================================
    // COMMANDS
    // ========================================================================

    /// Dispatch a command for the current combatant
    pub fn submit(&mut self, command: Command, grid: &Grid) -> bool {
        match command {
            Command::MoveTo(cell) => self.move_to(cell, grid),
            Command::SelectSpell(index) => self.select_spell(index, grid),
            Command::Cast(cell) => self.cast(cell, grid),
            Command::CancelTargeting => self.cancel_targeting(),
            Command::EndTurn => self.end_turn(),
        }
    }

    /// Walk the current combatant to a reachable, unoccupied cell
    pub fn move_to(&mut self, cell: Position, grid: &Grid) -> bool {
        let result = self.manual_actor().and_then(|actor| {
            if self.targeting.is_some() {
                return Err(MoveRejection::Targeting.into());
            }
            self.perform_move(actor, cell, grid)
        });
        report("move", result)
    }

    /// Enter targeting for the loadout spell at `index`; selecting the
    /// active spell again leaves targeting
    pub fn select_spell(&mut self, index: usize, grid: &Grid) -> bool {
        let result = self.manual_actor().and_then(|actor| {
            let spell = *self.seats[actor]
                .loadout
                .get(index)
                .ok_or(CommandRejection::Cast(CastRejection::UnknownSpell))?;

            if self.targeting.as_ref().is_some_and(|t| t.spell == spell) {
                self.targeting = None;
                return Ok(());
            }
            if self.combatants[actor].is_moving() {
                return Err(MoveRejection::AlreadyMoving.into());
            }

            let definition = self.spells.get(spell).ok_or(CastRejection::UnknownSpell)?;
            let castable = self.combatants[actor].castable_cells(definition, grid);
            tracing::debug!("targeting {} with {} castable cells", definition.name, castable.len());
            self.targeting = Some(Targeting { spell, castable });
            Ok(())
        });
        report("select spell", result)
    }

    /// Cast the selected spell at `cell`
    pub fn cast(&mut self, cell: Position, grid: &Grid) -> bool {
        let result = self.manual_actor().and_then(|actor| {
            let spell = self.targeting.as_ref().ok_or(CastRejection::NotTargeting)?.spell;
            self.perform_cast(actor, spell, cell, grid)?;

            let cost = self.spells.get(spell).map_or(0, |s| s.cost);
            if self.combatants[actor].remaining_action_points() < cost || self.outcome != Outcome::Ongoing {
                self.targeting = None;
            }
            Ok(())
        });
        report("cast", result)
    }

    pub fn cancel_targeting(&mut self) -> bool {
        if self.targeting.take().is_some() {
            true
        } else {
            report("cancel targeting", Err(CastRejection::NotTargeting.into()))
        }
    }

    /// End the current turn on behalf of a manual combatant
    pub fn end_turn(&mut self) -> bool {
        let result = self.manual_actor().and_then(|_| {
            if self.targeting.is_some() {
                return Err(CommandRejection::Targeting);
            }
            self.end_current_turn();
            Ok(())
        });
        report("end turn", result)
    }

    fn manual_actor(&self) -> Result<CombatantId, CommandRejection> {
        if !self.started {
            return Err(CommandRejection::NotYourTurn);
        }
        if self.outcome != Outcome::Ongoing {
            return Err(CommandRejection::MatchOver);
        }
        if self.seats[self.cursor].controller != Controller::Manual {
            return Err(CommandRejection::NotYourTurn);
        }
        if !self.combatants[self.cursor].is_alive() {
            return Err(CommandRejection::Defeated);
        }
        Ok(self.cursor)
    }

    // ========================================================================
    // EXECUTION (shared by commands and AI)
    // ========================================================================

    fn perform_move(&mut self, actor: CombatantId, cell: Position, grid: &Grid) -> Result<(), CommandRejection> {
        let occupied = self.occupied_cells(actor);
        validate_move(&self.combatants[actor], cell, grid, &occupied)?;

        let from = self.combatants[actor].position();
        if !self.combatants[actor].move_to(cell, grid) {
            tracing::error!("validated move {} -> {} did not start", from, cell);
            return Err(MoveRejection::Unreachable(cell).into());
        }

        self.push_event(TurnEvent::MoveStarted {
            combatant: actor,
            from,
            to: cell,
        });
        tracing::debug!("{} moving {} -> {}", actor, from, cell);
        Ok(())
    }

    fn perform_cast(
        &mut self,
        actor: CombatantId,
        spell_id: SpellId,
        cell: Position,
        grid: &Grid,
    ) -> Result<(), CommandRejection> {
        if !self.seats[actor].loadout.contains(&spell_id) {
            return Err(CastRejection::UnknownSpell.into());
        }
        let spell = self.spells.get(spell_id).ok_or(CastRejection::UnknownSpell)?;
        validate_cast(&self.combatants[actor], spell, cell, grid)?;

        let target = self.living_at(cell);
        let applied = match target {
            Some(t) if t == actor => self.combatants[actor].cast_on_self(spell, grid),
            Some(t) => {
                let (caster, victim) = pair_mut(&mut self.combatants, actor, t);
                caster.cast(spell, cell, grid, victim)
            }
            None => self.combatants[actor].cast_at_empty_cell(spell, cell, grid),
        };
        if !applied {
            tracing::error!("validated cast of {} at {} was not applied", spell.name, cell);
            return Err(CastRejection::TargetNotAtCell(cell).into());
        }

        let name = spell.name.clone();
        tracing::info!("{} casts {} at {} (target {:?})", actor, name, cell, target);
        self.push_event(TurnEvent::SpellCast {
            combatant: actor,
            spell: name,
            cell,
            target,
        });

        if let Some(t) = target {
            if !self.combatants[t].is_alive() {
                self.push_event(TurnEvent::Defeated { combatant: t });
                tracing::info!("{} defeated", t);
            }
        }
        self.outcome = self.compute_outcome();
        if self.outcome != Outcome::Ongoing {
            tracing::info!("match over: {:?}", self.outcome);
        }
        Ok(())
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn spells(&self) -> &SpellBook {
        self.spells
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    pub fn combatants(&self) -> &[Combatant] {
        &self.combatants
    }

    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.get(id)
    }

    pub fn controller(&self, id: CombatantId) -> Option<Controller> {
        self.seats.get(id).map(|s| s.controller)
    }

    pub fn loadout(&self, id: CombatantId) -> &[SpellId] {
        self.seats.get(id).map_or(&[], |s| s.loadout.as_slice())
    }

    pub fn current_id(&self) -> CombatantId {
        self.cursor
    }

    pub fn current(&self) -> Option<&Combatant> {
        self.combatants.get(self.cursor)
    }

    /// Side whose turn it is
    pub fn phase(&self) -> Side {
        self.phase
    }

    pub fn is_player_turn(&self) -> bool {
        self.started && self.phase == Side::Player
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn targeting(&self) -> Option<&Targeting> {
        self.targeting.as_ref()
    }

    /// Cells the current combatant could move to right now, for display
    pub fn current_reachable_tiles(&self, grid: &Grid) -> Vec<Position> {
        match self.current() {
            Some(c) if self.started && !c.is_moving() && self.targeting.is_none() => c.reachable_tiles(grid),
            _ => Vec::new(),
        }
    }

    pub fn events(&self) -> impl Iterator<Item = &TurnEvent> {
        self.events.iter()
    }

    /// Remove and return all recorded events
    pub fn drain_events(&mut self) -> Vec<TurnEvent> {
        self.events.drain(..).collect()
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    fn compute_outcome(&self) -> Outcome {
        let alive = |side: Side| self.combatants.iter().any(|c| c.side() == side && c.is_alive());
        match (alive(Side::Player), alive(Side::Enemy)) {
            (true, true) => Outcome::Ongoing,
            (false, _) => Outcome::EnemyWins,
            (true, false) => Outcome::PlayerWins,
        }
    }

    /// Closest living combatant of the other side; first on ties
    fn nearest_opponent(&self, actor: CombatantId) -> Option<CombatantId> {
        let me = &self.combatants[actor];
        self.combatants
            .iter()
            .enumerate()
            .filter(|(_, c)| c.side() != me.side() && c.is_alive())
            .min_by_key(|(i, c)| (manhattan_distance(me.position(), c.position()), *i))
            .map(|(i, _)| i)
    }

    /// Cells held by living combatants other than `actor`
    fn occupied_cells(&self, actor: CombatantId) -> Vec<Position> {
        self.combatants
            .iter()
            .enumerate()
            .filter(|&(i, c)| i != actor && c.is_alive())
            .map(|(_, c)| c.position())
            .collect()
    }

    fn living_at(&self, cell: Position) -> Option<CombatantId> {
        self.combatants.iter().position(|c| c.is_alive() && c.position() == cell)
    }

    fn push_event(&mut self, event: TurnEvent) {
        let capacity = self.config.event_log_capacity;
        if capacity == 0 {
            return;
        }
        while self.events.len() >= capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

fn report(what: &str, result: Result<(), CommandRejection>) -> bool {
    match result {
        Ok(()) => true,
        Err(reason) => {
            tracing::debug!("{} rejected: {}", what, reason);
            false
        }
    }
}

/// Two distinct mutable borrows out of one slice
fn pair_mut(combatants: &mut [Combatant], a: usize, b: usize) -> (&mut Combatant, &mut Combatant) {
    if a < b {
        let (left, right) = combatants.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = combatants.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

// ============================================================================
// TESTS
// ============================================================================
