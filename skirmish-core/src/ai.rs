//! Greedy combat AI
//!
//! One decision per call: strike if the target is castable, otherwise step to
//! the reachable cell closest to the target, otherwise end the turn. No
//! lookahead and no randomness.

use crate::combatant::Combatant;
use crate::grid::{Grid, Position};
use crate::rules::{validate_cast, validate_target};
use crate::sight::manhattan_distance;
use crate::spells::{Spell, SpellId};

// ============================================================================
// CORE TYPES
// ============================================================================

/// What the AI wants to do next
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AiAction {
    Cast { spell: SpellId, cell: Position },
    MoveTo(Position),
    EndTurn,
}

/// Attack-if-possible, else approach
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GreedyAi {
    /// Spell used to attack
    pub strike: SpellId,
}

impl GreedyAi {
    pub fn new(strike: SpellId) -> Self {
        Self { strike }
    }

    /// Choose the next action for `actor` against `target`.
    ///
    /// `occupied` holds the cells of every other living combatant; they are
    /// never chosen as a destination.
    pub fn decide(
        &self,
        actor: &Combatant,
        target: &Combatant,
        grid: &Grid,
        strike: &Spell,
        occupied: &[Position],
    ) -> AiAction {
        if !actor.is_alive() || !target.is_alive() {
            return AiAction::EndTurn;
        }

        let cell = target.position();
        let strike_ok = validate_cast(actor, strike, cell, grid).and_then(|_| validate_target(target, cell));
        match strike_ok {
            Ok(()) => return AiAction::Cast { spell: self.strike, cell },
            Err(reason) => tracing::debug!("{:?} cannot strike: {}", actor.side(), reason),
        }

        if actor.remaining_movement_points() == 0 {
            return AiAction::EndTurn;
        }

        match closest_reachable(actor, cell, grid, occupied) {
            Some(best) if best != actor.position() => AiAction::MoveTo(best),
            _ => AiAction::EndTurn,
        }
    }
}

/// First reachable, unoccupied cell minimising Manhattan distance to `goal`.
/// Ties go to the earliest cell in reachability order, which starts at the
/// actor's own cell.
fn closest_reachable(actor: &Combatant, goal: Position, grid: &Grid, occupied: &[Position]) -> Option<Position> {
    let mut best: Option<(i32, Position)> = None;
    for tile in actor.reachable_tiles(grid) {
        if tile != actor.position() && occupied.contains(&tile) {
            continue;
        }
        let distance = manhattan_distance(tile, goal);
        if best.map_or(true, |(d, _)| distance < d) {
            best = Some((distance, tile));
        }
    }
    best.map(|(_, tile)| tile)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::Side;
    use crate::spells::{SpellBook, STRIKE};

    fn setup() -> (SpellBook, GreedyAi) {
        let book = SpellBook::standard();
        let ai = GreedyAi::new(book.id_of(STRIKE).unwrap());
        (book, ai)
    }

    #[test]
    fn test_adjacent_enemy_strikes() {
        let (book, ai) = setup();
        let grid = Grid::new();
        let enemy = Combatant::new(Side::Enemy, Position::new(5, 5));
        let player = Combatant::new(Side::Player, Position::new(5, 6));
        let strike = book.get(ai.strike).unwrap();

        let action = ai.decide(&enemy, &player, &grid, strike, &[player.position()]);
        assert_eq!(
            action,
            AiAction::Cast {
                spell: ai.strike,
                cell: Position::new(5, 6)
            }
        );
    }

    #[test]
    fn test_far_enemy_approaches() {
        let (book, ai) = setup();
        let grid = Grid::new();
        let enemy = Combatant::new(Side::Enemy, Position::new(0, 0));
        let player = Combatant::new(Side::Player, Position::new(10, 0));
        let strike = book.get(ai.strike).unwrap();

        let action = ai.decide(&enemy, &player, &grid, strike, &[player.position()]);
        // Three steps straight along the row is the only distance-7 cell
        assert_eq!(action, AiAction::MoveTo(Position::new(3, 0)));
    }

    #[test]
    fn test_blocked_sight_approaches_instead() {
        let (book, ai) = setup();
        let mut grid = Grid::new();
        grid.set_blocked(5, 6, true);
        let enemy = Combatant::new(Side::Enemy, Position::new(5, 5));
        let player = Combatant::new(Side::Player, Position::new(5, 7));
        let strike = book.get(ai.strike).unwrap();

        match ai.decide(&enemy, &player, &grid, strike, &[player.position()]) {
            AiAction::MoveTo(cell) => {
                assert_ne!(cell, player.position());
                assert!(manhattan_distance(cell, player.position()) < 2);
            }
            other => panic!("expected a move, got {:?}", other),
        }
    }

    #[test]
    fn test_no_points_ends_turn() {
        let (book, ai) = setup();
        let grid = Grid::new();
        let mut enemy = Combatant::with_stats(Side::Enemy, Position::new(0, 0), 0, 6, 100, 0.18);
        let player = Combatant::new(Side::Player, Position::new(9, 9));
        let strike = book.get(ai.strike).unwrap();

        assert_eq!(ai.decide(&enemy, &player, &grid, strike, &[]), AiAction::EndTurn);

        // In range but out of action points, and nowhere to go
        enemy.set_position(Position::new(9, 8));
        enemy.spend_action_points(4);
        assert_eq!(ai.decide(&enemy, &player, &grid, strike, &[]), AiAction::EndTurn);
    }

    #[test]
    fn test_no_improving_move_ends_turn() {
        let (book, ai) = setup();
        let mut grid = Grid::new();
        // Enemy boxed in a dead end facing away from the player
        grid.set_blocked(1, 0, true);
        grid.set_blocked(1, 1, true);
        let mut enemy = Combatant::new(Side::Enemy, Position::new(0, 0));
        enemy.spend_action_points(6);
        let player = Combatant::new(Side::Player, Position::new(14, 0));
        let strike = book.get(ai.strike).unwrap();

        // Moving down only increases the distance
        assert_eq!(ai.decide(&enemy, &player, &grid, strike, &[]), AiAction::EndTurn);
    }

    #[test]
    fn test_occupied_cells_skipped() {
        let (book, ai) = setup();
        let grid = Grid::new();
        let mut enemy = Combatant::new(Side::Enemy, Position::new(0, 0));
        enemy.spend_action_points(6);
        let player = Combatant::new(Side::Player, Position::new(5, 0));
        let strike = book.get(ai.strike).unwrap();

        let blocker = Position::new(3, 0);
        match ai.decide(&enemy, &player, &grid, strike, &[player.position(), blocker]) {
            AiAction::MoveTo(cell) => {
                assert_ne!(cell, blocker);
                assert_eq!(manhattan_distance(cell, player.position()), 3);
            }
            other => panic!("expected a move, got {:?}", other),
        }
    }

    #[test]
    fn test_dead_target_ends_turn() {
        let (book, ai) = setup();
        let grid = Grid::new();
        let enemy = Combatant::new(Side::Enemy, Position::new(5, 5));
        let mut player = Combatant::new(Side::Player, Position::new(5, 6));
        player.apply_damage(1000);
        let strike = book.get(ai.strike).unwrap();

        assert_eq!(ai.decide(&enemy, &player, &grid, strike, &[]), AiAction::EndTurn);
    }
}
