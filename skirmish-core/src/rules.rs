//! Command validation shared by player input and the AI
//!
//! Every move or cast, whoever issues it, is checked here before any state
//! changes. Rejections are plain values; callers log them and report `false`.

use crate::combatant::Combatant;
use crate::grid::{Grid, Position};
use crate::pathfinding::reachable_tiles;
use crate::sight::{has_line_of_sight, manhattan_distance};
use crate::spells::Spell;

/// Why a move command was refused
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MoveRejection {
    #[error("already moving")]
    AlreadyMoving,
    #[error("already standing on {0}")]
    SameCell(Position),
    #[error("no movement points left")]
    NoMovementPoints,
    #[error("{0} is occupied")]
    Occupied(Position),
    #[error("{0} is not reachable this turn")]
    Unreachable(Position),
    #[error("cannot move while targeting")]
    Targeting,
}

/// Why a cast was refused
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CastRejection {
    #[error("needs {need} action points, has {have}")]
    NotEnoughActionPoints { have: u32, need: u32 },
    #[error("target at distance {distance}, range is {min}..={max}")]
    OutOfRange { distance: i32, min: i32, max: i32 },
    #[error("no line of sight to {0}")]
    NoLineOfSight(Position),
    #[error("target is not standing on {0}")]
    TargetNotAtCell(Position),
    #[error("spell is not in the caster's loadout")]
    UnknownSpell,
    #[error("no spell selected")]
    NotTargeting,
}

/// Why a command was refused at the turn level
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CommandRejection {
    #[error("not this side's turn")]
    NotYourTurn,
    #[error("the match is over")]
    MatchOver,
    #[error("the current combatant is defeated")]
    Defeated,
    #[error("finish or cancel targeting first")]
    Targeting,
    #[error(transparent)]
    Move(#[from] MoveRejection),
    #[error(transparent)]
    Cast(#[from] CastRejection),
}

/// Resource, range and line-of-sight checks for casting `spell` at `cell`
pub fn validate_cast(caster: &Combatant, spell: &Spell, cell: Position, grid: &Grid) -> Result<(), CastRejection> {
    let have = caster.remaining_action_points();
    if have < spell.cost {
        return Err(CastRejection::NotEnoughActionPoints { have, need: spell.cost });
    }

    let distance = manhattan_distance(caster.position(), cell);
    if distance < spell.min_range || distance > spell.max_range {
        return Err(CastRejection::OutOfRange {
            distance,
            min: spell.min_range,
            max: spell.max_range,
        });
    }

    if spell.needs_los && !has_line_of_sight(grid, caster.position(), cell) {
        return Err(CastRejection::NoLineOfSight(cell));
    }

    Ok(())
}

/// The effect-bearing cast needs its target on the aimed cell
pub fn validate_target(target: &Combatant, cell: Position) -> Result<(), CastRejection> {
    if target.position() == cell {
        Ok(())
    } else {
        Err(CastRejection::TargetNotAtCell(cell))
    }
}

/// Checks for a player or AI move command.
///
/// Stricter than `Combatant::move_to`: the destination must be reachable with
/// the points left this turn and not held by another combatant.
pub fn validate_move(
    mover: &Combatant,
    target: Position,
    grid: &Grid,
    occupied: &[Position],
) -> Result<(), MoveRejection> {
    if mover.is_moving() {
        return Err(MoveRejection::AlreadyMoving);
    }
    if target == mover.position() {
        return Err(MoveRejection::SameCell(target));
    }
    if mover.remaining_movement_points() == 0 {
        return Err(MoveRejection::NoMovementPoints);
    }
    if occupied.contains(&target) {
        return Err(MoveRejection::Occupied(target));
    }
    if !reachable_tiles(grid, mover.position(), mover.remaining_movement_points()).contains(&target) {
        return Err(MoveRejection::Unreachable(target));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::Side;
    use crate::spells::{SpellBook, ARROW, STRIKE};

    #[test]
    fn test_cast_needs_action_points() {
        let book = SpellBook::standard();
        let strike = book.by_name(STRIKE).unwrap();
        let grid = Grid::new();
        let mut caster = Combatant::new(Side::Player, Position::new(5, 5));
        caster.spend_action_points(4);

        // Adjacent, clear, but 2 AP < 3
        assert_eq!(
            validate_cast(&caster, strike, Position::new(6, 5), &grid),
            Err(CastRejection::NotEnoughActionPoints { have: 2, need: 3 })
        );
    }

    #[test]
    fn test_cast_range_band() {
        let book = SpellBook::standard();
        let arrow = book.by_name(ARROW).unwrap();
        let grid = Grid::new();
        let caster = Combatant::new(Side::Player, Position::new(5, 5));

        assert!(matches!(
            validate_cast(&caster, arrow, Position::new(6, 5), &grid),
            Err(CastRejection::OutOfRange { distance: 1, .. })
        ));
        assert!(matches!(
            validate_cast(&caster, arrow, Position::new(11, 5), &grid),
            Err(CastRejection::OutOfRange { distance: 6, .. })
        ));
        assert!(validate_cast(&caster, arrow, Position::new(8, 7), &grid).is_ok());
    }

    #[test]
    fn test_cast_line_of_sight() {
        let book = SpellBook::standard();
        let strike = book.by_name(STRIKE).unwrap();
        let mut grid = Grid::new();
        grid.set_blocked(6, 5, true);
        let caster = Combatant::new(Side::Enemy, Position::new(5, 5));

        assert_eq!(
            validate_cast(&caster, strike, Position::new(7, 5), &grid),
            Err(CastRejection::NoLineOfSight(Position::new(7, 5)))
        );
    }

    #[test]
    fn test_move_checks() {
        let mut grid = Grid::new();
        grid.set_blocked(2, 0, true);
        let mover = Combatant::new(Side::Player, Position::new(0, 0));

        assert_eq!(
            validate_move(&mover, Position::new(0, 0), &grid, &[]),
            Err(MoveRejection::SameCell(Position::new(0, 0)))
        );
        assert_eq!(
            validate_move(&mover, Position::new(1, 0), &grid, &[Position::new(1, 0)]),
            Err(MoveRejection::Occupied(Position::new(1, 0)))
        );
        assert_eq!(
            validate_move(&mover, Position::new(2, 0), &grid, &[]),
            Err(MoveRejection::Unreachable(Position::new(2, 0)))
        );
        assert_eq!(
            validate_move(&mover, Position::new(4, 0), &grid, &[]),
            Err(MoveRejection::Unreachable(Position::new(4, 0)))
        );
        assert!(validate_move(&mover, Position::new(1, 2), &grid, &[]).is_ok());
    }
}
