//! Headless match driver shared by `duel` and `batch`

use anyhow::Result;
use serde::Serialize;

use skirmish_core::{Controller, Grid, Outcome, Position, RulesConfig, Side, SpellBook, TurnEvent, TurnSystem};

/// Simulated frame length in seconds
pub const FRAME_SECONDS: f32 = 1.0 / 60.0;

/// Upper bound on frames per round, as a guard against stalls
const FRAMES_PER_ROUND: u64 = 10_000;

#[derive(Clone, Copy, Debug)]
pub struct MatchSetup {
    pub player: Position,
    pub enemy: Position,
    pub max_rounds: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct MatchRecord {
    pub outcome: Outcome,
    pub rounds: u32,
    pub frames: u64,
    pub player_health: u32,
    pub enemy_health: u32,
    pub events: Vec<TurnEvent>,
}

/// Play one AI vs AI match to completion or the round limit
pub fn play_match(grid: &Grid, spells: &SpellBook, config: &RulesConfig, setup: &MatchSetup) -> Result<MatchRecord> {
    let mut turns = TurnSystem::new(spells, config.clone())?;
    let player = turns.spawn(Side::Player, setup.player, Controller::Ai);
    let enemy = turns.spawn(Side::Enemy, setup.enemy, Controller::Ai);
    turns.start_game();

    let max_frames = u64::from(setup.max_rounds.max(1)) * FRAMES_PER_ROUND;
    let mut frames = 0;
    while turns.outcome() == Outcome::Ongoing && turns.round() <= setup.max_rounds && frames < max_frames {
        turns.update(FRAME_SECONDS, grid);
        frames += 1;
    }
    if frames >= max_frames {
        tracing::warn!("match stopped after {} frames without finishing", frames);
    }

    let health = |id| turns.combatant(id).map_or(0, |c| c.health());
    Ok(MatchRecord {
        outcome: turns.outcome(),
        rounds: turns.round().min(setup.max_rounds),
        frames,
        player_health: health(player),
        enemy_health: health(enemy),
        events: turns.drain_events(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_grid_match_finishes() {
        let grid = Grid::new();
        let spells = SpellBook::standard();
        let setup = MatchSetup {
            player: Position::new(1, 7),
            enemy: Position::new(13, 7),
            max_rounds: 50,
        };
        let record = play_match(&grid, &spells, &RulesConfig::default(), &setup).unwrap();
        assert_ne!(record.outcome, Outcome::Ongoing);
        assert!(record.player_health == 0 || record.enemy_health == 0);
        assert!(!record.events.is_empty());
    }

    #[test]
    fn test_round_limit_gives_draw() {
        let mut grid = Grid::new();
        // Wall off the two halves
        for y in 0..15 {
            grid.set_blocked(7, y, true);
        }
        let spells = SpellBook::standard();
        let setup = MatchSetup {
            player: Position::new(1, 7),
            enemy: Position::new(13, 7),
            max_rounds: 5,
        };
        let record = play_match(&grid, &spells, &RulesConfig::default(), &setup).unwrap();
        assert_eq!(record.outcome, Outcome::Ongoing);
        assert_eq!(record.rounds, 5);
        assert_eq!(record.player_health, 100);
    }
}
