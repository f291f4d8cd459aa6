//! Reachability and shortest paths on the grid
//!
//! - `reachable_tiles`: uniform-cost search under a movement-point budget
//! - `find_path`: A* with the Manhattan heuristic
//!
//! Both walk the four orthogonal neighbors and only enter in-bounds, unblocked
//! cells. Every step currently costs one movement point; the `_with` variants
//! take a per-edge cost function so weighted terrain can be plugged in later.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::grid::{Grid, Position};

/// Movement cost in movement points
pub type MoveCost = u32;

/// Cost of one orthogonal step on open ground
pub const STEP_COST: MoveCost = 1;

/// Default edge cost: one point per step
pub fn unit_step_cost(_from: Position, _to: Position) -> Option<MoveCost> {
    Some(STEP_COST)
}

// ============================================================================
// REACHABILITY
// ============================================================================

/// Every cell reachable from `start` for at most `budget` points, start included.
///
/// Cells come out in the order the search settles them: by cost, then
/// row-major position.
pub fn reachable_tiles(grid: &Grid, start: Position, budget: MoveCost) -> Vec<Position> {
    settle(grid, start, budget, unit_step_cost).0
}

/// Cheapest cost to every reachable cell under a custom edge cost.
///
/// `step_cost` returns `None` for an impassable edge.
pub fn reachable_costs_with<F>(
    grid: &Grid,
    start: Position,
    budget: MoveCost,
    step_cost: F,
) -> FxHashMap<Position, MoveCost>
where
    F: Fn(Position, Position) -> Option<MoveCost>,
{
    settle(grid, start, budget, step_cost).1
}

fn settle<F>(
    grid: &Grid,
    start: Position,
    budget: MoveCost,
    step_cost: F,
) -> (Vec<Position>, FxHashMap<Position, MoveCost>)
where
    F: Fn(Position, Position) -> Option<MoveCost>,
{
    let mut dist: FxHashMap<Position, MoveCost> = FxHashMap::default();
    let mut settled: FxHashSet<Position> = FxHashSet::default();
    let mut order = Vec::new();
    let mut queue: BinaryHeap<Reverse<(MoveCost, Position)>> = BinaryHeap::new();

    dist.insert(start, 0);
    queue.push(Reverse((0, start)));

    while let Some(Reverse((cost, pos))) = queue.pop() {
        // Stale entry: a cheaper route was already recorded
        if cost > dist.get(&pos).copied().unwrap_or(MoveCost::MAX) {
            continue;
        }
        if !settled.insert(pos) {
            continue;
        }
        order.push(pos);

        for next in pos.neighbors() {
            if !grid.is_walkable(next) {
                continue;
            }
            let Some(step) = step_cost(pos, next) else {
                continue;
            };

            let new_cost = cost.saturating_add(step);
            if new_cost > budget {
                continue;
            }

            let best = dist.get(&next).copied().unwrap_or(MoveCost::MAX);
            if new_cost < best {
                dist.insert(next, new_cost);
                queue.push(Reverse((new_cost, next)));
            }
        }
    }

    (order, dist)
}

// ============================================================================
// SHORTEST PATH
// ============================================================================

/// Shortest path from `start` to `end` with unit step costs.
///
/// The result excludes `start` and ends with `end`. It is empty when no path
/// exists, when `end` is blocked, or when `start == end`.
pub fn find_path(grid: &Grid, start: Position, end: Position) -> Vec<Position> {
    find_path_with(grid, start, end, unit_step_cost)
}

/// A* search with a custom edge cost.
///
/// Edge costs must be at least 1 for the Manhattan heuristic to stay
/// admissible. Among open nodes with equal f-cost the one closer to `end`
/// (lower heuristic) is expanded first.
pub fn find_path_with<F>(grid: &Grid, start: Position, end: Position, step_cost: F) -> Vec<Position>
where
    F: Fn(Position, Position) -> Option<MoveCost>,
{
    if start == end || !grid.is_walkable(end) {
        return Vec::new();
    }

    let heuristic = |p: Position| p.distance_to(end) as MoveCost;

    let mut g_cost: FxHashMap<Position, MoveCost> = FxHashMap::default();
    let mut parent: FxHashMap<Position, Position> = FxHashMap::default();
    let mut closed: FxHashSet<Position> = FxHashSet::default();
    // (f, h, position) - min-heap via Reverse
    let mut open: BinaryHeap<Reverse<(MoveCost, MoveCost, Position)>> = BinaryHeap::new();

    g_cost.insert(start, 0);
    open.push(Reverse((heuristic(start), heuristic(start), start)));

    while let Some(Reverse((_, _, current))) = open.pop() {
        if current == end {
            return reconstruct_path(&parent, start, end);
        }
        if !closed.insert(current) {
            continue;
        }

        let current_g = g_cost.get(&current).copied().unwrap_or(MoveCost::MAX);

        for next in current.neighbors() {
            if closed.contains(&next) || !grid.is_walkable(next) {
                continue;
            }
            let Some(step) = step_cost(current, next) else {
                continue;
            };

            let tentative = current_g.saturating_add(step);
            if tentative < g_cost.get(&next).copied().unwrap_or(MoveCost::MAX) {
                g_cost.insert(next, tentative);
                parent.insert(next, current);
                let h = heuristic(next);
                open.push(Reverse((tentative.saturating_add(h), h, next)));
            }
        }
    }

    Vec::new()
}

/// Walk parent links back from `end`. A broken chain yields an empty path.
fn reconstruct_path(
    parent: &FxHashMap<Position, Position>,
    start: Position,
    end: Position,
) -> Vec<Position> {
    let mut path = vec![end];
    let mut node = end;

    while node != start {
        match parent.get(&node) {
            Some(&prev) => {
                node = prev;
                if node != start {
                    path.push(node);
                }
            }
            None => {
                tracing::error!("path reconstruction: no parent for {} (start {}, end {})", node, start, end);
                return Vec::new();
            }
        }

        if path.len() > parent.len() + 1 {
            tracing::error!("path reconstruction: parent cycle between {} and {}", start, end);
            return Vec::new();
        }
    }

    path.reverse();
    path
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::VecDeque;

    /// Plain BFS distances, used as ground truth
    fn bfs_distances(grid: &Grid, start: Position) -> FxHashMap<Position, u32> {
        let mut dist = FxHashMap::default();
        let mut queue = VecDeque::new();
        dist.insert(start, 0);
        queue.push_back(start);
        while let Some(pos) = queue.pop_front() {
            let d = dist[&pos];
            for next in pos.neighbors() {
                if grid.is_walkable(next) && !dist.contains_key(&next) {
                    dist.insert(next, d + 1);
                    queue.push_back(next);
                }
            }
        }
        dist
    }

    fn random_grid(seed: u64, density: f64) -> Grid {
        let mut grid = Grid::new();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        grid.scatter_obstacles(&mut rng, density, &[Position::new(0, 0), Position::new(7, 7)]);
        grid
    }

    #[test]
    fn test_reachable_open_grid() {
        let grid = Grid::new();
        let tiles = reachable_tiles(&grid, Position::new(7, 7), 3);
        // Diamond of radius 3: 1 + 4 + 8 + 12
        assert_eq!(tiles.len(), 25);
        assert_eq!(tiles[0], Position::new(7, 7));
    }

    #[test]
    fn test_reachable_zero_budget() {
        let grid = Grid::new();
        assert_eq!(reachable_tiles(&grid, Position::new(3, 3), 0), vec![Position::new(3, 3)]);
    }

    #[test]
    fn test_reachable_respects_walls() {
        let mut grid = Grid::new();
        // Wall off (0,0) except through (0,1)
        grid.set_blocked(1, 0, true);
        grid.set_blocked(1, 1, true);
        let tiles = reachable_tiles(&grid, Position::new(0, 0), 2);
        assert!(tiles.contains(&Position::new(0, 1)));
        assert!(tiles.contains(&Position::new(0, 2)));
        assert!(!tiles.contains(&Position::new(1, 0)));
        assert!(!tiles.contains(&Position::new(2, 0)));
    }

    #[test]
    fn test_reachable_matches_bfs() {
        for seed in 0..20 {
            let grid = random_grid(seed, 0.3);
            let start = Position::new(7, 7);
            let truth = bfs_distances(&grid, start);
            for budget in [0, 1, 3, 6] {
                let mut tiles = reachable_tiles(&grid, start, budget);
                assert!(tiles.contains(&start));
                tiles.sort();
                let mut expected: Vec<_> = truth
                    .iter()
                    .filter(|(_, &d)| d <= budget)
                    .map(|(&p, _)| p)
                    .collect();
                expected.sort();
                assert_eq!(tiles, expected, "seed {} budget {}", seed, budget);
            }
        }
    }

    #[test]
    fn test_weighted_costs() {
        let grid = Grid::with_size(3, 1);
        let mud = Position::new(1, 0);
        let costs = reachable_costs_with(&grid, Position::new(0, 0), 10, |_, to| {
            Some(if to == mud { 3 } else { 1 })
        });
        assert_eq!(costs[&mud], 3);
        assert_eq!(costs[&Position::new(2, 0)], 4);
    }

    #[test]
    fn test_find_path_straight() {
        let grid = Grid::new();
        let path = find_path(&grid, Position::new(0, 0), Position::new(3, 0));
        assert_eq!(
            path,
            vec![Position::new(1, 0), Position::new(2, 0), Position::new(3, 0)]
        );
    }

    #[test]
    fn test_find_path_degenerate() {
        let mut grid = Grid::new();
        assert!(find_path(&grid, Position::new(2, 2), Position::new(2, 2)).is_empty());

        grid.set_blocked(5, 5, true);
        assert!(find_path(&grid, Position::new(2, 2), Position::new(5, 5)).is_empty());
        assert!(find_path(&grid, Position::new(2, 2), Position::new(-1, 5)).is_empty());
    }

    #[test]
    fn test_find_path_disconnected() {
        let mut grid = Grid::new();
        for y in 0..15 {
            grid.set_blocked(7, y, true);
        }
        assert!(find_path(&grid, Position::new(0, 0), Position::new(14, 0)).is_empty());
    }

    #[test]
    fn test_find_path_is_shortest_and_adjacent() {
        for seed in 0..30 {
            let grid = random_grid(seed, 0.25);
            let start = Position::new(0, 0);
            let truth = bfs_distances(&grid, start);

            for goal in [Position::new(14, 14), Position::new(7, 7), Position::new(3, 12)] {
                let path = find_path(&grid, start, goal);
                match truth.get(&goal) {
                    Some(&d) if goal != start => {
                        assert_eq!(path.len() as u32, d, "seed {} goal {}", seed, goal);
                        assert_eq!(path.last(), Some(&goal));
                        assert!(start.is_adjacent(path[0]));
                        for pair in path.windows(2) {
                            assert!(pair[0].is_adjacent(pair[1]));
                        }
                        let unique: FxHashSet<_> = path.iter().collect();
                        assert_eq!(unique.len(), path.len());
                        assert!(!unique.contains(&start));
                    }
                    _ => assert!(path.is_empty(), "seed {} goal {}", seed, goal),
                }
            }
        }
    }

    #[test]
    fn test_find_path_weighted_detour() {
        // 3x2 grid: going straight through (1,0) costs 10, detour costs 4
        let grid = Grid::with_size(3, 2);
        let swamp = Position::new(1, 0);
        let path = find_path_with(&grid, Position::new(0, 0), Position::new(2, 0), |_, to| {
            Some(if to == swamp { 10 } else { 1 })
        });
        assert_eq!(
            path,
            vec![
                Position::new(0, 1),
                Position::new(1, 1),
                Position::new(2, 1),
                Position::new(2, 0)
            ]
        );
    }

    #[test]
    fn test_broken_parent_chain_yields_empty() {
        let parent = FxHashMap::default();
        assert!(reconstruct_path(&parent, Position::new(0, 0), Position::new(2, 0)).is_empty());
    }
}
