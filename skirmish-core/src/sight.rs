//! Line of sight and spell range geometry

use crate::grid::{Grid, Position};

/// Manhattan distance between two cells
pub fn manhattan_distance(from: Position, to: Position) -> i32 {
    from.distance_to(to)
}

/// Inclusive Manhattan range test
pub fn is_in_range(from: Position, to: Position, min_range: i32, max_range: i32) -> bool {
    let distance = manhattan_distance(from, to);
    distance >= min_range && distance <= max_range
}

/// Cells on the Bresenham line from `from` to `to`, both ends included
pub fn raycast_cells(from: Position, to: Position) -> Vec<Position> {
    // Error terms in i64 so far-apart endpoints cannot overflow
    let dx = i64::from(from.x.abs_diff(to.x));
    let dy = i64::from(from.y.abs_diff(to.y));
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };

    let mut err = dx - dy;
    let mut x = from.x;
    let mut y = from.y;
    let mut cells = Vec::new();

    cells.push(from);
    while x != to.x || y != to.y {
        let e2 = err * 2;
        if e2 > -dy {
            err -= dy;
            x += sx;
        }
        if e2 < dx {
            err += dx;
            y += sy;
        }
        cells.push(Position::new(x, y));
    }

    cells
}

/// True if no blocked cell lies strictly between `from` and `to`.
///
/// The destination never blocks its own visibility, so a blocked target cell
/// can still be seen.
pub fn has_line_of_sight(grid: &Grid, from: Position, to: Position) -> bool {
    if from == to {
        return true;
    }

    raycast_cells(from, to)
        .into_iter()
        .skip(1)
        .filter(|&cell| cell != to)
        .all(|cell| !grid.is_blocked(cell.x, cell.y))
}

/// All grid cells within the range band of `from`, with line of sight if
/// required. Row-major order.
///
/// Only the bounding box of radius `max_range` around `from` is scanned.
pub fn castable_cells(
    grid: &Grid,
    from: Position,
    min_range: i32,
    max_range: i32,
    require_los: bool,
) -> Vec<Position> {
    if max_range < 0 || max_range < min_range {
        return Vec::new();
    }

    let x_lo = from.x.saturating_sub(max_range).max(0);
    let x_hi = from.x.saturating_add(max_range).min(grid.width() - 1);
    let y_lo = from.y.saturating_sub(max_range).max(0);
    let y_hi = from.y.saturating_add(max_range).min(grid.height() - 1);

    let mut cells = Vec::new();
    for y in y_lo..=y_hi {
        for x in x_lo..=x_hi {
            let target = Position::new(x, y);
            if !is_in_range(from, target, min_range, max_range) {
                continue;
            }
            if require_los && !has_line_of_sight(grid, from, target) {
                continue;
            }
            cells.push(target);
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raycast_endpoints() {
        let cells = raycast_cells(Position::new(0, 0), Position::new(3, 1));
        assert_eq!(cells.first(), Some(&Position::new(0, 0)));
        assert_eq!(cells.last(), Some(&Position::new(3, 1)));
        assert_eq!(
            cells,
            vec![
                Position::new(0, 0),
                Position::new(1, 0),
                Position::new(2, 1),
                Position::new(3, 1)
            ]
        );
    }

    #[test]
    fn test_raycast_reverse_direction() {
        let cells = raycast_cells(Position::new(4, 4), Position::new(1, 4));
        assert_eq!(
            cells,
            vec![
                Position::new(4, 4),
                Position::new(3, 4),
                Position::new(2, 4),
                Position::new(1, 4)
            ]
        );
    }

    #[test]
    fn test_los_to_self() {
        let mut grid = Grid::new();
        grid.set_blocked(5, 5, true);
        for pos in grid.positions().collect::<Vec<_>>() {
            assert!(has_line_of_sight(&grid, pos, pos));
        }
    }

    #[test]
    fn test_single_blocker_between() {
        let mut grid = Grid::new();
        let a = Position::new(4, 4);
        let b = Position::new(6, 4);
        assert!(has_line_of_sight(&grid, a, b));

        grid.set_blocked(5, 4, true);
        assert!(!has_line_of_sight(&grid, a, b));
        assert!(!has_line_of_sight(&grid, b, a));

        grid.set_blocked(5, 4, false);
        assert!(has_line_of_sight(&grid, a, b));

        // Vertical alignment
        let c = Position::new(4, 6);
        grid.set_blocked(4, 5, true);
        assert!(!has_line_of_sight(&grid, a, c));
    }

    #[test]
    fn test_blocked_destination_is_visible() {
        let mut grid = Grid::new();
        grid.set_blocked(6, 4, true);
        assert!(has_line_of_sight(&grid, Position::new(4, 4), Position::new(6, 4)));
    }

    #[test]
    fn test_in_range_bounds() {
        let o = Position::new(5, 5);
        assert!(is_in_range(o, Position::new(6, 5), 1, 3));
        assert!(is_in_range(o, Position::new(6, 7), 1, 3));
        assert!(!is_in_range(o, Position::new(7, 7), 1, 3));
        assert!(!is_in_range(o, o, 1, 3));
        assert!(is_in_range(o, o, 0, 0));
    }

    #[test]
    fn test_extreme_coordinates_do_not_overflow() {
        let far_left = Position::new(i32::MIN, 0);
        let far_right = Position::new(i32::MAX, 0);
        assert!(!is_in_range(far_left, far_right, 1, 3));
        assert_eq!(manhattan_distance(far_left, far_right), i32::MAX);

        let edge = Position::new(i32::MAX, i32::MIN);
        assert_eq!(
            raycast_cells(edge, Position::new(i32::MAX - 2, i32::MIN + 1)),
            vec![edge, Position::new(i32::MAX - 1, i32::MIN), Position::new(i32::MAX - 2, i32::MIN + 1)]
        );
        assert!(castable_cells(&Grid::new(), far_right, 0, 5, true).is_empty());
    }

    #[test]
    fn test_castable_cells_open_grid() {
        let grid = Grid::new();
        let cells = castable_cells(&grid, Position::new(7, 7), 1, 3, true);
        // Diamond radius 3 minus the center
        assert_eq!(cells.len(), 24);
        let mut sorted = cells.clone();
        sorted.sort();
        assert_eq!(cells, sorted);
    }

    #[test]
    fn test_castable_cells_clipped_at_corner() {
        let grid = Grid::new();
        let cells = castable_cells(&grid, Position::new(0, 0), 2, 5, false);
        assert!(cells.iter().all(|c| grid.contains(*c)));
        assert!(cells.iter().all(|c| is_in_range(Position::new(0, 0), *c, 2, 5)));
        // Quarter diamond: distances 2..=5 give 3 + 4 + 5 + 6 cells
        assert_eq!(cells.len(), 18);
    }

    #[test]
    fn test_castable_cells_matches_full_scan() {
        let mut grid = Grid::new();
        for &(x, y) in &[(6, 7), (8, 6), (7, 9), (3, 3), (10, 10)] {
            grid.set_blocked(x, y, true);
        }
        let from = Position::new(7, 7);
        let bounded = castable_cells(&grid, from, 1, 5, true);
        let full: Vec<_> = grid
            .positions()
            .filter(|&p| is_in_range(from, p, 1, 5) && has_line_of_sight(&grid, from, p))
            .collect();
        assert_eq!(bounded, full);
        assert!(!bounded.contains(&Position::new(5, 7)));
    }

    #[test]
    fn test_castable_cells_empty_band() {
        let grid = Grid::new();
        assert!(castable_cells(&grid, Position::new(3, 3), 4, 2, true).is_empty());
    }
}
