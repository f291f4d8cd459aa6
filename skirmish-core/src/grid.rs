//! Square obstacle grid with bounds checking

use std::cmp::Ordering;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::MapError;

/// Side length of the standard battle grid
pub const GRID_SIZE: i32 = 15;

/// Largest accepted side length for any grid or map file
pub const MAX_GRID_SIZE: i32 = 1024;

/// 4-directional neighbor offsets (dx, dy)
/// Index: 0=right, 1=left, 2=down, 3=up
pub const DIRECTIONS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Integer grid coordinate
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance between two cells, saturating at `i32::MAX`
    pub fn distance_to(&self, other: Position) -> i32 {
        let d = self.x.abs_diff(other.x).saturating_add(self.y.abs_diff(other.y));
        i32::try_from(d).unwrap_or(i32::MAX)
    }

    /// Get neighbor in direction (0-3)
    pub fn neighbor(&self, direction: usize) -> Position {
        let (dx, dy) = DIRECTIONS[direction % 4];
        Position::new(self.x + dx, self.y + dy)
    }

    /// The four orthogonal neighbors, in `DIRECTIONS` order
    pub fn neighbors(&self) -> [Position; 4] {
        [0, 1, 2, 3].map(|d| self.neighbor(d))
    }

    /// True if the two cells share an edge
    pub fn is_adjacent(&self, other: Position) -> bool {
        self.distance_to(other) == 1
    }
}

// Row-major: matches the order a full grid scan visits cells.
impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.y.cmp(&other.y).then(self.x.cmp(&other.x))
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Blocked-cell grid. Cells outside the grid always read as blocked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: i32,
    height: i32,
    /// Row-major blocked flags
    cells: Vec<bool>,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl Grid {
    /// Empty grid of the standard size
    pub fn new() -> Self {
        Self::with_size(GRID_SIZE, GRID_SIZE)
    }

    /// Empty grid of arbitrary size; dimensions clamp to `1..=MAX_GRID_SIZE`
    pub fn with_size(width: i32, height: i32) -> Self {
        let width = width.clamp(1, MAX_GRID_SIZE);
        let height = height.clamp(1, MAX_GRID_SIZE);
        Self {
            width,
            height,
            cells: vec![false; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Check if a coordinate is on the grid
    pub fn is_valid_position(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    /// Check a cell; out-of-bounds cells are never walkable
    pub fn is_blocked(&self, x: i32, y: i32) -> bool {
        match self.index(x, y) {
            Some(i) => self.cells[i],
            None => true,
        }
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.is_valid_position(pos.x, pos.y)
    }

    /// In bounds and not blocked
    pub fn is_walkable(&self, pos: Position) -> bool {
        !self.is_blocked(pos.x, pos.y)
    }

    /// Set a cell. Writes outside the grid are ignored.
    pub fn set_blocked(&mut self, x: i32, y: i32, blocked: bool) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = blocked;
        }
    }

    /// Flip a cell. Writes outside the grid are ignored.
    pub fn toggle_blocked(&mut self, x: i32, y: i32) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = !self.cells[i];
        }
    }

    /// Unblock every cell
    pub fn clear(&mut self) {
        self.cells.fill(false);
    }

    pub fn blocked_count(&self) -> usize {
        self.cells.iter().filter(|&&b| b).count()
    }

    /// Iterate all cells in row-major order
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| Position::new(x, y)))
    }

    // ========================================================================
    // BULK LOAD / EXPORT
    // ========================================================================

    /// Replace all flags from a row-major 0/1 array.
    ///
    /// The dimensions must match this grid exactly and the array must hold
    /// `width * height` entries. On error the grid is left untouched.
    pub fn load_from_array(&mut self, width: i32, height: i32, blocked: &[u8]) -> Result<(), MapError> {
        if width != self.width || height != self.height {
            return Err(MapError::DimensionMismatch {
                expected_width: self.width,
                expected_height: self.height,
                width,
                height,
            });
        }

        let expected = self.cells.len();
        if blocked.len() != expected {
            return Err(MapError::LengthMismatch {
                expected,
                actual: blocked.len(),
            });
        }

        for (cell, &flag) in self.cells.iter_mut().zip(blocked) {
            *cell = flag != 0;
        }
        Ok(())
    }

    /// Row-major 0/1 flags
    pub fn export_blocked_linear(&self) -> Vec<u8> {
        self.cells.iter().map(|&b| u8::from(b)).collect()
    }

    /// Block random cells with the given probability, never touching `keep_clear`.
    pub fn scatter_obstacles<R: Rng>(&mut self, rng: &mut R, density: f64, keep_clear: &[Position]) {
        let density = density.clamp(0.0, 1.0);
        for y in 0..self.height {
            for x in 0..self.width {
                let pos = Position::new(x, y);
                if keep_clear.contains(&pos) {
                    continue;
                }
                if rng.gen_bool(density) {
                    self.set_blocked(x, y, true);
                }
            }
        }
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if self.is_valid_position(x, y) {
            Some((y * self.width + x) as usize)
        } else {
            None
        }
    }
}
