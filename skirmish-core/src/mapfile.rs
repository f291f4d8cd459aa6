//! Map files: JSON with a CSV fallback
//!
//! JSON layout is `{ "width": w, "height": h, "blocked": [0, 1, ...] }`,
//! row-major. The CSV form is one row per line of comma-separated integers.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::MapError;
use crate::grid::{Grid, MAX_GRID_SIZE};

/// Raw map contents as stored on disk
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapData {
    pub width: i32,
    pub height: i32,
    pub blocked: Vec<u8>,
}

impl MapData {
    pub fn from_grid(grid: &Grid) -> Self {
        Self {
            width: grid.width(),
            height: grid.height(),
            blocked: grid.export_blocked_linear(),
        }
    }

    /// Dimensions in `1..=MAX_GRID_SIZE` and one flag per cell
    pub fn validate(&self) -> Result<(), MapError> {
        let in_range = |d: i32| (1..=MAX_GRID_SIZE).contains(&d);
        if !in_range(self.width) || !in_range(self.height) {
            return Err(MapError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        let expected = self.width as usize * self.height as usize;
        if self.blocked.len() != expected {
            return Err(MapError::LengthMismatch {
                expected,
                actual: self.blocked.len(),
            });
        }
        Ok(())
    }

    /// Build a grid of the file's own size
    pub fn to_grid(&self) -> Result<Grid, MapError> {
        self.validate()?;
        let mut grid = Grid::with_size(self.width, self.height);
        grid.load_from_array(self.width, self.height, &self.blocked)?;
        Ok(grid)
    }

    // ========================================================================
    // JSON
    // ========================================================================

    pub fn from_json(json: &str) -> Result<Self, MapError> {
        let data: Self = serde_json::from_str(json)?;
        data.validate()?;
        Ok(data)
    }

    pub fn load_json(path: &Path) -> Result<Self, MapError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn save_json(&self, path: &Path) -> Result<(), MapError> {
        self.validate()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    // ========================================================================
    // CSV
    // ========================================================================

    /// Parse CSV rows. Blank lines are skipped; every row must be as wide as
    /// the first.
    pub fn from_csv(text: &str) -> Result<Self, MapError> {
        let mut width = None;
        let mut height = 0;
        let mut blocked = Vec::new();

        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;
            if line.trim().is_empty() {
                continue;
            }

            let mut row = Vec::new();
            for cell in line.split(',').map(str::trim).filter(|c| !c.is_empty()) {
                let value: u8 = cell.parse().map_err(|_| MapError::Csv {
                    line: line_no,
                    message: format!("not a cell flag: {:?}", cell),
                })?;
                row.push(value);
            }
            if row.is_empty() {
                continue;
            }

            match width {
                None => width = Some(row.len()),
                Some(w) if w != row.len() => {
                    return Err(MapError::Csv {
                        line: line_no,
                        message: format!("row has {} cells, expected {}", row.len(), w),
                    });
                }
                Some(_) => {}
            }
            blocked.extend(row);
            height += 1;
        }

        let data = Self {
            width: width.unwrap_or(0) as i32,
            height,
            blocked,
        };
        data.validate()?;
        Ok(data)
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        for row in self.blocked.chunks(self.width.max(1) as usize) {
            for (x, flag) in row.iter().enumerate() {
                if x > 0 {
                    out.push(',');
                }
                let _ = write!(out, "{}", flag);
            }
            out.push('\n');
        }
        out
    }

    pub fn load_csv(path: &Path) -> Result<Self, MapError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_csv(&content)
    }

    pub fn save_csv(&self, path: &Path) -> Result<(), MapError> {
        self.validate()?;
        std::fs::write(path, self.to_csv())?;
        Ok(())
    }

    // ========================================================================
    // LOADING WITH FALLBACK
    // ========================================================================

    /// Load `path` as JSON, falling back to the sibling `.csv` file when the
    /// JSON is missing or invalid
    pub fn load(path: &Path) -> Result<Self, MapError> {
        match Self::load_json(path) {
            Ok(data) => {
                tracing::info!("loaded map {} ({}x{})", path.display(), data.width, data.height);
                return Ok(data);
            }
            Err(e) => tracing::warn!("map {} unusable ({}), trying CSV", path.display(), e),
        }

        let csv = csv_sibling(path);
        match Self::load_csv(&csv) {
            Ok(data) => {
                tracing::info!("loaded map {} ({}x{})", csv.display(), data.width, data.height);
                Ok(data)
            }
            Err(MapError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Err(MapError::NotFound {
                json: path.to_path_buf(),
                csv,
            }),
            Err(e) => Err(e),
        }
    }
}

/// `maps/arena.json` -> `maps/arena.csv`; `maps/arena` -> `maps/arena.csv`
pub fn csv_sibling(path: &Path) -> PathBuf {
    path.with_extension("csv")
}

/// Load a map file into a grid of the expected size.
///
/// A file of any other size is rejected with `DimensionMismatch`.
pub fn load_grid(path: &Path, width: i32, height: i32) -> Result<Grid, MapError> {
    let data = MapData::load(path)?;
    let mut grid = Grid::with_size(width, height);
    if (grid.width(), grid.height()) != (width, height) {
        return Err(MapError::InvalidDimensions { width, height });
    }
    grid.load_from_array(data.width, data.height, &data.blocked)?;
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Position;

    fn sample() -> MapData {
        MapData {
            width: 3,
            height: 2,
            blocked: vec![0, 1, 0, 0, 0, 1],
        }
    }

    #[test]
    fn test_validate() {
        assert!(sample().validate().is_ok());

        let zero = MapData {
            width: 0,
            height: 2,
            blocked: vec![],
        };
        assert!(matches!(zero.validate(), Err(MapError::InvalidDimensions { .. })));

        // Oversized headers are refused before the cell count is computed
        let huge = MapData {
            width: 50_000,
            height: 50_000,
            blocked: vec![],
        };
        assert!(matches!(huge.validate(), Err(MapError::InvalidDimensions { .. })));

        let short = MapData {
            blocked: vec![0, 1],
            ..sample()
        };
        assert!(matches!(
            short.validate(),
            Err(MapError::LengthMismatch { expected: 6, actual: 2 })
        ));
    }

    #[test]
    fn test_to_grid() {
        let grid = sample().to_grid().unwrap();
        assert_eq!((grid.width(), grid.height()), (3, 2));
        assert!(grid.is_blocked(1, 0));
        assert!(grid.is_blocked(2, 1));
        assert!(!grid.is_blocked(0, 1));
        assert_eq!(MapData::from_grid(&grid), sample());
    }

    #[test]
    fn test_csv_parse() {
        let data = MapData::from_csv("0, 1, 0\n\n0,0,1\n").unwrap();
        assert_eq!(data, sample());
        assert_eq!(data.to_csv(), "0,1,0\n0,0,1\n");
    }

    #[test]
    fn test_csv_errors() {
        assert!(matches!(
            MapData::from_csv("0,1\n0,1,1\n"),
            Err(MapError::Csv { line: 2, .. })
        ));
        assert!(matches!(MapData::from_csv("0,x\n"), Err(MapError::Csv { line: 1, .. })));
        assert!(matches!(MapData::from_csv("\n\n"), Err(MapError::InvalidDimensions { .. })));
    }

    #[test]
    fn test_json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arena.json");
        sample().save_json(&path).unwrap();
        assert_eq!(MapData::load(&path).unwrap(), sample());
    }

    #[test]
    fn test_falls_back_to_csv() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("arena.json");
        sample().save_csv(&csv_sibling(&json)).unwrap();

        // Missing JSON
        assert_eq!(MapData::load(&json).unwrap(), sample());

        // Invalid JSON
        std::fs::write(&json, r#"{ "width": 3, "height": 2, "blocked": [1] }"#).unwrap();
        assert_eq!(MapData::load(&json).unwrap(), sample());
    }

    #[test]
    fn test_nothing_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("missing.json");
        assert!(matches!(MapData::load(&json), Err(MapError::NotFound { .. })));
    }

    #[test]
    fn test_load_grid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("open.json");
        MapData::from_grid(&Grid::new()).save_json(&path).unwrap();
        let grid = load_grid(&path, 15, 15).unwrap();
        assert_eq!(grid.width(), 15);
        assert!(grid.is_walkable(Position::new(7, 7)));
    }

    #[test]
    fn test_load_grid_rejects_other_sizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.json");
        MapData {
            width: 4,
            height: 4,
            blocked: vec![0; 16],
        }
        .save_json(&path)
        .unwrap();

        assert!(matches!(
            load_grid(&path, 15, 15),
            Err(MapError::DimensionMismatch {
                expected_width: 15,
                expected_height: 15,
                width: 4,
                height: 4,
            })
        ));
        assert!(load_grid(&path, 4, 4).is_ok());
        assert!(matches!(
            load_grid(&path, 50_000, 50_000),
            Err(MapError::InvalidDimensions { .. })
        ));
    }
}
