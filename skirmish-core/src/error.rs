//! Error types for external data (maps, configuration, spell catalogs)

use std::path::PathBuf;

/// Map loading / saving errors
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("map is {width}x{height}, expected {expected_width}x{expected_height}")]
    DimensionMismatch {
        expected_width: i32,
        expected_height: i32,
        width: i32,
        height: i32,
    },

    #[error("blocked array has {actual} entries, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("invalid map dimensions {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },

    #[error("CSV line {line}: {message}")]
    Csv { line: usize, message: String },

    #[error("no map found at {json} or {csv}")]
    NotFound { json: PathBuf, csv: PathBuf },

    #[error("map JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("map I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Rules configuration and spell catalog errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("unknown spell: {0}")]
    UnknownSpell(String),

    #[error("config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config I/O: {0}")]
    Io(#[from] std::io::Error),
}
