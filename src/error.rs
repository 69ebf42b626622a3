//! Error types surfaced at level load, configuration and spawn time.
//!
//! Per-tick dot decisions never fail; every branch degrades to "stay put".

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("level has no rows")]
    Empty,

    #[error("row {row} has width {found}, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unknown tile {tile:?} at ({x}, {y})")]
    UnknownTile { tile: char, x: usize, y: usize },

    #[error("level has no floor tiles")]
    NoFloor,

    #[error("cell size must be positive, got {0}")]
    InvalidCellSize(f32),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error(
        "placed {placed} of {required} dots before giving up after {attempts} attempts; \
         the level is too small or dense for the spawn distance"
    )]
    Unsatisfiable {
        placed: usize,
        required: usize,
        attempts: u32,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}
