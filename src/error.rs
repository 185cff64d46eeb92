//! Error types for the simulation engine.
//!
//! Policy no-ops (a dead animal trying to act, a hunt with no prey, a move
//! with nowhere to go) are not errors and never show up here. These variants
//! cover bad configuration and logic defects that must stop the simulation.

use thiserror::Error;

/// Main error type for simulation operations.
#[derive(Error, Debug)]
pub enum SimError {
    /// Invalid configuration (grid dimensions, probabilities, counts)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A coordinate outside the grid
    #[error("Coordinate ({row}, {col}) is outside the grid")]
    OutOfBounds { row: usize, col: usize },

    /// An animal placed on a cell it cannot stand on
    #[error("Cell ({row}, {col}) is not passable")]
    Impassable { row: usize, col: usize },

    /// Broken engine invariant
    #[error("Invariant violated: {0}")]
    Invariant(String),

    /// File system errors
    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML config parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON export errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for simulation operations.
pub type Result<T> = std::result::Result<T, SimError>;
