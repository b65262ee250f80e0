use thiserror::Error;

use crate::{CellCount, Coord};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Board needs at least one row and one column, got {rows}x{cols}")]
    InvalidDimensions { rows: Coord, cols: Coord },
    #[error("Too many mines: requested {requested} but at most {max} fit with a safe first click")]
    TooManyMines {
        requested: CellCount,
        max: CellCount,
    },
    #[error("Custom difficulty has no preset board")]
    NoPreset,
    #[error("Unknown difficulty {0:?}")]
    UnknownDifficulty(String),
    #[error("No async runtime available to drive the game timer")]
    NoRuntime,
}

pub type Result<T> = core::result::Result<T, GameError>;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Tick interval must be greater than zero")]
    ZeroTickInterval,
}
