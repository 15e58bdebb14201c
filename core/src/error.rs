use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Board dimensions must be nonzero")]
    InvalidDimensions,
    #[error("Mine count must be nonzero and leave at least one safe cell")]
    InvalidMineCount,
    #[error("Coordinates outside the board")]
    OutOfBounds,
}

pub type Result<T> = core::result::Result<T, GameError>;
