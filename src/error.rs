//! Error type shared by every engine's mutating operations.
//!
//! Query functions never fail: asking for the moves of an empty square or an
//! opponent's piece just yields an empty list. Only operations that change a
//! board or session return [`RulesError`].

use grid_shared::{ParsePositionError, Position};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesError {
    #[error("position {0} is off the board")]
    OutOfBounds(Position),

    #[error("no piece at {0}")]
    NoPiece(Position),

    #[error("piece at {0} belongs to the other side")]
    WrongSide(Position),

    #[error("illegal move {from} -> {to}")]
    IllegalMove { from: Position, to: Position },

    #[error("cell {0} cannot be played")]
    InvalidPlacement(Position),

    #[error("capture chain must continue with the piece on {0}")]
    MustContinueCapture(Position),

    #[error("the game is already over")]
    GameOver,

    #[error("move does not belong to this game")]
    MismatchedGame,

    #[error("no solvable {rows}x{cols} maze after {attempts} attempts")]
    MazeUnsolvable {
        rows: usize,
        cols: usize,
        attempts: usize,
    },

    #[error("cannot parse move: {0}")]
    Parse(String),
}

impl From<ParsePositionError> for RulesError {
    fn from(err: ParsePositionError) -> Self {
        RulesError::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RulesError>;
