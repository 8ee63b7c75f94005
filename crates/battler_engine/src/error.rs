//! Error types for the battler engine
//!
//! Two families live here:
//!
//! - [`NotationError`] / [`EngineError`] are real failures (malformed input). They
//!   abort the operation and are reported to the caller.
//! - [`Rejection`] is not a failure. It is the typed answer to an action the
//!   rules refuse (occupied cell, no budget, wrong phase). Callers are expected
//!   to branch on it; the session stays fully usable.

use thiserror::Error;

/// Malformed board-notation input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotationError {
    /// Nothing to decode
    #[error("Notation string is empty")]
    Empty,

    /// Wrong number of `/`-separated rows
    #[error("Expected {expected} rows, found {found}")]
    RowCount { expected: usize, found: usize },

    /// Runs and pieces in a row do not add up to the board width
    #[error("Row {row} spans {found} cells, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A run-length count of zero (never produced by the encoder)
    #[error("Row {row} contains a zero-length run")]
    ZeroRun { row: usize },

    /// The layout is not followed by an active-side marker
    #[error("Missing active side marker")]
    MissingActiveColor,

    /// The active-side marker is not `w` or `b`
    #[error("Invalid active side marker: {marker}")]
    InvalidActiveColor { marker: String },

    /// A letter that names no piece type
    #[error("Unknown piece symbol '{symbol}' at row {row}, column {column}")]
    UnknownPiece {
        symbol: char,
        row: usize,
        column: usize,
    },
}

/// Errors that abort an engine operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The puzzle definition is missing data or carries unusable data
    #[error("Invalid puzzle '{puzzle_id}': {message}")]
    InvalidPuzzle { puzzle_id: String, message: String },

    /// The puzzle's notation string could not be decoded
    #[error("Puzzle '{puzzle_id}' has malformed notation: {source}")]
    Notation {
        puzzle_id: String,
        #[source]
        source: NotationError,
    },

    /// `restart` was called without a loaded puzzle
    #[error("No puzzle loaded")]
    NoPuzzleLoaded,
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Why an action was refused
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    #[error("target cell is occupied")]
    Occupied,

    #[error("target cell is outside the board")]
    OutOfBounds,

    #[error("not enough budget for this piece")]
    Unaffordable,

    #[error("piece type is not offered in the tray")]
    NotInTray,

    #[error("action is not allowed in the current phase")]
    WrongPhase,

    #[error("no piece on the source cell")]
    EmptySource,

    #[error("piece does not belong to the side to move")]
    NotYourTurn,

    #[error("piece cannot be dragged")]
    NotDraggable,

    #[error("unknown piece")]
    UnknownPiece,

    #[error("unknown or already finished drag")]
    UnknownDrag,
}
