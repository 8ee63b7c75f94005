//! Deterministic engine for the 5×5 puzzle battler
//!
//! Pure game state: no async runtime, no clocks, no I/O. Timers, the opponent
//! schedule and presentation live in the `puzzle_battler` crate, which drives a
//! [`GameSession`] through its action methods.
//!
//! ## Module Organization
//!
//! - `types` - pieces, colors, cells, moves
//! - `board` - occupancy grid
//! - `notation` - board ⇄ row-run-length string codec
//! - `budget` - point allowance for tray purchases
//! - `placement` - point snapping, placement rules, two-phase drags
//! - `game` - phase state machine and session aggregate
//! - `advisor` - seam for external move suggestions

pub mod advisor;
pub mod board;
pub mod budget;
pub mod error;
pub mod game;
pub mod notation;
pub mod placement;
pub mod types;

pub use advisor::{suggest, AdvisorError, MoveAdvisor};
pub use board::Board;
pub use budget::PieceBudget;
pub use error::{EngineError, EngineResult, NotationError, Rejection};
pub use game::{
    EngineConfig, GameOutcome, GamePhase, GameSession, MoveRecord, PuzzleDefinition,
    SessionSnapshot,
};
pub use notation::{decode, encode, DecodedPosition, IgnoredCell};
pub use placement::{
    BoardPoint, DragId, DragSource, DropResolution, DropTarget, PlacementConfig,
    PlacementResolver,
};
pub use types::{
    Cell, Move, Piece, PieceColor, PieceId, PieceLocation, PieceOrigin, PieceType, BOARD_SIZE,
    TRAY_PIECES,
};
