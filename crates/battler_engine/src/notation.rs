//! Board notation codec
//!
//! Converts between a [`Board`] plus its pieces and the compact text form used by
//! puzzle definitions and the move advisor. The format is FEN-like but sized to
//! the board:
//!
//! ```text
//! 2k2/5/1p3/5/R3K w
//! └─ rows top to bottom, `/`-separated ─┘ └ side to move
//! ```
//!
//! Within a row, a number is a run of empty cells and a letter is one piece
//! (`K Q R B N P`, uppercase for White, lowercase for Black).
//!
//! # Decoding rules
//!
//! - exactly `board_size` rows, each spanning exactly `board_size` cells
//! - zero-length runs are rejected (the encoder never emits them)
//! - an unknown letter still consumes one cell but leaves it empty; it is
//!   reported in [`DecodedPosition::ignored_cells`] so the caller decides whether
//!   to abort
//! - fields after the side marker (FEN move counters) are ignored
//! - piece ids are assigned 1, 2, 3… in reading order, so decoding the same
//!   string twice yields identical positions

use crate::board::Board;
use crate::error::NotationError;
use crate::types::{Cell, Piece, PieceColor, PieceId, PieceIdAllocator, PieceOrigin, PieceType};
use tracing::{debug, warn};

/// Separator between rows in the layout field
pub const ROW_SEPARATOR: char = '/';

/// A cell whose symbol named no piece type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IgnoredCell {
    pub cell: Cell,
    pub symbol: char,
}

/// Result of [`decode`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPosition {
    pub board: Board,
    pub pieces: Vec<Piece>,
    pub active_color: PieceColor,
    pub ignored_cells: Vec<IgnoredCell>,
}

/// Encode the board and both piece collections
///
/// Deterministic and side-effect free. A board slot whose id is missing from
/// both collections breaks a session invariant; it is logged and written as an
/// empty cell.
pub fn encode(board: &Board, own: &[Piece], opponent: &[Piece], active_color: PieceColor) -> String {
    let lookup = |id: PieceId| own.iter().chain(opponent.iter()).find(|piece| piece.id == id);
    let size = board.size();
    let mut rows = Vec::with_capacity(size);

    for y in 0..size {
        let mut row = String::new();
        let mut empty_run = 0usize;
        for x in 0..size {
            let cell = Cell::new(x as u8, y as u8);
            let piece = board.get(cell).and_then(|id| {
                let found = lookup(id);
                if found.is_none() {
                    warn!("[NOTATION] Board holds unknown piece {} at {:?}", id, cell);
                }
                found
            });
            match piece {
                Some(piece) => {
                    if empty_run > 0 {
                        row.push_str(&empty_run.to_string());
                        empty_run = 0;
                    }
                    row.push(piece.symbol());
                }
                None => empty_run += 1,
            }
        }
        if empty_run > 0 {
            row.push_str(&empty_run.to_string());
        }
        rows.push(row);
    }

    format!(
        "{} {}",
        rows.join(&ROW_SEPARATOR.to_string()),
        active_color.marker()
    )
}

/// Decode a notation string into a fresh board and piece list
///
/// Every decoded piece has [`PieceOrigin::Puzzle`].
pub fn decode(notation: &str, board_size: usize) -> Result<DecodedPosition, NotationError> {
    let mut fields = notation.split_whitespace();
    let layout = fields.next().ok_or(NotationError::Empty)?;
    let marker = fields.next().ok_or(NotationError::MissingActiveColor)?;
    let active_color =
        PieceColor::from_marker(marker).ok_or_else(|| NotationError::InvalidActiveColor {
            marker: marker.to_string(),
        })?;

    let extra_fields = fields.count();
    if extra_fields > 0 {
        debug!("[NOTATION] Ignoring {} trailing field(s)", extra_fields);
    }

    let rows: Vec<&str> = layout.split(ROW_SEPARATOR).collect();
    if rows.len() != board_size {
        return Err(NotationError::RowCount {
            expected: board_size,
            found: rows.len(),
        });
    }

    let mut board = Board::new(board_size);
    let mut pieces = Vec::new();
    let mut ignored_cells = Vec::new();
    let mut ids = PieceIdAllocator::default();

    for (y, row) in rows.iter().enumerate() {
        let mut x = 0usize;
        let mut symbols = row.chars().peekable();

        while let Some(symbol) = symbols.next() {
            if let Some(digit) = symbol.to_digit(10) {
                // A run never starts with 0, which also rules out "05"-style padding.
                if digit == 0 {
                    return Err(NotationError::ZeroRun { row: y });
                }
                let mut run = digit as usize;
                while let Some(next) = symbols.peek().and_then(|c| c.to_digit(10)) {
                    run = run.saturating_mul(10).saturating_add(next as usize);
                    symbols.next();
                }
                x = x.saturating_add(run);
                continue;
            }

            // Cells past the edge are only counted; the width check below rejects the row.
            if x < board_size {
                let cell = Cell::new(x as u8, y as u8);
                match PieceType::from_symbol(symbol) {
                    Some((piece_type, color)) => {
                        let id = ids.allocate();
                        board.set(cell, id);
                        pieces.push(Piece::new(id, piece_type, color, cell, PieceOrigin::Puzzle));
                    }
                    None => ignored_cells.push(IgnoredCell { cell, symbol }),
                }
            }
            x = x.saturating_add(1);
        }

        if x != board_size {
            return Err(NotationError::RowWidth {
                row: y,
                expected: board_size,
                found: x,
            });
        }
    }

    Ok(DecodedPosition {
        board,
        pieces,
        active_color,
        ignored_cells,
    })
}
