//! Board occupancy grid
//!
//! The board only records *which* piece id stands on each cell. Piece data
//! (type, color, value) lives in the session's piece collections, so the board
//! can never disagree with a piece about what it is, only about where it is.
//! The placement resolver and the game engine keep the two in sync.

use crate::types::{Cell, PieceId};
use serde::{Deserialize, Serialize};

/// N×N grid of optional piece ids, row-major from the top-left cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    size: usize,
    squares: Vec<Option<PieceId>>,
}

impl Board {
    /// Empty board of `size`×`size` cells
    pub fn new(size: usize) -> Self {
        Self {
            size,
            squares: vec![None; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.is_within(self.size)
    }

    /// Piece on `cell`, `None` when empty or off the board
    pub fn get(&self, cell: Cell) -> Option<PieceId> {
        if !self.contains(cell) {
            return None;
        }
        self.squares[cell.index(self.size)]
    }

    pub fn is_empty(&self, cell: Cell) -> bool {
        self.get(cell).is_none()
    }

    /// Cell currently holding `id`
    pub fn find(&self, id: PieceId) -> Option<Cell> {
        self.cells().find(|cell| self.get(*cell) == Some(id))
    }

    /// Number of occupied cells
    pub fn occupied_count(&self) -> usize {
        self.squares.iter().filter(|square| square.is_some()).count()
    }

    /// Every cell in reading order (top row first, left to right)
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let size = self.size;
        (0..size).flat_map(move |y| {
            (0..size).map(move |x| Cell::new(x as u8, y as u8))
        })
    }

    /// Put `id` on `cell`, returning whatever was there
    ///
    /// Callers check bounds and occupancy first; this only writes the slot.
    pub(crate) fn set(&mut self, cell: Cell, id: PieceId) -> Option<PieceId> {
        let index = cell.index(self.size);
        self.squares[index].replace(id)
    }

    /// Empty `cell`, returning the piece that was there
    pub(crate) fn clear(&mut self, cell: Cell) -> Option<PieceId> {
        if !self.contains(cell) {
            return None;
        }
        let index = cell.index(self.size);
        self.squares[index].take()
    }
}
