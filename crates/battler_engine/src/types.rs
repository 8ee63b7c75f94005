//! Core value types shared by every engine module
//!
//! Pieces, colors, cells and moves for the 5×5 battler board. Everything here is
//! plain data: no board access, no logging.
//!
//! # Coordinates
//!
//! A [`Cell`] is `(x, y)` where `x` is the column (left to right) and `y` is the
//! row counted from the **top** of the board, which is the order the notation
//! string lists rows in. The algebraic form flips the row so that rank 1 is the
//! bottom row, like a regular chessboard:
//!
//! ```text
//!   y=0  a5 b5 c5 d5 e5
//!   y=1  a4 b4 c4 d4 e4
//!   y=2  a3 b3 c3 d3 e3
//!   y=3  a2 b2 c2 d2 e2
//!   y=4  a1 b1 c1 d1 e1
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Width and height of the battler board
pub const BOARD_SIZE: usize = 5;

/// Piece types a player may buy from the staging tray
///
/// Kings are never offered: their table value is zero, so a purchasable king
/// would bypass the budget entirely.
pub const TRAY_PIECES: [PieceType; 5] = [
    PieceType::Pawn,
    PieceType::Knight,
    PieceType::Bishop,
    PieceType::Rook,
    PieceType::Queen,
];

/// Side a piece belongs to
///
/// White is the default orientation: the board is drawn from White's side and
/// stored coordinates are never rotated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceColor {
    #[default]
    White,
    Black,
}

impl PieceColor {
    /// The other side
    pub fn opposite(self) -> Self {
        match self {
            PieceColor::White => PieceColor::Black,
            PieceColor::Black => PieceColor::White,
        }
    }

    /// Active-side marker used as the notation suffix
    pub fn marker(self) -> char {
        match self {
            PieceColor::White => 'w',
            PieceColor::Black => 'b',
        }
    }

    /// Parse an active-side marker (`w` or `b`)
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "w" => Some(PieceColor::White),
            "b" => Some(PieceColor::Black),
            _ => None,
        }
    }
}

impl fmt::Display for PieceColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PieceColor::White => write!(f, "white"),
            PieceColor::Black => write!(f, "black"),
        }
    }
}

/// Kind of chess piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceType {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceType {
    /// Point cost of the piece in the placement budget
    ///
    /// | Piece  | Value |
    /// |--------|-------|
    /// | Pawn   | 1     |
    /// | Knight | 3     |
    /// | Bishop | 3     |
    /// | Rook   | 5     |
    /// | Queen  | 9     |
    /// | King   | 0     |
    pub fn value(self) -> u32 {
        match self {
            PieceType::Pawn => 1,
            PieceType::Knight => 3,
            PieceType::Bishop => 3,
            PieceType::Rook => 5,
            PieceType::Queen => 9,
            PieceType::King => 0,
        }
    }

    /// Notation letter, uppercase for White and lowercase for Black
    pub fn symbol(self, color: PieceColor) -> char {
        let letter = match self {
            PieceType::Pawn => 'P',
            PieceType::Knight => 'N',
            PieceType::Bishop => 'B',
            PieceType::Rook => 'R',
            PieceType::Queen => 'Q',
            PieceType::King => 'K',
        };
        match color {
            PieceColor::White => letter,
            PieceColor::Black => letter.to_ascii_lowercase(),
        }
    }

    /// Decode a notation letter into type and color
    pub fn from_symbol(symbol: char) -> Option<(Self, PieceColor)> {
        let color = if symbol.is_ascii_uppercase() {
            PieceColor::White
        } else {
            PieceColor::Black
        };
        let piece_type = match symbol.to_ascii_uppercase() {
            'P' => PieceType::Pawn,
            'N' => PieceType::Knight,
            'B' => PieceType::Bishop,
            'R' => PieceType::Rook,
            'Q' => PieceType::Queen,
            'K' => PieceType::King,
            _ => return None,
        };
        Some((piece_type, color))
    }

    /// Whether the staging tray offers this type
    pub fn in_tray(self) -> bool {
        TRAY_PIECES.contains(&self)
    }
}

impl fmt::Display for PieceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PieceType::Pawn => "pawn",
            PieceType::Knight => "knight",
            PieceType::Bishop => "bishop",
            PieceType::Rook => "rook",
            PieceType::Queen => "queen",
            PieceType::King => "king",
        };
        f.write_str(name)
    }
}

/// Board coordinate: `x` is the column, `y` the row counted from the top
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: u8,
    pub y: u8,
}

impl Cell {
    pub fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// Whether the cell lies on a board of the given size
    pub fn is_within(self, board_size: usize) -> bool {
        usize::from(self.x) < board_size && usize::from(self.y) < board_size
    }

    /// Linear index into a row-major grid
    pub fn index(self, board_size: usize) -> usize {
        usize::from(self.y) * board_size + usize::from(self.x)
    }

    /// Parse algebraic notation such as `"c3"`
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let cell = Cell::from_algebraic("a1", 5).unwrap();
    /// assert_eq!(cell, Cell::new(0, 4)); // bottom-left
    /// ```
    pub fn from_algebraic(text: &str, board_size: usize) -> Option<Self> {
        let mut chars = text.trim().chars();
        let file = chars.next()?.to_ascii_lowercase();
        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let rank: usize = digits.parse().ok()?;
        if !file.is_ascii_lowercase() {
            return None;
        }
        let x = usize::from(file as u8 - b'a');
        if x >= board_size || rank == 0 || rank > board_size {
            return None;
        }
        let y = board_size - rank;
        Some(Cell::new(u8::try_from(x).ok()?, u8::try_from(y).ok()?))
    }

    /// Algebraic notation for this cell (`a1` is bottom-left)
    pub fn to_algebraic(self, board_size: usize) -> String {
        let file = char::from(b'a' + self.x);
        let rank = board_size.saturating_sub(usize::from(self.y));
        format!("{file}{rank}")
    }
}

/// Stable piece identifier, unique within one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PieceId(pub u32);

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out fresh [`PieceId`]s
#[derive(Debug, Clone)]
pub struct PieceIdAllocator {
    next: u32,
}

impl Default for PieceIdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl PieceIdAllocator {
    /// Allocator whose next id comes after every id in `used`
    pub fn after<'a>(used: impl IntoIterator<Item = &'a PieceId>) -> Self {
        let highest = used.into_iter().map(|id| id.0).max().unwrap_or(0);
        Self { next: highest + 1 }
    }

    pub fn allocate(&mut self) -> PieceId {
        let id = PieceId(self.next);
        self.next += 1;
        id
    }
}

/// Where a piece currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "cell", rename_all = "camelCase")]
pub enum PieceLocation {
    OnBoard(Cell),
    Removed,
}

/// How a piece came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceOrigin {
    /// Decoded from the puzzle definition; fixed during preparation
    Puzzle,
    /// Bought from the staging tray with budget points
    Tray,
}

/// A piece in the current session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Piece {
    pub id: PieceId,
    pub piece_type: PieceType,
    pub color: PieceColor,
    pub location: PieceLocation,
    pub value: u32,
    pub origin: PieceOrigin,
}

impl Piece {
    pub fn new(
        id: PieceId,
        piece_type: PieceType,
        color: PieceColor,
        cell: Cell,
        origin: PieceOrigin,
    ) -> Self {
        Self {
            id,
            piece_type,
            color,
            location: PieceLocation::OnBoard(cell),
            value: piece_type.value(),
            origin,
        }
    }

    /// Cell the piece stands on, if it is still on the board
    pub fn cell(&self) -> Option<Cell> {
        match self.location {
            PieceLocation::OnBoard(cell) => Some(cell),
            PieceLocation::Removed => None,
        }
    }

    pub fn symbol(&self) -> char {
        self.piece_type.symbol(self.color)
    }
}

/// A `(from, to)` pair, as played or as suggested by an advisor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Cell,
    pub to: Cell,
}

impl Move {
    pub fn new(from: Cell, to: Cell) -> Self {
        Self { from, to }
    }

    /// Parse a move written as two algebraic cells, e.g. `"b2c3"` or `"b2-c3"`
    pub fn parse(text: &str, board_size: usize) -> Option<Self> {
        let compact: String = text
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect();
        // The rank digits end the first cell, so split after the first digit run.
        let first_digit = compact.find(|c: char| c.is_ascii_digit())?;
        let split = compact[first_digit..]
            .find(|c: char| !c.is_ascii_digit())
            .map(|offset| first_digit + offset)?;
        let from = Cell::from_algebraic(&compact[..split], board_size)?;
        let to = Cell::from_algebraic(&compact[split..], board_size)?;
        Some(Self { from, to })
    }

    pub fn to_text(self, board_size: usize) -> String {
        format!(
            "{}{}",
            self.from.to_algebraic(board_size),
            self.to.to_algebraic(board_size)
        )
    }
}
