//! Placement resolver - continuous drops to validated board mutations
//!
//! The presentation layer owns the pointer: it turns a drag gesture into either
//! a cell it already hit, or a point on the board plane, or a point in the tray
//! area. This module turns that into exactly one board mutation, or a
//! [`Rejection`].
//!
//! # Board-space coordinates
//!
//! Points are measured from the middle of the board in cell units. On a 5×5
//! board the centre of cell `(c, r)` sits at `x = c - 2`, `z = r - 2`:
//!
//! ```text
//!          x: -2   -1    0    1    2
//!   z: -2   a5   b5   c5   d5   e5
//!   z:  0   a3   b3   c3   d3   e3
//!   z:  2   a1   b1   c1   d1   e1
//! ```
//!
//! The scene is drawn from the active side. When Black is active the board is
//! turned 180°, so both axes are negated before snapping. Stored coordinates
//! never rotate.
//!
//! # Two-phase moves
//!
//! A drag is opened with [`PlacementResolver::begin_move`] and settled with
//! [`PlacementResolver::commit_move`]. Nothing on the board changes between the
//! two calls, and the commit applies its whole outcome in one call, so there is
//! no window where a piece is lifted but not yet put down.
//!
//! # Drop policy
//!
//! | Source | Drop resolves to a cell | Drop has no cell |
//! |--------|-------------------------|------------------|
//! | board piece | move within the board (occupied → rejected) | piece removed, value refunded |
//! | tray piece | buy and place (occupied / unaffordable → rejected) | back to the tray, or discarded past the discard distance |

use crate::board::Board;
use crate::budget::PieceBudget;
use crate::error::Rejection;
use crate::types::{
    Cell, Piece, PieceColor, PieceId, PieceIdAllocator, PieceLocation, PieceOrigin, PieceType,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// Point on the board plane, in cell units from the board centre
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoardPoint {
    pub x: f32,
    pub z: f32,
}

impl BoardPoint {
    pub fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    /// The same point seen from the other side of the board
    pub fn negated(self) -> Self {
        Self {
            x: -self.x,
            z: -self.z,
        }
    }

    pub fn distance(self, other: BoardPoint) -> f32 {
        (self.x - other.x).hypot(self.z - other.z)
    }
}

/// Tunables for drops that miss the board
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementConfig {
    /// Tray pieces dropped farther than this from `tray_anchor` are discarded
    pub discard_distance: f32,
    /// Reference point of the staging tray, in board-space units
    pub tray_anchor: BoardPoint,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            discard_distance: 3.5,
            tray_anchor: BoardPoint::new(0.0, 4.5),
        }
    }
}

/// Snap a board-space point to a cell, honouring board orientation
///
/// Returns `None` when the nearest cell lies outside `[0, board_size)` on either
/// axis.
pub fn resolve_cell_from_point(
    point: BoardPoint,
    board_size: usize,
    active_color: PieceColor,
) -> Option<Cell> {
    let oriented = match active_color {
        PieceColor::White => point,
        PieceColor::Black => point.negated(),
    };
    let half = (board_size as f32 - 1.0) / 2.0;
    let x = (oriented.x + half).round();
    let y = (oriented.z + half).round();
    let limit = board_size as f32;
    if !(0.0..limit).contains(&x) || !(0.0..limit).contains(&y) {
        return None;
    }
    Some(Cell::new(x as u8, y as u8))
}

/// Move a piece that already exists onto `cell`
///
/// Rejects when `cell` is off the board or holds a *different* piece. Dropping a
/// piece on its own cell succeeds and changes nothing. On success the previous
/// cell is cleared and the new one occupied before returning.
pub fn attempt_placement(cell: Cell, piece: &mut Piece, board: &mut Board) -> Result<Cell, Rejection> {
    if !board.contains(cell) {
        return Err(Rejection::OutOfBounds);
    }
    if let Some(occupant) = board.get(cell) {
        if occupant != piece.id {
            return Err(Rejection::Occupied);
        }
    }

    if let Some(previous) = piece.cell() {
        if board.get(previous) == Some(piece.id) {
            board.clear(previous);
        }
    }
    board.set(cell, piece.id);
    piece.location = PieceLocation::OnBoard(cell);
    Ok(cell)
}

/// Buy a tray piece and put it on `cell`
///
/// Budget and board change together or not at all: bounds and occupancy are
/// checked before the reservation, and the board write cannot fail after it.
pub fn attempt_tray_placement(
    cell: Cell,
    piece_type: PieceType,
    color: PieceColor,
    board: &mut Board,
    budget: &mut PieceBudget,
    ids: &mut PieceIdAllocator,
) -> Result<Piece, Rejection> {
    if !piece_type.in_tray() {
        return Err(Rejection::NotInTray);
    }
    if !board.contains(cell) {
        return Err(Rejection::OutOfBounds);
    }
    if !board.is_empty(cell) {
        return Err(Rejection::Occupied);
    }
    budget.reserve(piece_type)?;

    let id = ids.allocate();
    board.set(cell, id);
    Ok(Piece::new(id, piece_type, color, cell, PieceOrigin::Tray))
}

/// Handle for a drag opened with [`PlacementResolver::begin_move`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DragId(pub u32);

/// What is being dragged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum DragSource {
    /// A tray-bought piece already on the board
    Board(PieceId),
    /// A template from the staging tray
    Tray(PieceType),
}

/// Where presentation says the drag ended
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum DropTarget {
    /// Presentation already hit-tested a board cell
    Cell(Cell),
    /// A point over the board plane, still to be snapped
    BoardSpace(BoardPoint),
    /// A point in tray space (never resolves to a cell)
    TraySpace(BoardPoint),
}

/// What a committed drag did
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DropResolution {
    Moved { piece: PieceId, from: Cell, to: Cell },
    Placed { piece: PieceId, cell: Cell },
    Removed { piece: PieceId, refunded: u32 },
    ReturnedToTray { piece_type: PieceType },
    Discarded { piece_type: PieceType },
}

/// Session state a commit is allowed to change
#[derive(Debug)]
pub struct PlacementContext<'a> {
    pub board: &'a mut Board,
    /// The player's own pieces
    pub pieces: &'a mut Vec<Piece>,
    pub budget: &'a mut PieceBudget,
    pub ids: &'a mut PieceIdAllocator,
    /// Color given to newly bought pieces
    pub color: PieceColor,
    /// Side the board is currently drawn from
    pub orientation: PieceColor,
}

#[derive(Debug, Clone, Copy)]
struct PendingMove {
    source: DragSource,
}

/// Two-phase drag bookkeeping plus the drop policy
#[derive(Debug, Clone, Default)]
pub struct PlacementResolver {
    config: PlacementConfig,
    pending: HashMap<DragId, PendingMove>,
    next_drag: u32,
}

impl PlacementResolver {
    pub fn new(config: PlacementConfig) -> Self {
        Self {
            config,
            pending: HashMap::new(),
            next_drag: 0,
        }
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    /// Number of drags begun but not yet committed or cancelled
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Open a drag
    ///
    /// Board drags are limited to tray-bought pieces currently on the board, one
    /// drag per piece. Nothing is mutated.
    pub fn begin_move(&mut self, source: DragSource, pieces: &[Piece]) -> Result<DragId, Rejection> {
        match source {
            DragSource::Board(id) => {
                let piece = pieces
                    .iter()
                    .find(|piece| piece.id == id)
                    .ok_or(Rejection::UnknownPiece)?;
                if piece.origin != PieceOrigin::Tray || piece.cell().is_none() {
                    return Err(Rejection::NotDraggable);
                }
                let already_dragged = self
                    .pending
                    .values()
                    .any(|pending| pending.source == source);
                if already_dragged {
                    return Err(Rejection::NotDraggable);
                }
            }
            DragSource::Tray(piece_type) => {
                if !piece_type.in_tray() {
                    return Err(Rejection::NotInTray);
                }
            }
        }

        self.next_drag += 1;
        let drag = DragId(self.next_drag);
        self.pending.insert(drag, PendingMove { source });
        debug!("[PLACEMENT] Began {:?} as drag {}", source, drag.0);
        Ok(drag)
    }

    /// Drop a drag without touching the board
    pub fn cancel_move(&mut self, drag: DragId) -> bool {
        self.pending.remove(&drag).is_some()
    }

    /// Forget every open drag (new puzzle or reset)
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Settle a drag against the current session state
    ///
    /// The drag is consumed whether or not the drop is accepted; a rejected board
    /// drag leaves its piece where it was.
    pub fn commit_move(
        &mut self,
        drag: DragId,
        target: DropTarget,
        ctx: PlacementContext<'_>,
    ) -> Result<DropResolution, Rejection> {
        let pending = self.pending.remove(&drag).ok_or(Rejection::UnknownDrag)?;
        let board_size = ctx.board.size();
        let cell = match target {
            DropTarget::Cell(cell) => Some(cell).filter(|cell| ctx.board.contains(*cell)),
            DropTarget::BoardSpace(point) => {
                resolve_cell_from_point(point, board_size, ctx.orientation)
            }
            DropTarget::TraySpace(_) => None,
        };

        let resolution = match (pending.source, cell) {
            (DragSource::Board(id), Some(cell)) => {
                let piece = ctx
                    .pieces
                    .iter_mut()
                    .find(|piece| piece.id == id)
                    .ok_or(Rejection::UnknownPiece)?;
                let from = piece.cell().ok_or(Rejection::UnknownPiece)?;
                attempt_placement(cell, piece, ctx.board)?;
                DropResolution::Moved { piece: id, from, to: cell }
            }
            (DragSource::Board(id), None) => {
                let index = ctx
                    .pieces
                    .iter()
                    .position(|piece| piece.id == id)
                    .ok_or(Rejection::UnknownPiece)?;
                let piece = ctx.pieces.remove(index);
                if let Some(cell) = piece.cell() {
                    if ctx.board.get(cell) == Some(id) {
                        ctx.board.clear(cell);
                    }
                }
                ctx.budget.release(piece.piece_type);
                DropResolution::Removed {
                    piece: id,
                    refunded: piece.value,
                }
            }
            (DragSource::Tray(piece_type), Some(cell)) => {
                let piece = attempt_tray_placement(
                    cell,
                    piece_type,
                    ctx.color,
                    ctx.board,
                    ctx.budget,
                    ctx.ids,
                )?;
                let id = piece.id;
                ctx.pieces.push(piece);
                DropResolution::Placed { piece: id, cell }
            }
            (DragSource::Tray(piece_type), None) => {
                let distance = match target {
                    DropTarget::BoardSpace(point) | DropTarget::TraySpace(point) => {
                        point.distance(self.config.tray_anchor)
                    }
                    DropTarget::Cell(_) => 0.0,
                };
                if distance > self.config.discard_distance {
                    DropResolution::Discarded { piece_type }
                } else {
                    DropResolution::ReturnedToTray { piece_type }
                }
            }
        };

        info!("[PLACEMENT] Drag {} resolved: {:?}", drag.0, resolution);
        Ok(resolution)
    }
}

#[cfg(test)]
mod tests;
