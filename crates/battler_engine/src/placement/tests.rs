//! Placement resolver tests
//!
//! - `test_resolve_*` - snapping and orientation
//! - `test_placement_*` / `test_tray_*` - single-step placements
//! - `test_drag_*` - the begin/commit drop policy

use super::*;

fn cell(text: &str) -> Cell {
    Cell::from_algebraic(text, 5).expect("test cell must be valid")
}

struct Fixture {
    board: Board,
    pieces: Vec<Piece>,
    budget: PieceBudget,
    ids: PieceIdAllocator,
}

impl Fixture {
    fn new(max_value: u32) -> Self {
        Self {
            board: Board::new(5),
            pieces: Vec::new(),
            budget: PieceBudget::new(max_value),
            ids: PieceIdAllocator::default(),
        }
    }

    fn ctx(&mut self, orientation: PieceColor) -> PlacementContext<'_> {
        PlacementContext {
            board: &mut self.board,
            pieces: &mut self.pieces,
            budget: &mut self.budget,
            ids: &mut self.ids,
            color: PieceColor::White,
            orientation,
        }
    }

    /// Buy `piece_type` onto `at` through the drag path
    fn buy(&mut self, resolver: &mut PlacementResolver, piece_type: PieceType, at: &str) -> PieceId {
        let drag = resolver
            .begin_move(DragSource::Tray(piece_type), &self.pieces)
            .expect("tray drag opens");
        match resolver.commit_move(drag, DropTarget::Cell(cell(at)), self.ctx(PieceColor::White)) {
            Ok(DropResolution::Placed { piece, .. }) => piece,
            other => panic!("expected placement, got {:?}", other),
        }
    }
}

// ============================================================================
// Point resolution
// ============================================================================

#[test]
fn test_resolve_centre_and_corners() {
    let resolve = |x, z| resolve_cell_from_point(BoardPoint::new(x, z), 5, PieceColor::White);

    assert_eq!(resolve(0.0, 0.0), Some(cell("c3")));
    assert_eq!(resolve(-2.0, -2.0), Some(cell("a5")));
    assert_eq!(resolve(2.0, 2.0), Some(cell("e1")));
    assert_eq!(resolve(0.3, -0.4), Some(cell("c3")), "snaps to nearest centre");
    assert_eq!(resolve(1.6, 0.0), Some(cell("e3")));
}

#[test]
fn test_resolve_rejects_points_past_the_edge() {
    let resolve = |x, z| resolve_cell_from_point(BoardPoint::new(x, z), 5, PieceColor::White);

    assert_eq!(resolve(2.6, 0.0), None);
    assert_eq!(resolve(0.0, -2.7), None);
    assert_eq!(resolve(f32::NAN, 0.0), None);
    assert_eq!(resolve(2.4, 2.4), Some(cell("e1")), "still inside the last cell");
}

#[test]
fn test_resolve_black_rotates_the_board() {
    let point = BoardPoint::new(-2.0, -2.0);
    assert_eq!(
        resolve_cell_from_point(point, 5, PieceColor::Black),
        Some(cell("e1")),
        "Black's top-left is White's bottom-right"
    );
}

#[test]
fn test_resolve_orientation_symmetry() {
    //! Resolving as Black equals resolving the negated point as White, for a grid of
    //! points covering the board and its surroundings.
    for xi in -12..=12 {
        for zi in -12..=12 {
            let point = BoardPoint::new(xi as f32 * 0.25 + 0.01, zi as f32 * 0.25 - 0.02);
            assert_eq!(
                resolve_cell_from_point(point, 5, PieceColor::Black),
                resolve_cell_from_point(point.negated(), 5, PieceColor::White),
                "asymmetry at {:?}",
                point
            );
        }
    }
}

// ============================================================================
// Single-step placements
// ============================================================================

#[test]
fn test_placement_moves_piece_and_clears_origin() {
    let mut board = Board::new(5);
    let mut piece = Piece::new(PieceId(1), PieceType::Rook, PieceColor::White, cell("a1"), PieceOrigin::Tray);
    board.set(cell("a1"), piece.id);

    assert_eq!(attempt_placement(cell("a3"), &mut piece, &mut board), Ok(cell("a3")));
    assert!(board.is_empty(cell("a1")));
    assert_eq!(board.get(cell("a3")), Some(piece.id));
    assert_eq!(piece.cell(), Some(cell("a3")));
    assert_eq!(board.occupied_count(), 1);
}

#[test]
fn test_placement_onto_own_cell_is_accepted() {
    let mut board = Board::new(5);
    let mut piece = Piece::new(PieceId(1), PieceType::Rook, PieceColor::White, cell("b2"), PieceOrigin::Tray);
    board.set(cell("b2"), piece.id);

    assert_eq!(attempt_placement(cell("b2"), &mut piece, &mut board), Ok(cell("b2")));
    assert_eq!(board.get(cell("b2")), Some(piece.id));
}

#[test]
fn test_placement_onto_other_piece_is_rejected() {
    let mut board = Board::new(5);
    let mut mover = Piece::new(PieceId(1), PieceType::Rook, PieceColor::White, cell("a1"), PieceOrigin::Tray);
    board.set(cell("a1"), mover.id);
    board.set(cell("c3"), PieceId(2));
    let before = board.clone();

    assert_eq!(
        attempt_placement(cell("c3"), &mut mover, &mut board),
        Err(Rejection::Occupied)
    );
    assert_eq!(board, before, "rejected placement leaves the board unchanged");
    assert_eq!(mover.cell(), Some(cell("a1")));
}

#[test]
fn test_placement_out_of_bounds() {
    let mut board = Board::new(5);
    let mut piece = Piece::new(PieceId(1), PieceType::Pawn, PieceColor::White, cell("a1"), PieceOrigin::Tray);
    board.set(cell("a1"), piece.id);

    assert_eq!(
        attempt_placement(Cell::new(5, 1), &mut piece, &mut board),
        Err(Rejection::OutOfBounds)
    );
    assert_eq!(board.get(cell("a1")), Some(piece.id));
}

#[test]
fn test_tray_placement_reserves_and_places_together() {
    let mut fx = Fixture::new(10);

    let piece = attempt_tray_placement(
        cell("c2"),
        PieceType::Rook,
        PieceColor::White,
        &mut fx.board,
        &mut fx.budget,
        &mut fx.ids,
    )
    .expect("affordable and empty");

    assert_eq!(piece.origin, PieceOrigin::Tray);
    assert_eq!(fx.board.get(cell("c2")), Some(piece.id));
    assert_eq!(fx.budget.used_value(), 5);
}

#[test]
fn test_tray_placement_failures_change_nothing() {
    let mut fx = Fixture::new(4);
    fx.board.set(cell("c2"), PieceId(99));
    let board_before = fx.board.clone();

    let mut attempt = |at: Cell, piece_type: PieceType| {
        attempt_tray_placement(at, piece_type, PieceColor::White, &mut fx.board, &mut fx.budget, &mut fx.ids)
    };

    assert_eq!(attempt(cell("c2"), PieceType::Pawn), Err(Rejection::Occupied));
    assert_eq!(attempt(cell("c3"), PieceType::Rook), Err(Rejection::Unaffordable));
    assert_eq!(attempt(Cell::new(7, 0), PieceType::Pawn), Err(Rejection::OutOfBounds));
    assert_eq!(attempt(cell("c3"), PieceType::King), Err(Rejection::NotInTray));

    assert_eq!(fx.board, board_before);
    assert_eq!(fx.budget.used_value(), 0);
    assert_eq!(fx.ids.allocate(), PieceId(1), "no id was consumed");
}

// ============================================================================
// Drag policy
// ============================================================================

#[test]
fn test_drag_board_piece_to_new_cell() {
    let mut fx = Fixture::new(10);
    let mut resolver = PlacementResolver::default();
    let rook = fx.buy(&mut resolver, PieceType::Rook, "a1");

    let drag = resolver
        .begin_move(DragSource::Board(rook), &fx.pieces)
        .expect("tray piece is draggable");
    assert_eq!(fx.board.get(cell("a1")), Some(rook), "begin does not lift the piece");

    let result = resolver.commit_move(
        drag,
        DropTarget::BoardSpace(BoardPoint::new(0.1, 0.2)),
        fx.ctx(PieceColor::White),
    );
    assert_eq!(
        result,
        Ok(DropResolution::Moved { piece: rook, from: cell("a1"), to: cell("c3") })
    );
    assert!(fx.board.is_empty(cell("a1")));
    assert_eq!(fx.pieces[0].cell(), Some(cell("c3")));
    assert_eq!(resolver.pending_count(), 0);
}

#[test]
fn test_drag_board_piece_onto_occupied_cell_stays_put() {
    let mut fx = Fixture::new(10);
    let mut resolver = PlacementResolver::default();
    let rook = fx.buy(&mut resolver, PieceType::Rook, "a1");
    fx.buy(&mut resolver, PieceType::Pawn, "b1");
    let board_before = fx.board.clone();

    let drag = resolver.begin_move(DragSource::Board(rook), &fx.pieces).expect("draggable");
    let result = resolver.commit_move(drag, DropTarget::Cell(cell("b1")), fx.ctx(PieceColor::White));

    assert_eq!(result, Err(Rejection::Occupied));
    assert_eq!(fx.board, board_before);
    assert_eq!(fx.budget.used_value(), 6);
}

#[test]
fn test_drag_board_piece_off_board_refunds_value() {
    let mut fx = Fixture::new(10);
    let mut resolver = PlacementResolver::default();
    let queen = fx.buy(&mut resolver, PieceType::Queen, "c3");
    assert_eq!(fx.budget.used_value(), 9);

    let drag = resolver.begin_move(DragSource::Board(queen), &fx.pieces).expect("draggable");
    let result = resolver.commit_move(
        drag,
        DropTarget::BoardSpace(BoardPoint::new(6.0, 0.0)),
        fx.ctx(PieceColor::White),
    );

    assert_eq!(result, Ok(DropResolution::Removed { piece: queen, refunded: 9 }));
    assert!(fx.pieces.is_empty());
    assert_eq!(fx.board.occupied_count(), 0);
    assert_eq!(fx.budget.used_value(), 0);
}

#[test]
fn test_drag_onto_off_board_cell_follows_miss_policy() {
    let mut fx = Fixture::new(10);
    let mut resolver = PlacementResolver::default();
    let rook = fx.buy(&mut resolver, PieceType::Rook, "a5");
    assert_eq!(fx.budget.used_value(), 5);

    let drag = resolver.begin_move(DragSource::Board(rook), &fx.pieces).expect("draggable");
    assert_eq!(
        resolver.commit_move(drag, DropTarget::Cell(Cell::new(7, 0)), fx.ctx(PieceColor::White)),
        Ok(DropResolution::Removed { piece: rook, refunded: 5 })
    );
    assert!(fx.pieces.is_empty());
    assert_eq!(fx.board.occupied_count(), 0);
    assert_eq!(fx.budget.used_value(), 0);

    let drag = resolver.begin_move(DragSource::Tray(PieceType::Pawn), &fx.pieces).expect("opens");
    assert_eq!(
        resolver.commit_move(drag, DropTarget::Cell(Cell::new(0, 9)), fx.ctx(PieceColor::White)),
        Ok(DropResolution::ReturnedToTray { piece_type: PieceType::Pawn })
    );
    assert_eq!(fx.budget.used_value(), 0);
}

#[test]
fn test_drag_tray_piece_returns_or_discards() {
    let mut fx = Fixture::new(10);
    let mut resolver = PlacementResolver::new(PlacementConfig {
        discard_distance: 2.0,
        tray_anchor: BoardPoint::new(0.0, 5.0),
    });

    let near = resolver.begin_move(DragSource::Tray(PieceType::Knight), &fx.pieces).expect("opens");
    assert_eq!(
        resolver.commit_move(near, DropTarget::TraySpace(BoardPoint::new(1.0, 5.5)), fx.ctx(PieceColor::White)),
        Ok(DropResolution::ReturnedToTray { piece_type: PieceType::Knight })
    );

    let far = resolver.begin_move(DragSource::Tray(PieceType::Knight), &fx.pieces).expect("opens");
    assert_eq!(
        resolver.commit_move(far, DropTarget::BoardSpace(BoardPoint::new(-6.0, 5.0)), fx.ctx(PieceColor::White)),
        Ok(DropResolution::Discarded { piece_type: PieceType::Knight })
    );

    assert_eq!(fx.budget.used_value(), 0, "tray drops never touch the budget");
    assert!(fx.pieces.is_empty());
}

#[test]
fn test_drag_tray_piece_unaffordable() {
    let mut fx = Fixture::new(2);
    let mut resolver = PlacementResolver::default();

    let drag = resolver.begin_move(DragSource::Tray(PieceType::Bishop), &fx.pieces).expect("opens");
    assert_eq!(
        resolver.commit_move(drag, DropTarget::Cell(cell("d4")), fx.ctx(PieceColor::White)),
        Err(Rejection::Unaffordable)
    );
    assert_eq!(fx.board.occupied_count(), 0);
}

#[test]
fn test_drag_uses_black_orientation() {
    let mut fx = Fixture::new(10);
    let mut resolver = PlacementResolver::default();

    let drag = resolver.begin_move(DragSource::Tray(PieceType::Pawn), &fx.pieces).expect("opens");
    let result = resolver.commit_move(
        drag,
        DropTarget::BoardSpace(BoardPoint::new(-2.0, -2.0)),
        fx.ctx(PieceColor::Black),
    );
    assert!(matches!(result, Ok(DropResolution::Placed { cell: at, .. }) if at == cell("e1")));
}

#[test]
fn test_drag_rules_for_begin() {
    let mut fx = Fixture::new(10);
    let mut resolver = PlacementResolver::default();
    let pawn = fx.buy(&mut resolver, PieceType::Pawn, "a2");
    fx.pieces.push(Piece::new(PieceId(50), PieceType::Rook, PieceColor::White, cell("e1"), PieceOrigin::Puzzle));

    assert_eq!(
        resolver.begin_move(DragSource::Board(PieceId(50)), &fx.pieces),
        Err(Rejection::NotDraggable),
        "puzzle pieces are fixed"
    );
    assert_eq!(
        resolver.begin_move(DragSource::Board(PieceId(77)), &fx.pieces),
        Err(Rejection::UnknownPiece)
    );
    assert_eq!(
        resolver.begin_move(DragSource::Tray(PieceType::King), &fx.pieces),
        Err(Rejection::NotInTray)
    );

    let first = resolver.begin_move(DragSource::Board(pawn), &fx.pieces).expect("draggable");
    assert_eq!(
        resolver.begin_move(DragSource::Board(pawn), &fx.pieces),
        Err(Rejection::NotDraggable),
        "one drag per piece"
    );
    assert!(resolver.cancel_move(first));
    assert!(!resolver.cancel_move(first));
    assert_eq!(
        resolver.commit_move(first, DropTarget::Cell(cell("a3")), fx.ctx(PieceColor::White)),
        Err(Rejection::UnknownDrag)
    );
}
