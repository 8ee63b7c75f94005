//! Game engine tests
//!
//! - `test_start_*` - puzzle loading and its failure modes
//! - `test_prepare_*` - placement and drags during preparation
//! - `test_play_*` - moves, captures, solutions and turn order
//! - `test_lifecycle_*` - restart, reset and the phase table

use super::*;
use crate::advisor::AdvisorError;
use crate::placement::BoardPoint;
use async_trait::async_trait;
use futures_lite::future::block_on;
use std::sync::atomic::{AtomicUsize, Ordering};

fn cell(text: &str) -> Cell {
    Cell::from_algebraic(text, 5).expect("test cell must be valid")
}

/// Black king on c5, white king on e1, solution c3 -> c5
fn puzzle(max_player_value: u32) -> PuzzleDefinition {
    PuzzleDefinition {
        id: "test-01".to_string(),
        name: "Test puzzle".to_string(),
        difficulty: 1,
        max_player_value,
        notation_string: "2k2/5/5/5/4K w".to_string(),
        solution: Some("c3c5".to_string()),
    }
}

fn prepared(max_player_value: u32) -> GameSession {
    let mut session = GameSession::default();
    session
        .start_puzzle(&puzzle(max_player_value))
        .expect("test puzzle is well-formed");
    session
}

/// Queen on c3, game running
fn playing_with_queen(definition: &PuzzleDefinition) -> GameSession {
    let mut session = GameSession::default();
    session.start_puzzle(definition).expect("test puzzle is well-formed");
    session
        .place_piece(PieceType::Queen, cell("c3"))
        .expect("queen fits the budget");
    assert!(session.start_playing());
    session
}

struct FixedAdvisor {
    answer: Result<Option<Move>, AdvisorError>,
    calls: AtomicUsize,
}

impl FixedAdvisor {
    fn new(answer: Result<Option<Move>, AdvisorError>) -> Self {
        Self {
            answer,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl MoveAdvisor for FixedAdvisor {
    async fn best_move(&self, _notation: &str) -> Result<Option<Move>, AdvisorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone()
    }
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_new_session_starts_in_menu() {
    let session = GameSession::default();
    assert_eq!(session.phase(), GamePhase::Menu);
    assert_eq!(session.notation(), "5/5/5/5/5 w");
    assert!(session.puzzle().is_none());
    assert_eq!(session.budget().max_value(), 0);
}

#[test]
fn test_start_empty_puzzle() {
    //! An empty layout is a valid puzzle: nothing to fight, full budget.
    let mut session = GameSession::default();
    let definition = PuzzleDefinition {
        id: "empty".to_string(),
        name: "Empty".to_string(),
        difficulty: 0,
        max_player_value: 15,
        notation_string: "5/5/5/5/5 w".to_string(),
        solution: None,
    };

    session.start_puzzle(&definition).expect("empty board is valid");

    assert_eq!(session.phase(), GamePhase::Preparation);
    assert_eq!(session.board().occupied_count(), 0);
    assert_eq!(session.budget().remaining(), 15);
    assert_eq!(session.notation(), "5/5/5/5/5 w");
}

#[test]
fn test_start_partitions_pieces_by_player_color() {
    let session = prepared(10);

    assert_eq!(session.own_pieces().len(), 1);
    assert_eq!(session.own_pieces()[0].piece_type, PieceType::King);
    assert_eq!(session.own_pieces()[0].cell(), Some(cell("e1")));
    assert_eq!(session.opponent_pieces().len(), 1);
    assert_eq!(session.opponent_pieces()[0].color, PieceColor::Black);
    assert_eq!(session.active_color(), PieceColor::White);
    assert_eq!(session.notation(), "2k2/5/5/5/4K w", "cached notation matches the definition");
}

#[test]
fn test_start_as_black_owns_lowercase_pieces() {
    let mut session = GameSession::new(EngineConfig {
        player_color: PieceColor::Black,
        ..EngineConfig::default()
    });
    session.start_puzzle(&puzzle(10)).expect("valid");

    assert_eq!(session.own_pieces()[0].cell(), Some(cell("c5")));
    assert_eq!(session.opponent_pieces()[0].cell(), Some(cell("e1")));

    let id = session.place_piece(PieceType::Pawn, cell("a4")).expect("affordable");
    assert_eq!(session.piece(id).map(|piece| piece.color), Some(PieceColor::Black));
    assert_eq!(session.notation(), "2k2/p4/5/5/4K w");
}

#[test]
fn test_start_rejects_blank_notation() {
    let mut session = GameSession::default();
    let mut definition = puzzle(10);
    definition.notation_string = "   ".to_string();

    let err = session.start_puzzle(&definition).unwrap_err();
    assert!(matches!(err, EngineError::InvalidPuzzle { .. }), "got {err:?}");
    assert_eq!(session.phase(), GamePhase::Menu);
}

#[test]
fn test_start_rejects_malformed_solution() {
    let mut session = GameSession::default();
    let mut definition = puzzle(10);
    definition.solution = Some("c3".to_string());

    let err = session.start_puzzle(&definition).unwrap_err();
    assert!(matches!(err, EngineError::InvalidPuzzle { .. }), "got {err:?}");
}

#[test]
fn test_start_reports_malformed_notation() {
    let mut session = GameSession::default();
    let mut definition = puzzle(10);
    definition.notation_string = "5/5/5/5 w".to_string();

    let err = session.start_puzzle(&definition).unwrap_err();
    assert_eq!(
        err,
        EngineError::Notation {
            puzzle_id: "test-01".to_string(),
            source: NotationError::RowCount { expected: 5, found: 4 },
        }
    );
}

#[test]
fn test_start_reports_oversized_run() {
    let mut session = GameSession::default();
    let mut definition = puzzle(10);
    definition.notation_string = "99999999999999999999999p/5/5/5/5 w".to_string();

    let err = session.start_puzzle(&definition).unwrap_err();
    assert!(
        matches!(
            err,
            EngineError::Notation { source: NotationError::RowWidth { row: 0, .. }, .. }
        ),
        "got {err:?}"
    );
    assert_eq!(session.phase(), GamePhase::Menu, "engine untouched");
}

#[test]
fn test_start_aborts_on_unknown_symbols() {
    let mut session = GameSession::default();
    let mut definition = puzzle(10);
    definition.notation_string = "2x2/5/5/5/4K w".to_string();

    let err = session.start_puzzle(&definition).unwrap_err();
    assert_eq!(
        err,
        EngineError::Notation {
            puzzle_id: "test-01".to_string(),
            source: NotationError::UnknownPiece {
                symbol: 'x',
                row: 0,
                column: 2,
            },
        }
    );
    assert_eq!(session.phase(), GamePhase::Menu);
}

#[test]
fn test_start_failure_leaves_loaded_puzzle_untouched() {
    let mut session = prepared(10);
    session.place_piece(PieceType::Pawn, cell("a1")).expect("affordable");
    let before = session.snapshot();

    let mut broken = puzzle(10);
    broken.id = "broken".to_string();
    broken.notation_string = "6/5/5/5/5 w".to_string();
    assert!(session.start_puzzle(&broken).is_err());

    assert_eq!(session.snapshot(), before);
}

// ============================================================================
// Preparation
// ============================================================================

#[test]
fn test_prepare_budget_scenario() {
    let mut session = prepared(15);

    assert!(session.place_piece(PieceType::Queen, cell("a1")).is_ok());
    assert!(session.place_piece(PieceType::Rook, cell("b1")).is_ok());
    assert_eq!(session.budget().used_value(), 14);
    assert_eq!(session.budget().remaining(), 1);

    assert_eq!(
        session.place_piece(PieceType::Bishop, cell("c1")),
        Err(Rejection::Unaffordable)
    );
    assert_eq!(session.budget().used_value(), 14);
    assert!(session.board().is_empty(cell("c1")));
    assert_eq!(session.notation(), "2k2/5/5/5/QR2K w");
}

#[test]
fn test_prepare_occupied_cell_is_rejected() {
    let mut session = prepared(15);
    let board_before = session.board().clone();

    assert_eq!(
        session.place_piece(PieceType::Pawn, cell("c5")),
        Err(Rejection::Occupied),
        "opponent king stands on c5"
    );
    assert_eq!(session.board(), &board_before);
    assert_eq!(session.budget().used_value(), 0);
}

#[test]
fn test_prepare_rejects_king_purchase() {
    let mut session = prepared(15);
    assert_eq!(
        session.place_piece(PieceType::King, cell("a1")),
        Err(Rejection::NotInTray)
    );
}

#[test]
fn test_prepare_phase_guard() {
    let mut menu = GameSession::default();
    assert_eq!(
        menu.place_piece(PieceType::Pawn, cell("a1")),
        Err(Rejection::WrongPhase)
    );
    assert_eq!(menu.board().occupied_count(), 0);

    let mut playing = prepared(15);
    playing.start_playing();
    let before = playing.snapshot();
    assert_eq!(
        playing.place_piece(PieceType::Pawn, cell("a1")),
        Err(Rejection::WrongPhase)
    );
    assert_eq!(
        playing.begin_drag(DragSource::Tray(PieceType::Pawn)),
        Err(Rejection::WrongPhase)
    );
    assert_eq!(playing.snapshot(), before);
}

#[test]
fn test_prepare_drag_place_then_remove() {
    let mut session = prepared(10);

    let drag = session.begin_drag(DragSource::Tray(PieceType::Queen)).expect("tray drag");
    let placed = session.commit_drag(drag, DropTarget::Cell(cell("c3"))).expect("free cell");
    let queen = match placed {
        DropResolution::Placed { piece, cell: at } => {
            assert_eq!(at, cell("c3"));
            piece
        }
        other => panic!("expected placement, got {other:?}"),
    };
    assert_eq!(session.notation(), "2k2/5/2Q2/5/4K w");
    assert_eq!(session.budget().remaining(), 1);

    let drag = session.begin_drag(DragSource::Board(queen)).expect("bought piece");
    let removed = session
        .commit_drag(drag, DropTarget::TraySpace(BoardPoint::new(0.0, 4.5)))
        .expect("drop off board");
    assert_eq!(removed, DropResolution::Removed { piece: queen, refunded: 9 });
    assert_eq!(session.budget().remaining(), 10);
    assert_eq!(session.notation(), "2k2/5/5/5/4K w");
    assert!(session.piece(queen).is_none());
}

#[test]
fn test_prepare_puzzle_pieces_cannot_be_dragged() {
    let mut session = prepared(10);
    let own_king = session.own_pieces()[0].id;
    let opponent_king = session.opponent_pieces()[0].id;

    assert_eq!(session.begin_drag(DragSource::Board(own_king)), Err(Rejection::NotDraggable));
    assert_eq!(
        session.begin_drag(DragSource::Board(opponent_king)),
        Err(Rejection::UnknownPiece),
        "opponent pieces are not the player's to drag"
    );
}

#[test]
fn test_prepare_open_drags_end_with_preparation() {
    let mut session = prepared(10);
    let drag = session.begin_drag(DragSource::Tray(PieceType::Pawn)).expect("tray drag");

    assert!(session.start_playing());
    assert_eq!(
        session.commit_drag(drag, DropTarget::Cell(cell("a1"))),
        Err(Rejection::WrongPhase)
    );
    assert!(!session.cancel_drag(drag), "drag was dropped at start of play");
    assert!(session.board().is_empty(cell("a1")));
}

// ============================================================================
// Play
// ============================================================================

#[test]
fn test_play_start_playing_only_from_preparation() {
    let mut menu = GameSession::default();
    assert!(!menu.start_playing());
    assert_eq!(menu.phase(), GamePhase::Menu);

    let mut session = prepared(10);
    let board_before = session.board().clone();
    assert!(session.start_playing());
    assert_eq!(session.phase(), GamePhase::Playing);
    assert_eq!(session.board(), &board_before);
    assert!(!session.start_playing(), "already playing");
}

#[test]
fn test_play_move_rejections() {
    let mut session = playing_with_queen(&puzzle(10));
    let before = session.snapshot();

    assert_eq!(session.move_piece(cell("b2"), cell("b3")), Err(Rejection::EmptySource));
    assert_eq!(
        session.move_piece(cell("c5"), cell("c4")),
        Err(Rejection::NotYourTurn),
        "black king while white is active"
    );
    assert_eq!(session.move_piece(cell("c3"), cell("e1")), Err(Rejection::Occupied));
    assert_eq!(session.move_piece(cell("c3"), cell("c3")), Err(Rejection::Occupied));
    assert_eq!(
        session.move_piece(cell("c3"), Cell::new(7, 0)),
        Err(Rejection::OutOfBounds)
    );
    assert_eq!(session.snapshot(), before, "rejections change nothing");
}

#[test]
fn test_play_move_requires_playing_phase() {
    let mut session = prepared(10);
    session.place_piece(PieceType::Queen, cell("c3")).expect("affordable");
    assert_eq!(session.move_piece(cell("c3"), cell("c4")), Err(Rejection::WrongPhase));
}

#[test]
fn test_play_move_switches_side_and_notation() {
    let mut session = playing_with_queen(&puzzle(10));

    let record = session.move_piece(cell("c3"), cell("a3")).expect("legal move");

    assert_eq!(record.from, cell("c3"));
    assert_eq!(record.to, cell("a3"));
    assert_eq!(record.captured, None);
    assert!(!record.solved);
    assert_eq!(session.active_color(), PieceColor::Black);
    assert_eq!(session.notation(), "2k2/5/Q4/5/4K b");
    assert_eq!(session.history().len(), 1);
    assert_eq!(session.phase(), GamePhase::Playing);

    let queen = session.piece(record.piece).expect("still on board");
    assert_eq!(queen.cell(), Some(cell("a3")));
    assert_eq!(session.board().get(cell("a3")), Some(record.piece));
    assert!(session.board().is_empty(cell("c3")));
}

#[test]
fn test_play_solution_ends_game() {
    let mut session = playing_with_queen(&puzzle(10));

    assert!(session.check_solution(cell("c3"), cell("c5")));
    assert!(!session.check_solution(cell("c3"), cell("c4")));

    let record = session.move_piece(cell("c3"), cell("c5")).expect("solution move");

    assert!(record.solved);
    assert_eq!(record.captured, Some(PieceType::King));
    assert_eq!(session.phase(), GamePhase::GameOver);
    assert_eq!(session.outcome(), Some(GameOutcome::Solved), "solution wins over king capture");
    assert!(session.opponent_pieces().is_empty());
    assert_eq!(session.notation(), "2Q2/5/5/5/4K b");
}

#[test]
fn test_play_check_solution_ignores_board() {
    //! The designated move is compared as data; c3 is still empty here.
    let session = prepared(10);
    assert!(session.check_solution(cell("c3"), cell("c5")));

    let menu = GameSession::default();
    assert!(!menu.check_solution(cell("c3"), cell("c5")), "no puzzle, no solution");
}

#[test]
fn test_play_king_capture_ends_game() {
    let mut definition = puzzle(10);
    definition.solution = None;
    let mut session = playing_with_queen(&definition);

    session.move_piece(cell("c3"), cell("c5")).expect("capture");

    assert_eq!(session.phase(), GamePhase::GameOver);
    assert_eq!(
        session.outcome(),
        Some(GameOutcome::KingCaptured { winner: PieceColor::White })
    );
}

#[test]
fn test_play_capture_removes_victim() {
    let mut definition = puzzle(10);
    definition.notation_string = "2k2/2p2/5/5/4K w".to_string();
    definition.solution = None;
    let mut session = playing_with_queen(&definition);

    let record = session.move_piece(cell("c3"), cell("c4")).expect("capture pawn");

    assert_eq!(record.captured, Some(PieceType::Pawn));
    assert_eq!(session.opponent_pieces().len(), 1);
    assert_eq!(session.phase(), GamePhase::Playing, "only a king capture ends the game");
    assert_eq!(session.notation(), "2k2/2Q2/5/5/4K b");
}

#[test]
fn test_play_pass_turn() {
    let mut prep = prepared(10);
    assert!(!prep.pass_turn());

    let mut session = playing_with_queen(&puzzle(10));
    assert!(session.pass_turn());
    assert_eq!(session.active_color(), PieceColor::Black);
    assert!(session.notation().ends_with(" b"));
    assert!(!session.is_player_turn());
}

#[test]
fn test_play_best_move_consults_advisor() {
    let mut session = playing_with_queen(&puzzle(10));
    session.pass_turn();
    let advisor = FixedAdvisor::new(Ok(Some(Move::new(cell("c5"), cell("c4")))));

    let suggestion = block_on(session.best_move(&advisor)).expect("advisor has a move");
    let record = session.apply_suggestion(suggestion).expect("still valid");

    assert_eq!(record.color, PieceColor::Black);
    assert_eq!(session.active_color(), PieceColor::White);
    assert_eq!(advisor.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_play_best_move_outside_play_skips_advisor() {
    let session = prepared(10);
    let advisor = FixedAdvisor::new(Ok(Some(Move::new(cell("c5"), cell("c4")))));

    assert_eq!(block_on(session.best_move(&advisor)), None);
    assert_eq!(advisor.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_play_advisor_failure_is_no_suggestion() {
    let session = playing_with_queen(&puzzle(10));
    let advisor = FixedAdvisor::new(Err(AdvisorError::Unavailable {
        message: "offline".to_string(),
    }));

    assert_eq!(block_on(session.best_move(&advisor)), None);
}

#[test]
fn test_play_stale_suggestion_is_revalidated() {
    let mut session = playing_with_queen(&puzzle(10));
    session.pass_turn();
    // Suggested for a position where a black piece stood on b4.
    assert_eq!(
        session.apply_suggestion(Move::new(cell("b4"), cell("b3"))),
        Err(Rejection::EmptySource)
    );
    assert_eq!(session.active_color(), PieceColor::Black);
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_lifecycle_restart_from_game_over() {
    let mut session = playing_with_queen(&puzzle(10));
    assert_eq!(session.restart(), Ok(false), "restart needs a finished game");

    session.move_piece(cell("c3"), cell("c5")).expect("solution");
    assert_eq!(session.restart(), Ok(true));

    assert_eq!(session.phase(), GamePhase::Preparation);
    assert_eq!(session.notation(), "2k2/5/5/5/4K w");
    assert_eq!(session.budget().remaining(), 10);
    assert_eq!(session.outcome(), None);
    assert!(session.history().is_empty());
}

#[test]
fn test_lifecycle_reset_from_any_phase() {
    let mut session = playing_with_queen(&puzzle(10));
    session.reset();

    assert_eq!(session.phase(), GamePhase::Menu);
    assert_eq!(session.board().occupied_count(), 0);
    assert!(session.own_pieces().is_empty());
    assert!(session.puzzle().is_none());
    assert_eq!(session.notation(), "5/5/5/5/5 w");
}

#[test]
fn test_lifecycle_phase_table() {
    use GamePhase::*;

    assert!(Menu.can_transition_to(Preparation));
    assert!(Preparation.can_transition_to(Playing));
    assert!(Playing.can_transition_to(GameOver));
    assert!(GameOver.can_transition_to(Preparation));
    for phase in [Menu, Preparation, Playing, GameOver] {
        assert!(phase.can_transition_to(Menu), "{phase:?} -> Menu");
    }

    assert!(!Menu.can_transition_to(Playing));
    assert!(!Preparation.can_transition_to(GameOver));
    assert!(!Playing.can_transition_to(Preparation));
    assert!(!GameOver.can_transition_to(Playing));
}

#[test]
fn test_lifecycle_snapshot_serializes_camel_case() {
    let session = prepared(10);
    let json = serde_json::to_value(session.snapshot()).expect("snapshot serializes");

    assert_eq!(json["phase"], "PREPARATION");
    assert_eq!(json["puzzleId"], "test-01");
    assert_eq!(json["notationString"], "2k2/5/5/5/4K w");
    assert_eq!(json["remainingBudget"], 10);
    assert_eq!(json["activeColor"], "white");
    assert!(json["ownPieces"].is_array());
}

#[test]
fn test_lifecycle_puzzle_definition_json() {
    let json = r#"{
        "id": "p1",
        "name": "Corner",
        "difficulty": 2,
        "maxPlayerValue": 8,
        "notationString": "4k/5/5/5/K4 w"
    }"#;
    let definition: PuzzleDefinition = serde_json::from_str(json).expect("valid puzzle json");

    assert_eq!(definition.max_player_value, 8);
    assert_eq!(definition.solution, None);
}
