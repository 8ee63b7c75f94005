//! Game engine - the phase state machine and sole owner of session state
//!
//! [`GameSession`] is the aggregate root: board, both piece collections, the
//! budget, the side to move and the cached notation string all live here and
//! are only mutated through its methods.
//!
//! # Phase flow
//!
//! ```text
//! [Menu] --start_puzzle--> [Preparation] --start_playing--> [Playing] --solved / king taken--> [GameOver]
//!    ^                          ^                                                                 |
//!    |                          +----------------------------restart-----------------------------+
//!    +---------------------------------- reset (from any phase) ----------------------------------
//! ```
//!
//! # Failure semantics
//!
//! - Calls that don't fit the current phase return [`Rejection::WrongPhase`] (or
//!   `false`) and change nothing. Callers read [`GameSession::phase`] first.
//! - Malformed puzzle definitions return an [`EngineError`] and leave the
//!   session exactly as it was; the session controller decides to reset.
//! - The cached notation is recomputed after every successful mutation, so it
//!   always equals `encode(board, own, opponent, active)`.

use crate::advisor::{suggest, MoveAdvisor};
use crate::board::Board;
use crate::budget::PieceBudget;
use crate::error::{EngineError, EngineResult, NotationError, Rejection};
use crate::notation::{decode, encode};
use crate::placement::{
    attempt_placement, attempt_tray_placement, DragId, DragSource, DropResolution, DropTarget,
    PlacementConfig, PlacementContext, PlacementResolver,
};
use crate::types::{
    Cell, Move, Piece, PieceColor, PieceId, PieceIdAllocator, PieceLocation, PieceType, BOARD_SIZE,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// Top-level state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamePhase {
    #[default]
    Menu,
    Preparation,
    Playing,
    GameOver,
}

impl GamePhase {
    /// Whether `self -> next` is one of the allowed transitions
    pub fn can_transition_to(self, next: GamePhase) -> bool {
        matches!(
            (self, next),
            (_, GamePhase::Menu)
                | (GamePhase::Menu, GamePhase::Preparation)
                | (GamePhase::Preparation, GamePhase::Playing)
                | (GamePhase::Playing, GamePhase::GameOver)
                | (GamePhase::GameOver, GamePhase::Preparation)
        )
    }
}

/// How a finished game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GameOutcome {
    /// The designated solution move was played
    Solved,
    /// A king was captured
    KingCaptured { winner: PieceColor },
}

/// Puzzle as supplied by the catalog; immutable once loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleDefinition {
    pub id: String,
    pub name: String,
    pub difficulty: u32,
    pub max_player_value: u32,
    #[serde(default)]
    pub notation_string: String,
    /// Winning move as two algebraic cells, e.g. `"b2c3"`
    #[serde(default)]
    pub solution: Option<String>,
}

/// Static engine parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub board_size: usize,
    /// Color of the pieces the player owns and buys
    pub player_color: PieceColor,
    pub placement: PlacementConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            board_size: BOARD_SIZE,
            player_color: PieceColor::White,
            placement: PlacementConfig::default(),
        }
    }
}

/// One executed move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRecord {
    pub piece: PieceId,
    pub piece_type: PieceType,
    pub color: PieceColor,
    pub from: Cell,
    pub to: Cell,
    pub captured: Option<PieceType>,
    /// The move matched the puzzle solution
    pub solved: bool,
}

/// Read-only view handed to presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: GamePhase,
    pub puzzle_id: Option<String>,
    pub board: Board,
    pub own_pieces: Vec<Piece>,
    pub opponent_pieces: Vec<Piece>,
    pub active_color: PieceColor,
    pub notation_string: String,
    pub remaining_budget: u32,
    pub used_budget: u32,
    pub max_budget: u32,
    pub outcome: Option<GameOutcome>,
}

/// The session aggregate root
#[derive(Debug, Clone)]
pub struct GameSession {
    config: EngineConfig,
    phase: GamePhase,
    board: Board,
    own_pieces: Vec<Piece>,
    opponent_pieces: Vec<Piece>,
    active_color: PieceColor,
    notation: String,
    budget: PieceBudget,
    resolver: PlacementResolver,
    ids: PieceIdAllocator,
    puzzle: Option<PuzzleDefinition>,
    solution: Option<Move>,
    outcome: Option<GameOutcome>,
    history: Vec<MoveRecord>,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl GameSession {
    /// Fresh session in [`GamePhase::Menu`]
    pub fn new(config: EngineConfig) -> Self {
        let board = Board::new(config.board_size);
        let notation = encode(&board, &[], &[], PieceColor::White);
        Self {
            config,
            phase: GamePhase::Menu,
            board,
            own_pieces: Vec::new(),
            opponent_pieces: Vec::new(),
            active_color: PieceColor::White,
            notation,
            budget: PieceBudget::default(),
            resolver: PlacementResolver::new(config.placement),
            ids: PieceIdAllocator::default(),
            puzzle: None,
            solution: None,
            outcome: None,
            history: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn own_pieces(&self) -> &[Piece] {
        &self.own_pieces
    }

    pub fn opponent_pieces(&self) -> &[Piece] {
        &self.opponent_pieces
    }

    pub fn active_color(&self) -> PieceColor {
        self.active_color
    }

    pub fn player_color(&self) -> PieceColor {
        self.config.player_color
    }

    /// Cached notation string for the current position
    pub fn notation(&self) -> &str {
        &self.notation
    }

    pub fn budget(&self) -> &PieceBudget {
        &self.budget
    }

    pub fn puzzle(&self) -> Option<&PuzzleDefinition> {
        self.puzzle.as_ref()
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    /// Whether the player is the side to move in a running game
    pub fn is_player_turn(&self) -> bool {
        self.phase == GamePhase::Playing && self.active_color == self.config.player_color
    }

    /// Piece with `id` from either collection
    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.own_pieces
            .iter()
            .chain(self.opponent_pieces.iter())
            .find(|piece| piece.id == id)
    }

    /// Piece standing on `cell`
    pub fn piece_at(&self, cell: Cell) -> Option<&Piece> {
        self.board.get(cell).and_then(|id| self.piece(id))
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            puzzle_id: self.puzzle.as_ref().map(|puzzle| puzzle.id.clone()),
            board: self.board.clone(),
            own_pieces: self.own_pieces.clone(),
            opponent_pieces: self.opponent_pieces.clone(),
            active_color: self.active_color,
            notation_string: self.notation.clone(),
            remaining_budget: self.budget.remaining(),
            used_budget: self.budget.used_value(),
            max_budget: self.budget.max_value(),
            outcome: self.outcome,
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Load a puzzle and enter [`GamePhase::Preparation`]
    ///
    /// Everything is validated before any state changes, so a malformed
    /// definition leaves the session untouched.
    pub fn start_puzzle(&mut self, definition: &PuzzleDefinition) -> EngineResult<()> {
        let size = self.config.board_size;
        if definition.notation_string.trim().is_empty() {
            return Err(EngineError::InvalidPuzzle {
                puzzle_id: definition.id.clone(),
                message: "missing notation string".to_string(),
            });
        }

        let solution = match definition
            .solution
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
        {
            Some(text) => Some(Move::parse(text, size).ok_or_else(|| EngineError::InvalidPuzzle {
                puzzle_id: definition.id.clone(),
                message: format!("unreadable solution move '{text}'"),
            })?),
            None => None,
        };

        let decoded = decode(&definition.notation_string, size).map_err(|source| {
            EngineError::Notation {
                puzzle_id: definition.id.clone(),
                source,
            }
        })?;
        if let Some(ignored) = decoded.ignored_cells.first() {
            warn!(
                "[ENGINE] Puzzle '{}' has {} unknown piece symbol(s); aborting load",
                definition.id,
                decoded.ignored_cells.len()
            );
            return Err(EngineError::Notation {
                puzzle_id: definition.id.clone(),
                source: NotationError::UnknownPiece {
                    symbol: ignored.symbol,
                    row: usize::from(ignored.cell.y),
                    column: usize::from(ignored.cell.x),
                },
            });
        }

        self.reset();

        let player_color = self.config.player_color;
        self.ids = PieceIdAllocator::after(decoded.pieces.iter().map(|piece| &piece.id));
        let (own, opponent): (Vec<Piece>, Vec<Piece>) = decoded
            .pieces
            .into_iter()
            .partition(|piece| piece.color == player_color);
        self.own_pieces = own;
        self.opponent_pieces = opponent;
        self.board = decoded.board;
        self.active_color = decoded.active_color;
        self.budget.reset(definition.max_player_value);
        self.puzzle = Some(definition.clone());
        self.solution = solution;

        self.transition(GamePhase::Preparation);
        self.refresh_notation();
        info!(
            "[ENGINE] Loaded puzzle '{}' ({}): {} own / {} opponent pieces, budget {}",
            definition.id,
            definition.name,
            self.own_pieces.len(),
            self.opponent_pieces.len(),
            definition.max_player_value
        );
        Ok(())
    }

    /// Back to [`GamePhase::Menu`] with an empty board, from any phase
    pub fn reset(&mut self) {
        let board_size = self.config.board_size;
        self.board = Board::new(board_size);
        self.own_pieces.clear();
        self.opponent_pieces.clear();
        self.active_color = PieceColor::White;
        self.budget = PieceBudget::default();
        self.resolver.clear();
        self.ids = PieceIdAllocator::default();
        self.puzzle = None;
        self.solution = None;
        self.outcome = None;
        self.history.clear();
        self.transition(GamePhase::Menu);
        self.refresh_notation();
    }

    /// Replay the loaded puzzle from [`GamePhase::GameOver`]
    ///
    /// Returns `Ok(false)` in any other phase.
    pub fn restart(&mut self) -> EngineResult<bool> {
        if self.phase != GamePhase::GameOver {
            debug!("[ENGINE] Restart ignored in {:?}", self.phase);
            return Ok(false);
        }
        let definition = self.puzzle.clone().ok_or(EngineError::NoPuzzleLoaded)?;
        self.start_puzzle(&definition)?;
        Ok(true)
    }

    /// Leave preparation and start the game; the board is not touched
    pub fn start_playing(&mut self) -> bool {
        if self.phase != GamePhase::Preparation {
            debug!("[ENGINE] start_playing ignored in {:?}", self.phase);
            return false;
        }
        if self.resolver.pending_count() > 0 {
            debug!(
                "[ENGINE] Dropping {} open drag(s) at start of play",
                self.resolver.pending_count()
            );
            self.resolver.clear();
        }
        self.transition(GamePhase::Playing)
    }

    // ------------------------------------------------------------------
    // Preparation
    // ------------------------------------------------------------------

    /// Buy a tray piece straight onto `cell`
    pub fn place_piece(&mut self, piece_type: PieceType, cell: Cell) -> Result<PieceId, Rejection> {
        if self.phase != GamePhase::Preparation {
            return Err(self.reject("place_piece", Rejection::WrongPhase));
        }
        let piece = attempt_tray_placement(
            cell,
            piece_type,
            self.config.player_color,
            &mut self.board,
            &mut self.budget,
            &mut self.ids,
        )
        .map_err(|rejection| self.reject("place_piece", rejection))?;

        let id = piece.id;
        info!(
            "[ENGINE] Placed {} {} at {}",
            piece_type,
            id,
            cell.to_algebraic(self.config.board_size)
        );
        self.own_pieces.push(piece);
        self.refresh_notation();
        Ok(id)
    }

    /// Open a drag of a tray template or a bought piece
    pub fn begin_drag(&mut self, source: DragSource) -> Result<DragId, Rejection> {
        if self.phase != GamePhase::Preparation {
            return Err(self.reject("begin_drag", Rejection::WrongPhase));
        }
        self.resolver
            .begin_move(source, &self.own_pieces)
            .map_err(|rejection| self.reject("begin_drag", rejection))
    }

    /// Settle a drag; see [`crate::placement`] for the drop policy
    pub fn commit_drag(&mut self, drag: DragId, target: DropTarget) -> Result<DropResolution, Rejection> {
        if self.phase != GamePhase::Preparation {
            self.resolver.cancel_move(drag);
            return Err(self.reject("commit_drag", Rejection::WrongPhase));
        }
        let ctx = PlacementContext {
            board: &mut self.board,
            pieces: &mut self.own_pieces,
            budget: &mut self.budget,
            ids: &mut self.ids,
            color: self.config.player_color,
            orientation: self.active_color,
        };
        let resolution = self
            .resolver
            .commit_move(drag, target, ctx)
            .map_err(|rejection| self.reject("commit_drag", rejection))?;
        self.refresh_notation();
        Ok(resolution)
    }

    /// Abandon a drag; nothing on the board changes
    pub fn cancel_drag(&mut self, drag: DragId) -> bool {
        self.resolver.cancel_move(drag)
    }

    // ------------------------------------------------------------------
    // Play
    // ------------------------------------------------------------------

    /// Whether `from -> to` is the puzzle's designated solution
    ///
    /// Depends only on the definition, never on the board.
    pub fn check_solution(&self, from: Cell, to: Cell) -> bool {
        self.solution == Some(Move::new(from, to))
    }

    /// Move the active side's piece from `from` to `to`
    ///
    /// Only occupancy is enforced: the source must hold a piece of the side to
    /// move and the target must not hold a piece of the same color. Landing on
    /// an opposing piece captures it.
    pub fn move_piece(&mut self, from: Cell, to: Cell) -> Result<MoveRecord, Rejection> {
        if self.phase != GamePhase::Playing {
            return Err(self.reject("move_piece", Rejection::WrongPhase));
        }
        if !self.board.contains(from) || !self.board.contains(to) {
            return Err(self.reject("move_piece", Rejection::OutOfBounds));
        }
        let id = self
            .board
            .get(from)
            .ok_or_else(|| self.reject("move_piece", Rejection::EmptySource))?;
        let (color, piece_type) = match self.piece(id) {
            Some(piece) => (piece.color, piece.piece_type),
            None => {
                error!("[ENGINE] Board holds {} but no collection does", id);
                return Err(Rejection::UnknownPiece);
            }
        };
        if color != self.active_color {
            return Err(self.reject("move_piece", Rejection::NotYourTurn));
        }

        let target = self.board.get(to);
        let captured = match target.and_then(|target_id| self.piece(target_id)) {
            Some(victim) if victim.color == color || victim.id == id => {
                return Err(self.reject("move_piece", Rejection::Occupied));
            }
            Some(victim) => Some((victim.id, victim.piece_type)),
            None => None,
        };

        // Must be decided on the position before the move.
        let solved = self.check_solution(from, to);

        if let Some((victim_id, _)) = captured {
            self.board.clear(to);
            self.remove_piece(victim_id);
        }
        let mover = self
            .own_pieces
            .iter_mut()
            .chain(self.opponent_pieces.iter_mut())
            .find(|piece| piece.id == id)
            .ok_or(Rejection::UnknownPiece)?;
        attempt_placement(to, mover, &mut self.board)?;

        let record = MoveRecord {
            piece: id,
            piece_type,
            color,
            from,
            to,
            captured: captured.map(|(_, kind)| kind),
            solved,
        };
        self.history.push(record);
        self.active_color = self.active_color.opposite();

        let size = self.config.board_size;
        info!(
            "[ENGINE] {} {} {} -> {}{}",
            color,
            piece_type,
            from.to_algebraic(size),
            to.to_algebraic(size),
            record
                .captured
                .map(|kind| format!(" takes {kind}"))
                .unwrap_or_default()
        );

        if solved {
            self.finish(GameOutcome::Solved);
        } else if record.captured == Some(PieceType::King) {
            self.finish(GameOutcome::KingCaptured { winner: color });
        }
        self.refresh_notation();
        Ok(record)
    }

    /// Hand the move to the other side without moving (advisor had nothing)
    pub fn pass_turn(&mut self) -> bool {
        if self.phase != GamePhase::Playing {
            return false;
        }
        self.active_color = self.active_color.opposite();
        info!("[ENGINE] Turn passed to {}", self.active_color);
        self.refresh_notation();
        true
    }

    /// Ask the external advisor for a move in the current position
    ///
    /// Only meaningful while playing; failures and empty answers are `None`.
    pub async fn best_move(&self, advisor: &dyn MoveAdvisor) -> Option<Move> {
        if self.phase != GamePhase::Playing {
            return None;
        }
        suggest(advisor, &self.notation).await
    }

    /// Apply an advisor's move after revalidating it against the current board
    pub fn apply_suggestion(&mut self, suggestion: Move) -> Result<MoveRecord, Rejection> {
        debug!("[ENGINE] Applying suggestion {:?}", suggestion);
        self.move_piece(suggestion.from, suggestion.to)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn transition(&mut self, next: GamePhase) -> bool {
        if !self.phase.can_transition_to(next) {
            error!("[ENGINE] Illegal phase transition {:?} -> {:?}", self.phase, next);
            return false;
        }
        if self.phase != next {
            info!("[ENGINE] Phase {:?} -> {:?}", self.phase, next);
        }
        self.phase = next;
        true
    }

    fn finish(&mut self, outcome: GameOutcome) {
        self.outcome = Some(outcome);
        self.transition(GamePhase::GameOver);
        info!("[ENGINE] Game over: {:?}", outcome);
    }

    fn remove_piece(&mut self, id: PieceId) {
        for collection in [&mut self.own_pieces, &mut self.opponent_pieces] {
            if let Some(index) = collection.iter().position(|piece| piece.id == id) {
                let mut piece = collection.remove(index);
                piece.location = PieceLocation::Removed;
                debug!("[ENGINE] Removed {} {}", piece.piece_type, piece.id);
                return;
            }
        }
    }

    fn refresh_notation(&mut self) {
        self.notation = encode(
            &self.board,
            &self.own_pieces,
            &self.opponent_pieces,
            self.active_color,
        );
    }

    fn reject(&self, action: &str, rejection: Rejection) -> Rejection {
        debug!("[ENGINE] {} rejected in {:?}: {}", action, self.phase, rejection);
        rejection
    }
}

#[cfg(test)]
mod tests;
