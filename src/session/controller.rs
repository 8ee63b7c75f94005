//! Session controller
//!
//! Wraps a [`GameSession`] with everything that depends on time: the
//! preparation countdown, pause bookkeeping and the opponent's move schedule.
//! The controller is synchronous and clock-free; [`SessionController::advance`]
//! is told how much time passed and returns what happened. The tokio actor in
//! [`crate::session::runtime`] is the only production caller.
//!
//! # Opponent turns
//!
//! When the opponent becomes the side to move the controller arms a delay.
//! Once it runs out, `advance` emits a [`SuggestionRequest`] stamped with the
//! current generation and notation. Whoever asks the advisor hands the answer
//! back through [`SessionController::apply_suggestion`], which throws it away
//! if the session moved on in the meantime.
//!
//! The generation counter is bumped whenever a phase is left or the position
//! changes, which disarms every timer and request that belonged to the old
//! state.

use crate::core::{CoreError, CoreResult};
use crate::session::countdown::PreparationCountdown;
use crate::session::pause::PauseCounter;
use battler_engine::{
    Cell, DragId, DragSource, DropResolution, DropTarget, EngineConfig, GamePhase, GameSession,
    Move, MoveRecord, PieceId, PieceType, PuzzleDefinition, Rejection, SessionSnapshot,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Timing parameters of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    pub preparation_units: u32,
    pub unit_millis: u64,
    pub opponent_delay_millis: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            preparation_units: 60,
            unit_millis: 1000,
            opponent_delay_millis: 800,
        }
    }
}

/// Request for an advisor move, valid only for the state it was issued in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionRequest {
    pub generation: u64,
    pub notation: String,
}

/// Something that happened during [`SessionController::advance`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The countdown lost one or more units
    CountdownTick { remaining: u32 },
    /// The countdown ran out and play started
    PlayStarted,
    /// The opponent delay ran out; ask the advisor
    SuggestionRequested(SuggestionRequest),
}

/// Result of handing an advisor answer back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionOutcome {
    /// The move was valid and executed
    Applied(MoveRecord),
    /// The advisor had nothing; the turn went back to the player
    Passed,
    /// The move no longer fit the board; the turn went back to the player
    Rejected(Rejection),
    /// The request belonged to an older state and was ignored
    Stale,
}

/// Presentation view: the engine snapshot plus timer state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    #[serde(flatten)]
    pub snapshot: SessionSnapshot,
    /// Units left in preparation, `None` outside preparation
    pub countdown_remaining: Option<u32>,
    pub paused: bool,
    /// An opponent move is being waited for
    pub opponent_thinking: bool,
}

#[derive(Debug, Clone)]
pub struct SessionController {
    game: GameSession,
    config: SessionConfig,
    countdown: PreparationCountdown,
    pauses: PauseCounter,
    generation: u64,
    opponent_delay: Option<u64>,
    pending_request: Option<SuggestionRequest>,
}

impl SessionController {
    pub fn new(engine: EngineConfig, config: SessionConfig) -> Self {
        Self {
            game: GameSession::new(engine),
            config,
            countdown: PreparationCountdown::new(config.preparation_units, config.unit_millis),
            pauses: PauseCounter::default(),
            generation: 0,
            opponent_delay: None,
            pending_request: None,
        }
    }

    pub fn game(&self) -> &GameSession {
        &self.game
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> GamePhase {
        self.game.phase()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn countdown(&self) -> &PreparationCountdown {
        &self.countdown
    }

    pub fn is_paused(&self) -> bool {
        self.pauses.is_paused()
    }

    /// Request handed out and not yet answered
    pub fn pending_request(&self) -> Option<&SuggestionRequest> {
        self.pending_request.as_ref()
    }

    pub fn view(&self) -> SessionView {
        let countdown_remaining = (self.game.phase() == GamePhase::Preparation)
            .then(|| self.countdown.remaining_units());
        SessionView {
            snapshot: self.game.snapshot(),
            countdown_remaining,
            paused: self.pauses.is_paused(),
            opponent_thinking: self.opponent_delay.is_some() || self.pending_request.is_some(),
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Load a puzzle and start the preparation countdown
    ///
    /// A malformed definition resets the session to the menu before the error
    /// is returned.
    pub fn start_puzzle(&mut self, definition: &PuzzleDefinition) -> CoreResult<()> {
        if let Err(e) = self.game.start_puzzle(definition) {
            warn!("[SESSION] Puzzle '{}' failed to load: {}", definition.id, e);
            self.reset();
            return Err(CoreError::Engine(e));
        }
        self.enter_preparation();
        Ok(())
    }

    /// Replay the current puzzle after a finished game
    pub fn restart(&mut self) -> CoreResult<bool> {
        match self.game.restart() {
            Ok(true) => {
                self.enter_preparation();
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(e) => {
                self.reset();
                Err(CoreError::Engine(e))
            }
        }
    }

    /// Back to the menu; every timer is cancelled
    pub fn reset(&mut self) {
        self.game.reset();
        self.cancel_timers();
        self.pauses = PauseCounter::default();
        info!("[SESSION] Reset to menu");
    }

    pub fn pause(&mut self) {
        self.pauses.set_user_paused(true);
        info!("[SESSION] Paused");
    }

    pub fn resume(&mut self) {
        self.pauses.set_user_paused(false);
        info!("[SESSION] Resumed");
    }

    /// End preparation early (or on countdown expiry)
    pub fn start_playing(&mut self) -> bool {
        if !self.game.start_playing() {
            return false;
        }
        self.countdown.stop();
        self.pauses.clear_drags();
        self.generation += 1;
        self.schedule_opponent();
        true
    }

    // ------------------------------------------------------------------
    // Preparation
    // ------------------------------------------------------------------

    pub fn place_piece(&mut self, piece_type: PieceType, cell: Cell) -> Result<PieceId, Rejection> {
        self.game.place_piece(piece_type, cell)
    }

    /// Open a drag; it holds a pause until committed or cancelled
    pub fn begin_drag(&mut self, source: DragSource) -> Result<DragId, Rejection> {
        let drag = self.game.begin_drag(source)?;
        self.pauses.acquire(drag);
        Ok(drag)
    }

    pub fn commit_drag(&mut self, drag: DragId, target: DropTarget) -> Result<DropResolution, Rejection> {
        self.pauses.release(drag);
        self.game.commit_drag(drag, target)
    }

    pub fn cancel_drag(&mut self, drag: DragId) -> bool {
        self.pauses.release(drag);
        self.game.cancel_drag(drag)
    }

    // ------------------------------------------------------------------
    // Play
    // ------------------------------------------------------------------

    /// Player move; opponent moves only arrive through [`Self::apply_suggestion`]
    pub fn move_piece(&mut self, from: Cell, to: Cell) -> Result<MoveRecord, Rejection> {
        if self.game.phase() == GamePhase::Playing && !self.game.is_player_turn() {
            debug!("[SESSION] Player move ignored while the opponent is to move");
            return Err(Rejection::NotYourTurn);
        }
        let record = self.game.move_piece(from, to)?;
        self.after_position_change();
        Ok(record)
    }

    /// Hand an advisor answer back for `request`
    pub fn apply_suggestion(
        &mut self,
        request: &SuggestionRequest,
        suggestion: Option<Move>,
    ) -> SuggestionOutcome {
        let current = self.game.phase() == GamePhase::Playing
            && request.generation == self.generation
            && request.notation == self.game.notation()
            && self.pending_request.as_ref() == Some(request);
        if !current {
            debug!(
                "[SESSION] Discarding stale suggestion (generation {} vs {})",
                request.generation, self.generation
            );
            return SuggestionOutcome::Stale;
        }
        self.pending_request = None;

        let outcome = match suggestion {
            Some(suggested) => match self.game.apply_suggestion(suggested) {
                Ok(record) => SuggestionOutcome::Applied(record),
                Err(rejection) => {
                    warn!("[SESSION] Advisor move {:?} rejected: {}", suggested, rejection);
                    self.game.pass_turn();
                    SuggestionOutcome::Rejected(rejection)
                }
            },
            None => {
                info!("[SESSION] Opponent has no move; passing");
                self.game.pass_turn();
                SuggestionOutcome::Passed
            }
        };
        self.after_position_change();
        outcome
    }

    // ------------------------------------------------------------------
    // Time
    // ------------------------------------------------------------------

    /// Account for `elapsed_millis` of wall time
    pub fn advance(&mut self, elapsed_millis: u64) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        match self.game.phase() {
            GamePhase::Preparation if !self.pauses.is_paused() => {
                let step = self.countdown.advance(elapsed_millis);
                if step.units_elapsed > 0 {
                    events.push(SessionEvent::CountdownTick {
                        remaining: self.countdown.remaining_units(),
                    });
                }
                if step.expired {
                    info!("[SESSION] Preparation time is up");
                    if self.start_playing() {
                        events.push(SessionEvent::PlayStarted);
                    }
                }
            }
            GamePhase::Playing => {
                if let Some(remaining) = self.opponent_delay {
                    let left = remaining.saturating_sub(elapsed_millis);
                    if left == 0 {
                        self.opponent_delay = None;
                        let request = SuggestionRequest {
                            generation: self.generation,
                            notation: self.game.notation().to_string(),
                        };
                        debug!("[SESSION] Requesting opponent move for '{}'", request.notation);
                        self.pending_request = Some(request.clone());
                        events.push(SessionEvent::SuggestionRequested(request));
                    } else {
                        self.opponent_delay = Some(left);
                    }
                }
            }
            _ => {}
        }
        events
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn enter_preparation(&mut self) {
        self.cancel_timers();
        self.pauses.clear_drags();
        self.countdown.start();
        info!(
            "[SESSION] Preparation started: {} units of {}ms",
            self.config.preparation_units, self.config.unit_millis
        );
    }

    fn after_position_change(&mut self) {
        self.generation += 1;
        self.pending_request = None;
        self.opponent_delay = None;
        if self.game.phase() == GamePhase::GameOver {
            info!("[SESSION] Game over: {:?}", self.game.outcome());
            return;
        }
        self.schedule_opponent();
    }

    fn schedule_opponent(&mut self) {
        if self.game.phase() == GamePhase::Playing && !self.game.is_player_turn() {
            debug!(
                "[SESSION] Opponent to move in {}ms",
                self.config.opponent_delay_millis
            );
            self.opponent_delay = Some(self.config.opponent_delay_millis);
        }
    }

    fn cancel_timers(&mut self) {
        self.countdown.stop();
        self.generation += 1;
        self.opponent_delay = None;
        self.pending_request = None;
    }
}
