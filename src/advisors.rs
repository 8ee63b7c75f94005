//! Built-in move advisors
//!
//! - [`RandomAdvisor`] - baseline opponent: a random piece of the side to move
//!   goes to a random cell not held by its own side
//! - [`ScriptedAdvisor`] - replays a fixed list of answers; used by tests and
//!   demos where the opponent must be predictable

use battler_engine::{decode, AdvisorError, Cell, Move, MoveAdvisor, BOARD_SIZE};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// Opponent that picks uniformly among occupancy-valid moves
#[derive(Debug)]
pub struct RandomAdvisor {
    board_size: usize,
    rng: Mutex<StdRng>,
}

impl Default for RandomAdvisor {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomAdvisor {
    pub fn new() -> Self {
        Self {
            board_size: BOARD_SIZE,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Reproducible sequence of picks
    pub fn seeded(seed: u64) -> Self {
        Self {
            board_size: BOARD_SIZE,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn pick(&self, notation: &str) -> Result<Option<Move>, AdvisorError> {
        let position = decode(notation, self.board_size).map_err(|e| AdvisorError::Malformed {
            message: e.to_string(),
        })?;
        let side = position.active_color;

        let own: Vec<Cell> = position
            .pieces
            .iter()
            .filter(|piece| piece.color == side)
            .filter_map(|piece| piece.cell())
            .collect();
        let targets: Vec<Cell> = position
            .board
            .cells()
            .filter(|cell| !own.contains(cell))
            .collect();

        let mut rng = self.rng.lock().map_err(|_| AdvisorError::Unavailable {
            message: "random source poisoned".to_string(),
        })?;
        let chosen = match (own.choose(&mut *rng), targets.choose(&mut *rng)) {
            (Some(from), Some(to)) => Some(Move::new(*from, *to)),
            _ => None,
        };
        debug!("[ADVISOR] Random pick for {}: {:?}", side, chosen);
        Ok(chosen)
    }
}

#[async_trait]
impl MoveAdvisor for RandomAdvisor {
    async fn best_move(&self, notation: &str) -> Result<Option<Move>, AdvisorError> {
        self.pick(notation)
    }
}

/// Advisor that answers from a prepared script, then `Ok(None)` forever
#[derive(Debug, Default)]
pub struct ScriptedAdvisor {
    script: Mutex<VecDeque<Result<Option<Move>, AdvisorError>>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedAdvisor {
    /// Script of plain answers
    pub fn new(moves: impl IntoIterator<Item = Option<Move>>) -> Self {
        Self::from_answers(moves.into_iter().map(Ok))
    }

    /// Script that may include failures
    pub fn from_answers(
        answers: impl IntoIterator<Item = Result<Option<Move>, AdvisorError>>,
    ) -> Self {
        Self {
            script: Mutex::new(answers.into_iter().collect()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Sleep this long before every answer
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `best_move` calls started so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_answer(&self) -> Result<Option<Move>, AdvisorError> {
        let mut script = self.script.lock().map_err(|_| AdvisorError::Unavailable {
            message: "script poisoned".to_string(),
        })?;
        script.pop_front().unwrap_or(Ok(None))
    }
}

#[async_trait]
impl MoveAdvisor for ScriptedAdvisor {
    async fn best_move(&self, _notation: &str) -> Result<Option<Move>, AdvisorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.next_answer()
    }
}
