//! Move-suggestion seam
//!
//! The engine never searches for moves. An external advisor (a UCI engine, a
//! remote service, a scripted test double) receives the current notation string
//! and may answer with a `(from, to)` pair. Whatever it answers is treated as a
//! hint: [`crate::GameSession::apply_suggestion`] revalidates it against the
//! board as it is *when the answer arrives*.

use crate::types::Move;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

/// Failures reported by an advisor
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdvisorError {
    /// The service could not be reached or gave up
    #[error("Advisor unavailable: {message}")]
    Unavailable { message: String },

    /// The service answered with something that is not a move
    #[error("Advisor returned an unusable answer: {message}")]
    Malformed { message: String },
}

/// External move-suggestion service
///
/// `Ok(None)` means "no move available". Implementations must be shareable
/// across tasks because the session actor calls them from spawned tasks.
#[async_trait]
pub trait MoveAdvisor: Send + Sync {
    async fn best_move(&self, notation: &str) -> Result<Option<Move>, AdvisorError>;
}

/// Ask `advisor` for a move, folding every failure into "no suggestion"
pub async fn suggest(advisor: &dyn MoveAdvisor, notation: &str) -> Option<Move> {
    match advisor.best_move(notation).await {
        Ok(Some(suggestion)) => {
            debug!("[ADVISOR] Suggested {:?} for '{}'", suggestion, notation);
            Some(suggestion)
        }
        Ok(None) => {
            debug!("[ADVISOR] No move available for '{}'", notation);
            None
        }
        Err(e) => {
            warn!("[ADVISOR] Suggestion failed for '{}': {}", notation, e);
            None
        }
    }
}
