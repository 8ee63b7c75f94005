//! Pause bookkeeping
//!
//! Two independent sources can freeze the preparation countdown: every open
//! drag holds one pause (keyed by its [`DragId`], so releasing twice is
//! harmless), and the user can pause explicitly. The countdown runs only when
//! neither holds.

use battler_engine::DragId;
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct PauseCounter {
    drag_holds: HashSet<DragId>,
    user_paused: bool,
}

impl PauseCounter {
    /// Hold a pause for `drag`; `false` if it already held one
    pub fn acquire(&mut self, drag: DragId) -> bool {
        let added = self.drag_holds.insert(drag);
        if added {
            debug!("[SESSION] Pause acquired by drag {} ({} held)", drag.0, self.drag_holds.len());
        }
        added
    }

    /// Drop the pause held by `drag`; `false` if it held none
    pub fn release(&mut self, drag: DragId) -> bool {
        let removed = self.drag_holds.remove(&drag);
        if removed {
            debug!("[SESSION] Pause released by drag {} ({} held)", drag.0, self.drag_holds.len());
        }
        removed
    }

    /// Forget every drag hold; the user flag is kept
    pub fn clear_drags(&mut self) {
        self.drag_holds.clear();
    }

    pub fn set_user_paused(&mut self, paused: bool) {
        self.user_paused = paused;
    }

    pub fn user_paused(&self) -> bool {
        self.user_paused
    }

    pub fn drag_holds(&self) -> usize {
        self.drag_holds.len()
    }

    pub fn is_paused(&self) -> bool {
        self.user_paused || !self.drag_holds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_holds_are_counted_per_drag() {
        let mut pauses = PauseCounter::default();
        assert!(!pauses.is_paused());

        assert!(pauses.acquire(DragId(1)));
        assert!(pauses.acquire(DragId(2)));
        assert!(!pauses.acquire(DragId(1)), "same drag holds only once");
        assert_eq!(pauses.drag_holds(), 2);

        assert!(pauses.release(DragId(1)));
        assert!(!pauses.release(DragId(1)), "double release is a no-op");
        assert!(pauses.is_paused(), "drag 2 still holds");

        assert!(pauses.release(DragId(2)));
        assert!(!pauses.is_paused());
    }

    #[test]
    fn test_user_pause_is_independent_of_drags() {
        let mut pauses = PauseCounter::default();
        pauses.set_user_paused(true);
        pauses.acquire(DragId(7));
        pauses.release(DragId(7));
        assert!(pauses.is_paused(), "releasing a drag does not resume a user pause");

        pauses.acquire(DragId(8));
        pauses.set_user_paused(false);
        assert!(pauses.is_paused(), "resuming does not cancel a drag hold");

        pauses.clear_drags();
        assert!(!pauses.is_paused());
    }
}
