//! Piece budget manager
//!
//! Tracks how many points the player has spent on tray pieces during
//! preparation. The budget never touches the board; the placement resolver pairs
//! a [`PieceBudget::reserve`] with the matching board write so the two can't
//! drift apart.
//!
//! # Invariant
//!
//! `used <= max` at all times. [`PieceBudget::reserve`] refuses instead of going
//! over, and [`PieceBudget::release`] floors at zero.

use crate::error::Rejection;
use crate::types::PieceType;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Point allowance for one puzzle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceBudget {
    max_value: u32,
    used_value: u32,
}

impl PieceBudget {
    pub fn new(max_value: u32) -> Self {
        Self {
            max_value,
            used_value: 0,
        }
    }

    pub fn max_value(&self) -> u32 {
        self.max_value
    }

    pub fn used_value(&self) -> u32 {
        self.used_value
    }

    /// Points still available
    pub fn remaining(&self) -> u32 {
        self.max_value.saturating_sub(self.used_value)
    }

    pub fn can_afford(&self, piece_type: PieceType) -> bool {
        self.used_value + piece_type.value() <= self.max_value
    }

    /// Spend the value of `piece_type`, or refuse without changing anything
    pub fn reserve(&mut self, piece_type: PieceType) -> Result<(), Rejection> {
        if !self.can_afford(piece_type) {
            debug!(
                "[BUDGET] Cannot afford {} ({} points, {} remaining)",
                piece_type,
                piece_type.value(),
                self.remaining()
            );
            return Err(Rejection::Unaffordable);
        }
        self.used_value += piece_type.value();
        debug!(
            "[BUDGET] Reserved {} -> used {}/{}",
            piece_type, self.used_value, self.max_value
        );
        Ok(())
    }

    /// Give back the value of `piece_type`
    ///
    /// Releasing more than was reserved is a caller bug. It is absorbed (the
    /// counter floors at zero) so the session stays usable, and logged.
    pub fn release(&mut self, piece_type: PieceType) {
        let value = piece_type.value();
        if value > self.used_value {
            warn!(
                "[BUDGET] Release of {} ({} points) exceeds used value {}; flooring at zero",
                piece_type, value, self.used_value
            );
        }
        self.used_value = self.used_value.saturating_sub(value);
        debug!(
            "[BUDGET] Released {} -> used {}/{}",
            piece_type, self.used_value, self.max_value
        );
    }

    /// Start over with a new allowance
    pub fn reset(&mut self, max_value: u32) {
        *self = Self::new(max_value);
    }
}
