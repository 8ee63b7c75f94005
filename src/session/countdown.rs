//! Preparation countdown
//!
//! Counts whole units down from the configured total. Time is fed in from the
//! outside ([`PreparationCountdown::advance`]) so the countdown itself never
//! reads a clock; the session actor passes real elapsed time, tests pass
//! whatever they like.

/// What one [`PreparationCountdown::advance`] call did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CountdownStep {
    /// Whole units that elapsed during this call
    pub units_elapsed: u32,
    /// The countdown reached zero during this call
    pub expired: bool,
}

/// Timer for the preparation phase
#[derive(Debug, Clone)]
pub struct PreparationCountdown {
    total_units: u32,
    unit_millis: u64,
    remaining_units: u32,
    carried_millis: u64,
    running: bool,
}

impl PreparationCountdown {
    pub fn new(total_units: u32, unit_millis: u64) -> Self {
        Self {
            total_units,
            unit_millis: unit_millis.max(1),
            remaining_units: total_units,
            carried_millis: 0,
            running: false,
        }
    }

    /// Rewind to the full length and start counting
    pub fn start(&mut self) {
        self.remaining_units = self.total_units;
        self.carried_millis = 0;
        self.running = true;
    }

    /// Stop counting; later `advance` calls do nothing
    pub fn stop(&mut self) {
        self.running = false;
        self.carried_millis = 0;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn remaining_units(&self) -> u32 {
        self.remaining_units
    }

    pub fn total_units(&self) -> u32 {
        self.total_units
    }

    /// Feed `elapsed_millis` of unpaused time
    ///
    /// Expiry is reported once: the countdown stops itself when it hits zero.
    pub fn advance(&mut self, elapsed_millis: u64) -> CountdownStep {
        if !self.running {
            return CountdownStep::default();
        }
        if self.remaining_units == 0 {
            self.running = false;
            return CountdownStep {
                units_elapsed: 0,
                expired: true,
            };
        }

        self.carried_millis += elapsed_millis;
        let whole = self.carried_millis / self.unit_millis;
        self.carried_millis %= self.unit_millis;

        let units_elapsed = u32::try_from(whole)
            .unwrap_or(u32::MAX)
            .min(self.remaining_units);
        self.remaining_units -= units_elapsed;

        let expired = self.remaining_units == 0;
        if expired {
            self.stop();
        }
        CountdownStep {
            units_elapsed,
            expired,
        }
    }
}
