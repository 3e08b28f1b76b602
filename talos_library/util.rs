//! Small shared helpers

use std::time::Duration;

pub const FEET_TO_METRES: f64 = 0.3048;

/// Convert a wall-clock duration in seconds into scheduler ticks at the
/// given tick period, rounding to the nearest tick
pub fn ticks_from_seconds(seconds: f64, tick_period: Duration) -> u64 {
    (seconds / tick_period.as_secs_f64()).round() as u64
}

/// A timer that counts down from a specified start, in scheduler ticks
#[derive(Debug, Clone, Copy)]
pub struct CountdownTimer {
    duration_ticks: u64,
    started_at: Option<u64>,
}

impl CountdownTimer {
    /// Construct a timer that counts down `duration_ticks` once started
    pub fn new(duration_ticks: u64) -> Self {
        Self {
            duration_ticks,
            started_at: None,
        }
    }

    /// Start (or restart) the countdown from the given tick
    pub fn start(&mut self, tick: u64) {
        self.started_at = Some(tick);
    }

    /// Stop the countdown and clear its start point
    pub fn reset(&mut self) {
        self.started_at = None;
    }

    /// Whether the countdown is running
    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// The remaining ticks at the given tick; the full duration when not
    /// started, zero once elapsed
    pub fn remaining(&self, tick: u64) -> u64 {
        match self.started_at {
            Some(started) => self
                .duration_ticks
                .saturating_sub(tick.saturating_sub(started)),
            None => self.duration_ticks,
        }
    }
}
