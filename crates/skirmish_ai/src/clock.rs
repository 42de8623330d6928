//! Decision cadence countdown.

use serde::{Deserialize, Serialize};

/// Simulation ticks per second of game time.
pub const TICK_RATE: u32 = 20;

/// Countdown that fires once every fixed number of ticks.
///
/// A clock built from a difficulty delay of `d` seconds fires for the
/// first time `round(d * TICK_RATE)` ticks after construction and every
/// `round(d * TICK_RATE)` ticks thereafter. A delay that rounds to zero
/// or less yields no clock at all; the caller treats that as "controller
/// disabled", not as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionClock {
    interval: u32,
    countdown: u32,
}

impl DecisionClock {
    /// Clock firing every `interval` ticks. `None` when the interval is
    /// zero.
    #[must_use]
    pub fn from_interval(interval: u32) -> Option<Self> {
        if interval == 0 {
            return None;
        }
        Some(Self {
            interval,
            countdown: interval,
        })
    }

    /// Clock for a delay in seconds, scaled by [`TICK_RATE`]. `None` when
    /// the delay rounds to a non-positive tick count.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_delay(delay_seconds: f32) -> Option<Self> {
        let ticks = (delay_seconds * TICK_RATE as f32).round();
        if ticks <= 0.0 {
            return None;
        }
        Self::from_interval(ticks as u32)
    }

    /// Interval between firings, in ticks.
    #[must_use]
    pub const fn interval(&self) -> u32 {
        self.interval
    }

    /// Advance by one tick. Returns true on the ticks the clock fires.
    pub fn tick(&mut self) -> bool {
        self.countdown -= 1;
        if self.countdown == 0 {
            self.countdown = self.interval;
            true
        } else {
            false
        }
    }
}
