//! Virtual clock for discrete-event simulation.
//!
//! The [`SimClock`] tracks simulation time independently of wall-clock time,
//! advancing only when request arrivals are processed. Runs are therefore
//! deterministic regardless of host machine speed.

use serde::{Deserialize, Serialize};

/// Virtual simulation clock, in the same time units as request timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimClock {
    start: f64,
    current: f64,
}

impl SimClock {
    /// Create a new clock starting at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock starting at `t`.
    pub fn starting_at(t: f64) -> Self {
        Self {
            start: t,
            current: t,
        }
    }

    pub fn now(&self) -> f64 {
        self.current
    }

    /// Advance the clock to `t`.
    ///
    /// # Panics
    ///
    /// Panics in debug mode if `t` is in the past.
    pub fn advance_to(&mut self, t: f64) {
        debug_assert!(
            t >= self.current,
            "Cannot move clock backwards: current={}, target={}",
            self.current,
            t,
        );
        self.current = t;
    }

    pub fn advance_by(&mut self, delta: f64) {
        self.current += delta;
    }

    /// Time elapsed since the clock's starting point.
    pub fn elapsed(&self) -> f64 {
        self.current - self.start
    }
}
