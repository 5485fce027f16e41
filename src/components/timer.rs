//! Countdown timer used as a gate by sensors.
//!
//! A [`Timer`] is not a component on its own; it is embedded in sensors
//! (warm-up delays, timed detectors). Consumers treat "not yet expired" as
//! "keep waiting".

/// Counts up to a fixed duration while running.
///
/// `elapsed` only advances while `running` is true, and `running` flips to
/// false as soon as `elapsed >= duration`.
#[derive(Debug, Clone, PartialEq)]
pub struct Timer {
    duration: f32,
    elapsed: f32,
    running: bool,
}

impl Timer {
    /// Create a stopped timer. Negative durations are clamped to zero.
    pub fn new(duration: f32) -> Self {
        Timer {
            duration: duration.max(0.0),
            elapsed: 0.0,
            running: false,
        }
    }

    /// Restart from zero and begin counting.
    pub fn start(&mut self) {
        self.elapsed = 0.0;
        self.running = true;
    }

    /// Clear elapsed time and stop counting.
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.running = false;
    }

    /// Advance by `dt` seconds. Does nothing when stopped or expired.
    pub fn tick(&mut self, dt: f32) {
        if !self.running {
            return;
        }
        self.elapsed += dt;
        if self.elapsed >= self.duration {
            self.running = false;
        }
    }

    /// Seconds left before expiry, never negative.
    pub fn remaining(&self) -> f32 {
        (self.duration - self.elapsed).max(0.0)
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// True once `elapsed >= duration`.
    pub fn is_expired(&self) -> bool {
        self.elapsed >= self.duration
    }
}
