//! Fixed-window throughput accounting.

use std::time::{Duration, Instant};

/// Attempts per second over a fixed window.
///
/// The pool feeds it the running attempt total; once a full window has
/// elapsed `tick` returns the rate for that window and starts a new one.
#[derive(Debug, Clone)]
pub struct Throughput {
    window: Duration,
    window_start: Instant,
    attempts_at_start: u64,
}

impl Throughput {
    pub const DEFAULT_WINDOW: Duration = Duration::from_secs(30);

    pub fn new(window: Duration) -> Self {
        Self::starting_at(window, Instant::now())
    }

    pub fn starting_at(window: Duration, now: Instant) -> Self {
        Self {
            window,
            window_start: now,
            attempts_at_start: 0,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Time left in the current window, saturating at zero.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.window
            .saturating_sub(now.saturating_duration_since(self.window_start))
    }

    /// Returns the rate of the finished window, or `None` while it is open.
    pub fn tick(&mut self, total_attempts: u64, now: Instant) -> Option<f64> {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.window {
            return None;
        }

        let attempts = total_attempts.saturating_sub(self.attempts_at_start);
        self.window_start = now;
        self.attempts_at_start = total_attempts;
        Some(rate(attempts, elapsed))
    }
}

/// Attempts per second, zero for an empty interval.
pub fn rate(attempts: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        attempts as f64 / secs
    } else {
        0.0
    }
}
