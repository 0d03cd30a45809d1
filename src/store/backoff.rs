//! # Fibonacci Backoff
//!
//! Delay between conflicting commit attempts: min, min, 2·min, 3·min, 5·min …
//! capped at max.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    max: Duration,
    previous: Duration,
    current: Duration,
}

impl FibonacciBackoff {
    pub fn new(min: Duration, max: Duration) -> Self {
        let max = max.max(min);
        Self {
            max,
            previous: Duration::ZERO,
            current: min,
        }
    }

    /// Delay to wait before the next attempt
    pub fn next_backoff(&mut self) -> Duration {
        let delay = self.current.min(self.max);
        let next = self.previous.saturating_add(self.current).min(self.max);
        self.previous = self.current;
        self.current = next;
        delay
    }
}
