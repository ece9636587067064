//! Time Sources and the Match Clock
//!
//! Power-up timers read an injected monotonic `TimeSource`; the match clock
//! counts whole ticks so it runs out after exactly `duration * tick_rate`
//! steps.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

/// Monotonic time since some fixed origin.
pub trait TimeSource: Send + Sync {
    /// Time elapsed since the origin.
    fn now(&self) -> Duration;
}

/// Time source backed by the tokio clock.
///
/// Follows `tokio::time::pause()` and `advance()` in tests.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Start counting from now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven time source for tests and replays.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
}

impl ManualClock {
    /// Clock starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }

    /// Jump to an absolute time.
    pub fn set(&self, to: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now = to;
        }
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Duration {
        self.now.lock().map(|now| *now).unwrap_or_default()
    }
}

// =============================================================================
// MATCH CLOCK
// =============================================================================

/// Remaining match time, counted in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchClock {
    remaining_ticks: u64,
    tick_rate: u32,
}

impl MatchClock {
    /// Clock for a match of `duration` at `tick_rate` Hz.
    pub fn new(duration: Duration, tick_rate: u32) -> Self {
        let tick_rate = tick_rate.max(1);
        let remaining_ticks = (duration.as_secs_f64() * f64::from(tick_rate)).round() as u64;
        Self {
            remaining_ticks,
            tick_rate,
        }
    }

    /// Count down one tick.
    pub fn advance(&mut self) {
        self.remaining_ticks = self.remaining_ticks.saturating_sub(1);
    }

    /// True once no time is left.
    pub fn is_expired(&self) -> bool {
        self.remaining_ticks == 0
    }

    /// Ticks left.
    pub fn remaining_ticks(&self) -> u64 {
        self.remaining_ticks
    }

    /// Seconds left.
    pub fn remaining_secs(&self) -> f64 {
        self.remaining_ticks as f64 / f64::from(self.tick_rate)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), Duration::ZERO);

        clock.advance(Duration::from_secs(3));
        let shared = clock.clone();
        shared.advance(Duration::from_millis(500));
        assert_eq!(clock.now(), Duration::from_millis(3500));

        clock.set(Duration::from_secs(1));
        assert_eq!(shared.now(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_monotonic_clock_follows_paused_time() {
        tokio::time::pause();
        let clock = MonotonicClock::new();

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(clock.now() >= Duration::from_secs(2));
    }

    #[test]
    fn test_match_clock_counts_whole_ticks() {
        let mut clock = MatchClock::new(Duration::from_secs(600), 60);
        assert_eq!(clock.remaining_ticks(), 36_000);
        assert_eq!(clock.remaining_secs(), 600.0);

        for _ in 0..35_999 {
            clock.advance();
        }
        assert!(!clock.is_expired());

        clock.advance();
        assert!(clock.is_expired());

        // Never underflows
        clock.advance();
        assert_eq!(clock.remaining_ticks(), 0);
    }
}
