//! Wall-clock abstractions used by the decision engines.

use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Thread-safe time source returning fractional seconds since the UNIX epoch.
///
/// A decision reads the clock exactly once and hands the reading to the
/// store's atomic program; the store's own clock is never consulted, so the
/// stored state stays internally consistent even when instances disagree on
/// the time.
pub trait Clock: Send + Sync {
    /// Current wall-clock time in seconds since the UNIX epoch.
    fn now(&self) -> f64;
}

/// System wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64()
    }
}

/// Manually advanced clock for tests and simulations.
///
/// Shared via `Arc`; `set` and `advance` take effect for every holder.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<f64>,
}

impl ManualClock {
    /// Create a clock frozen at `start` seconds since the epoch.
    pub fn new(start: f64) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move the clock to an absolute instant.
    pub fn set(&self, to: f64) {
        *self.now.lock().unwrap() = to;
    }

    /// Advance the clock by `by` seconds.
    pub fn advance(&self, by: f64) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        *self.now.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn system_clock_is_non_decreasing() {
        let clock = SystemClock;
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
        assert!(first > 0.0);
    }

    #[test]
    fn manual_clock_set_and_advance() {
        let clock = ManualClock::new(100.0);
        assert_eq!(clock.now(), 100.0);
        clock.advance(2.5);
        assert_eq!(clock.now(), 102.5);
        clock.set(50.0);
        assert_eq!(clock.now(), 50.0);
    }

    #[test]
    fn trait_object_usage() {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(7.0));
        assert_eq!(clock.now(), 7.0);
    }
}
