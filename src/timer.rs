//! Timing capability used by the tracking client
//!
//! A [`Timer`] hands out opaque [`TimerHandle`]s on `start` and measures the
//! time since a handle was issued on `elapsed`. [`SystemTimer`] reads the
//! monotonic clock; [`ManualTimer`] only moves when told to, which keeps
//! recorded durations deterministic in tests.

use parking_lot::Mutex;
use std::fmt::Debug;
use std::time::{Duration, Instant};

/// Opaque start mark issued by a [`Timer`].
///
/// Holds the offset from the issuing timer's origin, so a handle is only
/// meaningful to the timer that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimerHandle(Duration);

/// Start/elapsed capability.
pub trait Timer: Send + Sync + Debug {
    /// Begin timing.
    fn start(&self) -> TimerHandle;

    /// Time passed since `handle` was issued.
    fn elapsed(&self, handle: &TimerHandle) -> Duration;
}

/// Monotonic wall-clock timer.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimer {
    origin: Instant,
}

impl SystemTimer {
    /// Create a timer whose handles are measured from now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer for SystemTimer {
    fn start(&self) -> TimerHandle {
        TimerHandle(self.origin.elapsed())
    }

    fn elapsed(&self, handle: &TimerHandle) -> Duration {
        self.origin.elapsed().saturating_sub(handle.0)
    }
}

/// Timer that only advances through [`ManualTimer::advance`].
#[derive(Debug, Default)]
pub struct ManualTimer {
    now: Mutex<Duration>,
}

impl ManualTimer {
    /// Create a timer stopped at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Timer for ManualTimer {
    fn start(&self) -> TimerHandle {
        TimerHandle(*self.now.lock())
    }

    fn elapsed(&self, handle: &TimerHandle) -> Duration {
        self.now.lock().saturating_sub(handle.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_timer() {
        let timer = ManualTimer::new();
        let first = timer.start();
        timer.advance(Duration::from_millis(150));
        let second = timer.start();
        timer.advance(Duration::from_millis(50));

        assert_eq!(timer.elapsed(&first), Duration::from_millis(200));
        assert_eq!(timer.elapsed(&second), Duration::from_millis(50));
    }

    #[test]
    fn test_system_timer_monotonic() {
        let timer = SystemTimer::new();
        let handle = timer.start();
        let a = timer.elapsed(&handle);
        let b = timer.elapsed(&handle);
        assert!(b >= a);
    }

    #[test]
    fn test_foreign_handle_saturates() {
        let late = ManualTimer::new();
        late.advance(Duration::from_secs(10));
        let handle = late.start();

        let early = ManualTimer::new();
        assert_eq!(early.elapsed(&handle), Duration::ZERO);
    }
}
