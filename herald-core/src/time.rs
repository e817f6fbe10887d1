//! ## herald-core::time
//! **Clocks and flicker-guard timings**
//!
//! The reporter only ever asks for "now" in milliseconds since the Unix epoch.
//! Production uses [`SystemClock`]; simulation and tests drive a
//! [`VirtualClock`] by hand so timing rules can be checked deterministically.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

const NANOS_PER_MILLI: u64 = 1_000_000;

/// Source of the current time for the reporter.
pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        Utc::now().timestamp_millis().max(0) as u64
    }
}

/// A deterministic clock that advances only when told to.
///
/// Clones share the same counter, so a simulator can keep one copy and hand
/// another to the reporter.
#[derive(Debug, Clone)]
pub struct VirtualClock {
    // Current simulation time in nanoseconds.
    offset: Arc<AtomicU64>,
}

impl VirtualClock {
    /// Creates a new virtual clock starting at `seed` nanoseconds.
    pub fn new(seed: u64) -> Self {
        Self {
            offset: Arc::new(AtomicU64::new(seed)),
        }
    }

    /// Creates a clock starting at the given epoch millisecond.
    pub fn starting_at_ms(ms: u64) -> Self {
        Self::new(ms.saturating_mul(NANOS_PER_MILLI))
    }

    #[inline]
    pub fn now_ns(&self) -> u64 {
        self.offset.load(Ordering::Acquire)
    }

    #[inline]
    pub fn advance(&self, ns: u64) {
        self.offset.fetch_add(ns, Ordering::Release);
    }

    #[inline]
    pub fn advance_ms(&self, ms: u64) {
        self.advance(ms.saturating_mul(NANOS_PER_MILLI));
    }

    /// Moves the clock forward to `ns`. Never moves it backwards.
    pub fn advance_to(&self, ns: u64) {
        self.offset.fetch_max(ns, Ordering::AcqRel);
    }
}

impl Clock for VirtualClock {
    fn now_ms(&self) -> u64 {
        self.now_ns() / NANOS_PER_MILLI
    }
}

/// Failure flicker-guard timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReporterTiming {
    /// A failure younger than this is not cleared by a success report.
    pub guard_window: Duration,
    /// How long to wait before re-checking a postponed success.
    pub retry_delay: Duration,
}

impl ReporterTiming {
    pub const DEFAULT_GUARD_WINDOW: Duration = Duration::from_secs(10);
    pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

    pub fn from_millis(guard_window_ms: u64, retry_delay_ms: u64) -> Self {
        Self {
            guard_window: Duration::from_millis(guard_window_ms),
            retry_delay: Duration::from_millis(retry_delay_ms),
        }
    }
}

impl Default for ReporterTiming {
    fn default() -> Self {
        Self {
            guard_window: Self::DEFAULT_GUARD_WINDOW,
            retry_delay: Self::DEFAULT_RETRY_DELAY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_initial_value() {
        let clock = VirtualClock::new(100);
        assert_eq!(clock.now_ns(), 100);
    }

    #[test]
    fn test_clock_advance() {
        let clock = VirtualClock::new(0);
        clock.advance(500);
        assert_eq!(clock.now_ns(), 500);
        clock.advance_ms(2);
        assert_eq!(clock.now_ns(), 2_000_500);
        assert_eq!(clock.now_ms(), 2);
    }

    #[test]
    fn clones_share_time() {
        let clock = VirtualClock::starting_at_ms(1_000);
        let view = clock.clone();
        clock.advance_ms(250);
        assert_eq!(view.now_ms(), 1_250);
    }

    #[test]
    fn advance_to_never_rewinds() {
        let clock = VirtualClock::new(1_000);
        clock.advance_to(500);
        assert_eq!(clock.now_ns(), 1_000);
        clock.advance_to(4_000);
        assert_eq!(clock.now_ns(), 4_000);
    }

    #[test]
    fn system_clock_is_past_2020() {
        assert!(SystemClock.now_ms() > 1_577_836_800_000);
    }
}
