//! Clock tied to the tokio timer.

use std::time::Duration;

use tokio::time::Instant;

use herald_core::{Clock, SystemClock};

/// Wall-clock epoch captured at construction, advanced by `tokio::time`.
///
/// Reading time through tokio keeps the reporter's notion of "now" in step
/// with the re-check timers, including when the runtime clock is paused in
/// tests.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    base_ms: u64,
    origin: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self::starting_at_ms(SystemClock.now_ms())
    }

    pub fn starting_at_ms(base_ms: u64) -> Self {
        Self {
            base_ms,
            origin: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now_ms(&self) -> u64 {
        self.base_ms + self.elapsed().as_millis() as u64
    }
}
