//! ## herald-core::reporter
//! **The single-banner state machine**
//!
//! ```text
//! NONE|DELAY|FAILURE --failure--> FAILURE
//! NONE|DELAY         --delay----> DELAY
//! FAILURE            --delay----> FAILURE   (ignored)
//! NONE|DELAY         --success--> NONE
//! FAILURE            --success--> FAILURE   (younger than the guard window, re-check later)
//! FAILURE            --success--> NONE      (otherwise)
//! ```
//!
//! The reporter never schedules anything itself. A deferred success comes back
//! as [`Transition::Deferred`] and the owning event loop is expected to call
//! [`StatusReporter::recheck`] once the delay has elapsed. The re-check reads the
//! state as it is at that moment, so an intervening failure restarts the guard.

use std::fmt;

use tracing::{debug, trace};

use crate::events::{StatusEvent, Transition};
use crate::status::{StatusKind, DEFAULT_CLASS_PREFIX};
use crate::surface::Surface;
use crate::time::{Clock, ReporterTiming};

/// Mutable reporter state. `displayed_at` and `element` are set exactly when
/// `kind` is visible.
#[derive(Debug)]
pub struct ReporterState<H> {
    pub kind: StatusKind,
    /// Epoch milliseconds at which `kind` was shown.
    pub displayed_at: Option<u64>,
    pub element: Option<H>,
}

impl<H> Default for ReporterState<H> {
    fn default() -> Self {
        Self {
            kind: StatusKind::None,
            displayed_at: None,
            element: None,
        }
    }
}

pub struct StatusReporter<S: Surface, C: Clock> {
    surface: S,
    clock: C,
    timing: ReporterTiming,
    class_prefix: String,
    state: ReporterState<S::Handle>,
}

impl<S: Surface, C: Clock> StatusReporter<S, C> {
    pub fn new(surface: S, clock: C) -> Self {
        Self {
            surface,
            clock,
            timing: ReporterTiming::default(),
            class_prefix: DEFAULT_CLASS_PREFIX.to_string(),
            state: ReporterState::default(),
        }
    }

    pub fn with_timing(mut self, timing: ReporterTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_class_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.class_prefix = prefix.into();
        self
    }

    pub fn kind(&self) -> StatusKind {
        self.state.kind
    }

    pub fn displayed_at(&self) -> Option<u64> {
        self.state.displayed_at
    }

    pub fn state(&self) -> &ReporterState<S::Handle> {
        &self.state
    }

    pub fn timing(&self) -> ReporterTiming {
        self.timing
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Shows a failure banner, replacing anything currently displayed.
    pub fn report_failure(&mut self, error: impl fmt::Display) -> Transition {
        self.show(StatusKind::Failure, &error.to_string())
    }

    /// Shows a delay banner unless a failure is visible.
    pub fn report_delay(&mut self, error: impl fmt::Display) -> Transition {
        if self.state.kind == StatusKind::Failure {
            trace!("delay notice suppressed by visible failure");
            return Transition::Suppressed;
        }
        self.show(StatusKind::Delay, &error.to_string())
    }

    /// Clears the banner, unless it is a failure younger than the guard window.
    pub fn report_success(&mut self) -> Transition {
        if self.failure_is_fresh() {
            debug!(
                retry_ms = self.timing.retry_delay.as_millis() as u64,
                "keeping recent failure visible"
            );
            return Transition::Deferred {
                after: self.timing.retry_delay,
            };
        }
        match self.clear() {
            StatusKind::None => Transition::Idle,
            previous => Transition::Cleared { previous },
        }
    }

    /// Re-evaluates a postponed success against the current state.
    pub fn recheck(&mut self) -> Transition {
        trace!(kind = %self.state.kind, "re-checking postponed success");
        self.report_success()
    }

    /// Dispatches one inbound event.
    pub fn apply(&mut self, event: StatusEvent) -> Transition {
        match event {
            StatusEvent::Failure(message) => self.report_failure(message),
            StatusEvent::Delay(message) => self.report_delay(message),
            StatusEvent::Success => self.report_success(),
            StatusEvent::Recheck => self.recheck(),
        }
    }

    fn failure_is_fresh(&self) -> bool {
        match (self.state.kind, self.state.displayed_at) {
            (StatusKind::Failure, Some(shown)) => {
                let age = self.clock.now_ms().saturating_sub(shown);
                u128::from(age) < self.timing.guard_window.as_millis()
            }
            _ => false,
        }
    }

    /// Removes the banner if any and resets the state. Returns the kind that
    /// was displayed.
    fn clear(&mut self) -> StatusKind {
        let previous = std::mem::take(&mut self.state.kind);
        self.state.displayed_at = None;
        if let Some(element) = self.state.element.take() {
            self.surface.remove(element);
            debug!(%previous, "banner cleared");
        }
        previous
    }

    fn show(&mut self, kind: StatusKind, message: &str) -> Transition {
        let replaced = self.clear();

        let now = self.clock.now_ms();
        let element = self.surface.create_element();
        self.surface
            .set_class(&element, &kind.class_name(&self.class_prefix));
        self.surface.set_text(&element, message);
        self.surface.append(&element);

        self.state = ReporterState {
            kind,
            displayed_at: Some(now),
            element: Some(element),
        };
        debug!(%kind, %replaced, text = message, "banner shown");
        Transition::Shown { kind, replaced }
    }
}

impl<S: Surface, C: Clock> fmt::Debug for StatusReporter<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusReporter")
            .field("kind", &self.state.kind)
            .field("displayed_at", &self.state.displayed_at)
            .field("timing", &self.timing)
            .field("class_prefix", &self.class_prefix)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{Banner, SharedSurface};
    use crate::time::VirtualClock;
    use proptest::prelude::*;
    use std::time::Duration;

    const START_MS: u64 = 1_700_000_000_000;

    fn reporter() -> (StatusReporter<SharedSurface, VirtualClock>, SharedSurface, VirtualClock) {
        let surface = SharedSurface::new();
        let clock = VirtualClock::starting_at_ms(START_MS);
        let reporter = StatusReporter::new(surface.clone(), clock.clone());
        (reporter, surface, clock)
    }

    fn banner(kind: StatusKind, text: &str) -> Option<Banner> {
        Some(Banner {
            class_name: kind.class_name(DEFAULT_CLASS_PREFIX),
            text: text.into(),
        })
    }

    #[test]
    fn failure_shows_banner() {
        let (mut reporter, surface, _) = reporter();
        let t = reporter.report_failure("net down");
        assert_eq!(
            t,
            Transition::Shown {
                kind: StatusKind::Failure,
                replaced: StatusKind::None
            }
        );
        assert_eq!(reporter.kind(), StatusKind::Failure);
        assert_eq!(reporter.displayed_at(), Some(START_MS));
        assert_eq!(surface.single_banner(), banner(StatusKind::Failure, "net down"));
    }

    #[test]
    fn delay_does_not_mask_failure() {
        let (mut reporter, surface, clock) = reporter();
        reporter.report_failure("net down");
        clock.advance_ms(1_000);

        assert_eq!(reporter.report_delay("slow"), Transition::Suppressed);
        assert_eq!(reporter.kind(), StatusKind::Failure);
        assert_eq!(reporter.displayed_at(), Some(START_MS));
        assert_eq!(surface.single_banner(), banner(StatusKind::Failure, "net down"));
        assert_eq!(surface.log().len(), 1);
    }

    #[test]
    fn fresh_failure_defers_success() {
        let (mut reporter, surface, _) = reporter();
        reporter.report_failure("net down");

        assert_eq!(
            reporter.report_success(),
            Transition::Deferred {
                after: Duration::from_secs(5)
            }
        );
        assert_eq!(surface.single_banner(), banner(StatusKind::Failure, "net down"));
    }

    #[test]
    fn recheck_chain_clears_once_failure_is_old_enough() {
        let (mut reporter, surface, clock) = reporter();
        reporter.report_failure("net down");
        assert!(reporter.report_success().retry_after().is_some());

        clock.advance_ms(5_000);
        assert!(reporter.recheck().retry_after().is_some());
        assert_eq!(reporter.kind(), StatusKind::Failure);

        clock.advance_ms(5_000);
        assert_eq!(
            reporter.recheck(),
            Transition::Cleared {
                previous: StatusKind::Failure
            }
        );
        assert_eq!(reporter.kind(), StatusKind::None);
        assert_eq!(reporter.displayed_at(), None);
        assert!(surface.attached().is_empty());
    }

    #[test]
    fn delay_clears_immediately() {
        let (mut reporter, surface, _) = reporter();
        reporter.report_delay("slow");
        assert_eq!(surface.single_banner(), banner(StatusKind::Delay, "slow"));

        assert_eq!(
            reporter.report_success(),
            Transition::Cleared {
                previous: StatusKind::Delay
            }
        );
        assert!(surface.attached().is_empty());
    }

    #[test]
    fn old_failure_clears_immediately() {
        let (mut reporter, surface, clock) = reporter();
        reporter.report_failure("net down");
        clock.advance_ms(11_000);

        assert_eq!(
            reporter.report_success(),
            Transition::Cleared {
                previous: StatusKind::Failure
            }
        );
        assert!(surface.attached().is_empty());
    }

    #[test]
    fn guard_boundary_is_exclusive() {
        let (mut reporter, _, clock) = reporter();
        reporter.report_failure("net down");
        clock.advance_ms(9_999);
        assert!(reporter.report_success().retry_after().is_some());
        clock.advance_ms(1);
        assert_eq!(
            reporter.report_success(),
            Transition::Cleared {
                previous: StatusKind::Failure
            }
        );
    }

    #[test]
    fn success_on_empty_surface_is_idle() {
        let (mut reporter, surface, _) = reporter();
        assert_eq!(reporter.report_success(), Transition::Idle);
        assert_eq!(reporter.recheck(), Transition::Idle);
        assert!(surface.log().is_empty());
    }

    #[test]
    fn recheck_sees_newer_failure() {
        let (mut reporter, surface, clock) = reporter();
        reporter.report_failure("net down");
        reporter.report_success();

        clock.advance_ms(4_000);
        reporter.report_failure("still down");

        // Original failure is 11s old, the newer one only 7s.
        clock.advance_ms(7_000);
        assert!(reporter.recheck().retry_after().is_some());
        assert_eq!(surface.single_banner(), banner(StatusKind::Failure, "still down"));

        clock.advance_ms(5_000);
        assert_eq!(
            reporter.recheck(),
            Transition::Cleared {
                previous: StatusKind::Failure
            }
        );
    }

    #[test]
    fn recheck_after_delay_replaced_failure_clears() {
        let (mut reporter, surface, clock) = reporter();
        reporter.report_delay("slow");
        reporter.report_failure("net down");
        reporter.report_success();
        clock.advance_ms(11_000);
        assert!(reporter.recheck().retry_after().is_none());
        assert!(surface.attached().is_empty());
    }

    #[test]
    fn new_kind_replaces_previous_banner() {
        let (mut reporter, surface, _) = reporter();
        reporter.report_delay("slow");
        let t = reporter.report_failure("net down");
        assert_eq!(
            t,
            Transition::Shown {
                kind: StatusKind::Failure,
                replaced: StatusKind::Delay
            }
        );
        assert_eq!(surface.attached_count(), 1);
        assert_eq!(
            surface.log().iter().map(|op| op.to_string()).collect::<Vec<_>>(),
            vec![
                "append #0 [status-report status-report-delay] slow",
                "remove #0",
                "append #1 [status-report status-report-failure] net down",
            ]
        );
    }

    #[test]
    fn custom_timing_and_prefix() {
        let (reporter, surface, clock) = reporter();
        let mut reporter = reporter
            .with_timing(ReporterTiming::from_millis(2_000, 500))
            .with_class_prefix("sync");
        reporter.report_failure("boom");
        assert_eq!(surface.single_banner().unwrap().class_name, "sync sync-failure");
        assert_eq!(
            reporter.report_success(),
            Transition::Deferred {
                after: Duration::from_millis(500)
            }
        );
        clock.advance_ms(2_000);
        assert!(reporter.recheck().retry_after().is_none());
    }

    #[test]
    fn apply_dispatches_events() {
        let (mut reporter, surface, _) = reporter();
        reporter.apply(StatusEvent::delay("slow"));
        assert_eq!(reporter.kind(), StatusKind::Delay);
        reporter.apply(StatusEvent::Success);
        assert!(surface.attached().is_empty());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Failure(u8),
        Delay(u8),
        Success,
        Recheck,
        Advance(u64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            any::<u8>().prop_map(Op::Failure),
            any::<u8>().prop_map(Op::Delay),
            Just(Op::Success),
            Just(Op::Recheck),
            (0u64..15_000).prop_map(Op::Advance),
        ]
    }

    proptest! {
        #[test]
        fn at_most_one_banner_matching_kind(ops in proptest::collection::vec(op(), 0..64)) {
            let (mut reporter, surface, clock) = reporter();
            for op in ops {
                match op {
                    Op::Failure(n) => { reporter.report_failure(format!("f{n}")); }
                    Op::Delay(n) => { reporter.report_delay(format!("d{n}")); }
                    Op::Success => { reporter.report_success(); }
                    Op::Recheck => { reporter.recheck(); }
                    Op::Advance(ms) => clock.advance_ms(ms),
                }
                let visible = reporter.kind().is_visible();
                prop_assert!(surface.attached_count() <= 1);
                prop_assert_eq!(surface.attached_count() == 1, visible);
                prop_assert_eq!(reporter.displayed_at().is_some(), visible);
                prop_assert_eq!(reporter.state().element.is_some(), visible);
            }
        }

        #[test]
        fn failure_always_wins(prefix in proptest::collection::vec(op(), 0..32), msg in "[a-z ]{1,16}") {
            let (mut reporter, surface, clock) = reporter();
            for op in prefix {
                match op {
                    Op::Failure(n) => { reporter.report_failure(n); }
                    Op::Delay(n) => { reporter.report_delay(n); }
                    Op::Success | Op::Recheck => { reporter.report_success(); }
                    Op::Advance(ms) => clock.advance_ms(ms),
                }
            }
            reporter.report_failure(&msg);
            prop_assert_eq!(reporter.kind(), StatusKind::Failure);
            prop_assert_eq!(reporter.displayed_at(), Some(clock.now_ms()));
            prop_assert_eq!(surface.single_banner().map(|b| b.text), Some(msg));
        }

        #[test]
        fn delay_under_failure_changes_nothing(age in 0u64..60_000, msg in "[a-z]{1,8}") {
            let (mut reporter, surface, clock) = reporter();
            reporter.report_failure("net down");
            clock.advance_ms(age);
            let log_before = surface.log();
            prop_assert_eq!(reporter.report_delay(msg), Transition::Suppressed);
            prop_assert_eq!(reporter.displayed_at(), Some(START_MS));
            prop_assert_eq!(surface.log(), log_before);
        }

        #[test]
        fn success_defers_only_inside_guard_window(age in 0u64..30_000) {
            let (mut reporter, _, clock) = reporter();
            reporter.report_failure("net down");
            clock.advance_ms(age);
            let deferred = reporter.report_success().retry_after().is_some();
            prop_assert_eq!(deferred, age < 10_000);
            prop_assert_eq!(reporter.kind().is_visible(), age < 10_000);
        }
    }
}
