// herald-simulator/src/lib.rs

/*!
# Herald Simulator

Deterministic replay of status-reporter sessions.

A [`Simulator`] drives a [`StatusReporter`] over an in-memory surface and a
virtual clock. Postponed success checks go into a timer queue ordered by
deadline; advancing the clock fires them in order, each one at its exact
deadline. Every call and re-check is written to a transcript whose BLAKE3 hash
identifies the run, so a recorded scenario can be replayed and compared.

## Key Components:
- **Scenario:** YAML list of calls, clock advances and expectations.
- **Replay:** Loads a scenario, runs it and validates its state hash.
- **Randomized driver:** Seeded random sessions checked against the
  single-banner and failure-precedence invariants after every step.
*/

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use blake3::Hasher;
use tracing::{debug, trace};
use validator::Validate;

use herald_config::{ConfigError, ReporterConfig};
use herald_core::surface::{Banner, MemorySurface};
use herald_core::{StatusEvent, StatusKind, StatusReporter, Transition, VirtualClock};

mod error;
pub mod randomized_event_driver;
pub mod replay;
pub mod scenario;

pub use error::SimulationError;
pub use randomized_event_driver::RandomizedEventDriver;
pub use replay::replay_scenario;
pub use scenario::{Expectation, Scenario, ScenarioStep};

const NANOS_PER_MILLI: u64 = 1_000_000;

/// Latest virtual instant (ns) a run may reach. Leaves headroom above it so a
/// re-check deadline never overflows.
pub const MAX_VIRTUAL_NS: u64 = u64::MAX / 2;

/// Outcome of a finished run.
#[derive(Debug, Clone)]
pub struct SimulationReport {
    /// Hex BLAKE3 hash of the transcript.
    pub state_hash: String,
    pub transcript: Vec<String>,
    pub final_kind: StatusKind,
    /// Re-checks that fired during the run.
    pub rechecks: usize,
}

pub struct Simulator {
    clock: VirtualClock,
    start_ns: u64,
    reporter: StatusReporter<MemorySurface, VirtualClock>,
    // Re-check deadlines (ns) with an insertion counter to keep equal
    // deadlines in scheduling order.
    timers: BinaryHeap<Reverse<(u64, u64)>>,
    next_timer: u64,
    rechecks: usize,
    transcript: Vec<String>,
    state_hasher: Hasher,
}

impl Simulator {
    /// Creates a simulator whose virtual clock starts at `start_ms`, clamped to
    /// [`MAX_VIRTUAL_NS`].
    pub fn new(config: &ReporterConfig, start_ms: u64) -> Self {
        let clock = VirtualClock::starting_at_ms(start_ms.min(MAX_VIRTUAL_NS / NANOS_PER_MILLI));
        let reporter = StatusReporter::new(MemorySurface::new(), clock.clone())
            .with_timing(config.timing())
            .with_class_prefix(config.class_prefix.clone());
        Self {
            start_ns: clock.now_ns(),
            clock,
            reporter,
            timers: BinaryHeap::new(),
            next_timer: 0,
            rechecks: 0,
            transcript: Vec::new(),
            state_hasher: Hasher::new(),
        }
    }

    /// Milliseconds of virtual time since the run started.
    pub fn elapsed_ms(&self) -> u64 {
        (self.clock.now_ns() - self.start_ns) / NANOS_PER_MILLI
    }

    pub fn kind(&self) -> StatusKind {
        self.reporter.kind()
    }

    pub fn banner(&self) -> Option<Banner> {
        self.reporter.surface().single_banner()
    }

    pub fn surface(&self) -> &MemorySurface {
        self.reporter.surface()
    }

    pub fn reporter(&self) -> &StatusReporter<MemorySurface, VirtualClock> {
        &self.reporter
    }

    pub fn pending_rechecks(&self) -> usize {
        self.timers.len()
    }

    /// Delivers one event at the current virtual time.
    pub fn apply(&mut self, event: StatusEvent) -> Transition {
        if event == StatusEvent::Recheck {
            self.rechecks += 1;
        }
        let line_event = format!("{event:?}");
        let transition = self.reporter.apply(event);
        self.record(format!(
            "t={} {line_event} -> {transition}",
            self.elapsed_ms()
        ));

        if let Some(after) = transition.retry_after() {
            let after_ns = u64::try_from(after.as_nanos()).unwrap_or(u64::MAX);
            let due = self.clock.now_ns().saturating_add(after_ns);
            self.timers.push(Reverse((due, self.next_timer)));
            self.next_timer += 1;
            trace!(due_ns = due, "Re-check scheduled");
        }
        transition
    }

    /// Moves the clock forward by `ms`, firing every re-check that falls due.
    ///
    /// Fails without touching the clock if the target lies past
    /// [`MAX_VIRTUAL_NS`].
    pub fn advance(&mut self, ms: u64) -> Result<(), SimulationError> {
        let target = ms
            .checked_mul(NANOS_PER_MILLI)
            .and_then(|ns| self.clock.now_ns().checked_add(ns))
            .filter(|ns| *ns <= MAX_VIRTUAL_NS)
            .ok_or(SimulationError::ClockOverflow { advance_ms: ms })?;
        while let Some(Reverse((due, _))) = self.timers.peek().copied() {
            if due > target {
                break;
            }
            self.timers.pop();
            self.clock.advance_to(due);
            self.apply(StatusEvent::Recheck);
        }
        self.clock.advance_to(target);
        Ok(())
    }

    /// Fires pending re-checks until none remain.
    ///
    /// Each re-check either clears the failure or defers again with the clock
    /// further ahead, so this always terminates.
    pub fn settle(&mut self) {
        while let Some(Reverse((due, _))) = self.timers.pop() {
            self.clock.advance_to(due);
            self.apply(StatusEvent::Recheck);
        }
    }

    /// Checks that the surface agrees with the reporter state.
    pub fn check_invariants(&self, step: usize) -> Result<(), SimulationError> {
        let attached = self.surface().attached_count();
        let kind = self.kind();
        if attached > 1 {
            return Err(SimulationError::Invariant {
                step,
                reason: format!("{attached} banners attached"),
            });
        }
        if (attached == 1) != kind.is_visible() {
            return Err(SimulationError::Invariant {
                step,
                reason: format!("kind {kind} with {attached} banner(s) attached"),
            });
        }
        if self.reporter.displayed_at().is_some() != kind.is_visible() {
            return Err(SimulationError::Invariant {
                step,
                reason: format!("kind {kind} with displayed_at {:?}", self.reporter.displayed_at()),
            });
        }
        Ok(())
    }

    /// Executes one scenario step.
    pub fn step(&mut self, index: usize, step: &ScenarioStep) -> Result<(), SimulationError> {
        match step {
            ScenarioStep::AdvanceMs(ms) => self.advance(*ms)?,
            ScenarioStep::Settle => self.settle(),
            ScenarioStep::Expect(expectation) => self.expect(index, expectation)?,
            call => {
                if let Some(event) = call.as_event() {
                    self.apply(event);
                }
            }
        }
        self.check_invariants(index)
    }

    fn expect(&self, index: usize, expectation: &Expectation) -> Result<(), SimulationError> {
        let kind = self.kind();
        if kind != expectation.kind {
            return Err(SimulationError::unexpected_kind(index, expectation.kind, kind));
        }
        if let Some(text) = &expectation.text {
            let found = self.banner().map(|b| b.text).unwrap_or_default();
            if &found != text {
                return Err(SimulationError::Expectation {
                    step: index,
                    expected: format!("{text:?}"),
                    found: format!("{found:?}"),
                });
            }
        }
        Ok(())
    }

    /// Runs every step of `scenario` on a fresh simulator.
    pub fn run_scenario(scenario: &Scenario) -> Result<SimulationReport, SimulationError> {
        let config = scenario.reporter.clone().unwrap_or_default();
        // A zero retry delay would make `settle` spin forever.
        config.validate().map_err(ConfigError::from)?;
        if scenario.start_ms > MAX_VIRTUAL_NS / NANOS_PER_MILLI {
            return Err(SimulationError::StartOutOfRange(scenario.start_ms));
        }
        let mut simulator = Simulator::new(&config, scenario.start_ms);
        debug!(
            name = scenario.name.as_deref().unwrap_or("<unnamed>"),
            steps = scenario.steps.len(),
            "Running scenario"
        );
        for (index, step) in scenario.steps.iter().enumerate() {
            simulator.step(index, step)?;
        }
        Ok(simulator.finish())
    }

    fn record(&mut self, line: String) {
        self.state_hasher.update(line.as_bytes());
        self.state_hasher.update(b"\n");
        self.transcript.push(line);
    }

    pub fn finish(self) -> SimulationReport {
        SimulationReport {
            state_hash: hex::encode(self.state_hasher.finalize().as_bytes()),
            final_kind: self.reporter.kind(),
            rechecks: self.rechecks,
            transcript: self.transcript,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simulator() -> Simulator {
        Simulator::new(&ReporterConfig::default(), 1_700_000_000_000)
    }

    #[test]
    fn failure_then_delay_keeps_failure() {
        let mut sim = simulator();
        sim.apply(StatusEvent::failure("net down"));
        assert_eq!(sim.apply(StatusEvent::delay("slow")), Transition::Suppressed);
        assert_eq!(sim.banner().unwrap().text, "net down");
        assert_eq!(sim.banner().unwrap().class_name, "status-report status-report-failure");
    }

    #[test]
    fn quick_success_clears_through_recheck_chain() {
        let mut sim = simulator();
        sim.apply(StatusEvent::failure("net down"));
        sim.apply(StatusEvent::Success);
        assert_eq!(sim.pending_rechecks(), 1);

        sim.advance(5_000).unwrap();
        assert_eq!(sim.kind(), StatusKind::Failure);
        assert_eq!(sim.pending_rechecks(), 1);

        sim.advance(5_000).unwrap();
        assert_eq!(sim.kind(), StatusKind::None);
        assert_eq!(sim.pending_rechecks(), 0);

        let report = sim.finish();
        assert_eq!(report.rechecks, 2);
        assert_eq!(
            report.transcript,
            vec![
                "t=0 Failure(\"net down\") -> shown failure (replaced none)",
                "t=0 Success -> deferred 5000ms",
                "t=5000 Recheck -> deferred 5000ms",
                "t=10000 Recheck -> cleared failure",
            ]
        );
    }

    #[test]
    fn advance_fires_rechecks_at_their_deadline() {
        let mut sim = simulator();
        sim.apply(StatusEvent::failure("net down"));
        sim.apply(StatusEvent::Success);
        sim.advance(4_000).unwrap();
        sim.apply(StatusEvent::failure("still down"));
        // Re-checks at 5s (1s old) and 10s (6s old) defer, 15s clears.
        sim.advance(12_000).unwrap();
        assert_eq!(sim.kind(), StatusKind::None);
        assert_eq!(sim.elapsed_ms(), 16_000);
        assert_eq!(sim.finish().rechecks, 3);
    }

    #[test]
    fn settle_drains_timers() {
        let mut sim = simulator();
        sim.apply(StatusEvent::failure("net down"));
        sim.apply(StatusEvent::Success);
        sim.apply(StatusEvent::Success);
        sim.settle();
        assert_eq!(sim.kind(), StatusKind::None);
        assert_eq!(sim.pending_rechecks(), 0);
        assert_eq!(sim.elapsed_ms(), 10_000);
    }

    #[test]
    fn identical_runs_hash_identically() {
        let run = || {
            let mut sim = simulator();
            sim.apply(StatusEvent::delay("slow"));
            sim.advance(1_000).unwrap();
            sim.apply(StatusEvent::failure("net down"));
            sim.apply(StatusEvent::Success);
            sim.settle();
            sim.finish().state_hash
        };
        let first = run();
        assert_eq!(first.len(), 64);
        assert_eq!(first, run());
    }

    #[test]
    fn scenario_expectation_failure_is_reported() {
        let scenario =
            Scenario::from_yaml("steps:\n  - delay: slow\n  - expect: { kind: failure }\n").unwrap();
        match Simulator::run_scenario(&scenario) {
            Err(SimulationError::Expectation {
                step,
                expected,
                found,
            }) => {
                assert_eq!(step, 1);
                assert_eq!(expected, "failure");
                assert_eq!(found, "delay");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn invalid_reporter_override_is_rejected() {
        let scenario =
            Scenario::from_yaml("reporter:\n  retry_delay_ms: 0\nsteps:\n  - success\n").unwrap();
        assert!(matches!(
            Simulator::run_scenario(&scenario),
            Err(SimulationError::Config(ConfigError::Validation(_)))
        ));
    }

    #[test]
    fn huge_advance_is_rejected() {
        let mut sim = simulator();
        sim.apply(StatusEvent::failure("net down"));
        sim.apply(StatusEvent::Success);
        assert!(matches!(
            sim.advance(18_446_744_073_710),
            Err(SimulationError::ClockOverflow { .. })
        ));
        assert_eq!(sim.elapsed_ms(), 0);
        assert_eq!(sim.pending_rechecks(), 1);
    }

    #[test]
    fn start_time_past_range_is_rejected() {
        let scenario =
            Scenario::from_yaml("start_ms: 18446744073709\nsteps:\n  - failure: x\n  - success\n")
                .unwrap();
        assert!(matches!(
            Simulator::run_scenario(&scenario),
            Err(SimulationError::StartOutOfRange(18_446_744_073_709))
        ));
    }

    #[test]
    fn documented_scenarios_pass() {
        let scenario = Scenario::from_yaml(
            r#"
name: reference scenarios
steps:
  - failure: net down
  - expect: { kind: failure, text: net down }
  - delay: slow
  - expect: { kind: failure, text: net down }
  - success
  - expect: { kind: failure, text: net down }
  - advance_ms: 10000
  - expect: { kind: none }
  - delay: slow
  - expect: { kind: delay, text: slow }
  - success
  - expect: { kind: none }
  - failure: net down
  - advance_ms: 11000
  - success
  - expect: { kind: none }
"#,
        )
        .unwrap();
        let report = Simulator::run_scenario(&scenario).unwrap();
        assert_eq!(report.final_kind, StatusKind::None);
        assert_eq!(report.rechecks, 2);
    }
}
