//! Seeded random sessions.
//!
//! Generates a stream of calls and clock advances and runs it through a
//! [`Simulator`], checking after every step that at most one banner is
//! attached and that a delay never replaces a visible failure.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use herald_config::{ReporterConfig, SimulatorConfig};
use herald_core::{StatusEvent, StatusKind, Transition};

use crate::{ScenarioStep, SimulationError, SimulationReport, Simulator};

pub struct RandomizedEventDriver {
    rng: StdRng,
    max_advance_ms: u64,
}

impl RandomizedEventDriver {
    pub fn new(seed: u64, max_advance_ms: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            max_advance_ms: max_advance_ms.max(1),
        }
    }

    pub fn from_config(config: &SimulatorConfig) -> Self {
        Self::new(config.seed, config.max_advance_ms)
    }

    /// Picks the next step. Advances are as likely as calls, so guard windows
    /// are regularly both hit and missed.
    pub fn next_step(&mut self) -> ScenarioStep {
        match self.rng.random_range(0..8) {
            0 | 1 => ScenarioStep::Failure(format!("failure #{}", self.rng.random::<u16>())),
            2 | 3 => ScenarioStep::Delay(format!("delay #{}", self.rng.random::<u16>())),
            4 | 5 => ScenarioStep::Success,
            _ => ScenarioStep::AdvanceMs(self.rng.random_range(0..=self.max_advance_ms)),
        }
    }

    /// Generates `steps` steps without running them.
    pub fn generate(&mut self, steps: usize) -> Vec<ScenarioStep> {
        (0..steps).map(|_| self.next_step()).collect()
    }

    /// Runs `steps` random steps, then settles pending re-checks.
    pub fn run(
        &mut self,
        reporter: &ReporterConfig,
        steps: usize,
    ) -> Result<SimulationReport, SimulationError> {
        let mut simulator = Simulator::new(reporter, 0);

        for index in 0..steps {
            let step = self.next_step();
            let before = (
                simulator.kind(),
                simulator.reporter().displayed_at(),
                simulator.banner(),
            );

            match &step {
                ScenarioStep::Delay(message) if before.0 == StatusKind::Failure => {
                    let transition = simulator.apply(StatusEvent::Delay(message.clone()));
                    let after = (
                        simulator.kind(),
                        simulator.reporter().displayed_at(),
                        simulator.banner(),
                    );
                    if transition != Transition::Suppressed || after != before {
                        return Err(SimulationError::Invariant {
                            step: index,
                            reason: "delay replaced a visible failure".into(),
                        });
                    }
                    simulator.check_invariants(index)?;
                }
                step => simulator.step(index, step)?,
            }
        }

        simulator.settle();
        simulator.check_invariants(steps)?;

        let report = simulator.finish();
        debug!(steps, rechecks = report.rechecks, hash = %report.state_hash, "Random run finished");
        Ok(report)
    }
}
