//! Replay module.
//!
//! Loads a recorded scenario, runs it deterministically and compares the
//! resulting state hash with the expected one.

use std::path::Path;

use tracing::{error, info};

use crate::{Scenario, SimulationError, SimulationReport, Simulator};

/// Replays the scenario at `path`.
///
/// The hash is validated against `expected_hash` when given, otherwise
/// against the scenario's own `expected_hash` field if it has one.
pub fn replay_scenario<P: AsRef<Path>>(
    path: P,
    expected_hash: Option<&str>,
) -> Result<SimulationReport, SimulationError> {
    let path = path.as_ref();
    info!("Replaying scenario {}", path.display());
    let scenario = Scenario::load(path)?;
    let report = Simulator::run_scenario(&scenario)?;

    match expected_hash.or(scenario.expected_hash.as_deref()) {
        Some(expected) if expected != report.state_hash => {
            error!("Hash mismatch! Expected: {expected}");
            Err(SimulationError::HashMismatch {
                expected: expected.to_string(),
                actual: report.state_hash,
            })
        }
        Some(_) => {
            info!("Scenario validation successful");
            Ok(report)
        }
        None => Ok(report),
    }
}
