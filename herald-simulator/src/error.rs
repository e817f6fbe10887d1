use std::path::PathBuf;

use thiserror::Error;

use herald_core::StatusKind;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Scenario file not found: {0}")]
    ScenarioNotFound(PathBuf),

    #[error("Scenario parsing error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Step {step}: expected {expected}, found {found}")]
    Expectation {
        step: usize,
        expected: String,
        found: String,
    },

    #[error("Invariant violated after step {step}: {reason}")]
    Invariant { step: usize, reason: String },

    #[error("Advancing {advance_ms}ms would move the virtual clock out of range")]
    ClockOverflow { advance_ms: u64 },

    #[error("Start time {0}ms is out of range for the virtual clock")]
    StartOutOfRange(u64),

    #[error("State hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },

    #[error("Configuration error: {0}")]
    Config(#[from] herald_config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SimulationError {
    pub(crate) fn unexpected_kind(step: usize, expected: StatusKind, found: StatusKind) -> Self {
        SimulationError::Expectation {
            step,
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}
