//! Scenario files.
//!
//! A scenario is a YAML list of calls, clock advances and expectations:
//!
//! ```yaml
//! name: failure survives a quick recovery
//! steps:
//!   - failure: net down
//!   - success
//!   - advance_ms: 6000
//!   - expect: { kind: failure, text: net down }
//!   - advance_ms: 5000
//!   - expect: { kind: none }
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use herald_config::ReporterConfig;
use herald_core::{StatusEvent, StatusKind};

use crate::error::SimulationError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,
    /// Virtual epoch millisecond the run starts at.
    #[serde(default)]
    pub start_ms: u64,
    /// Overrides the reporter configuration for this run.
    #[serde(default)]
    pub reporter: Option<ReporterConfig>,
    /// Steps are written as single-key maps (`failure: net down`) rather
    /// than YAML tags.
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub steps: Vec<ScenarioStep>,
    /// Transcript hash recorded from an earlier run.
    #[serde(default)]
    pub expected_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStep {
    Failure(String),
    Delay(String),
    Success,
    /// Moves the virtual clock forward, firing due re-checks on the way.
    AdvanceMs(u64),
    /// Fires every pending re-check, however far ahead.
    Settle,
    Expect(Expectation),
}

impl ScenarioStep {
    /// The reporter call this step makes, if it is one.
    pub fn as_event(&self) -> Option<StatusEvent> {
        match self {
            ScenarioStep::Failure(message) => Some(StatusEvent::Failure(message.clone())),
            ScenarioStep::Delay(message) => Some(StatusEvent::Delay(message.clone())),
            ScenarioStep::Success => Some(StatusEvent::Success),
            _ => None,
        }
    }
}

impl fmt::Display for ScenarioStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioStep::Failure(message) => write!(f, "failure {message:?}"),
            ScenarioStep::Delay(message) => write!(f, "delay {message:?}"),
            ScenarioStep::Success => write!(f, "success"),
            ScenarioStep::AdvanceMs(ms) => write!(f, "advance {ms}ms"),
            ScenarioStep::Settle => write!(f, "settle"),
            ScenarioStep::Expect(expectation) => write!(f, "expect {expectation}"),
        }
    }
}

/// What the surface should show at this point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expectation {
    pub kind: StatusKind,
    #[serde(default)]
    pub text: Option<String>,
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.text {
            Some(text) => write!(f, "{} {text:?}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl Scenario {
    pub fn from_yaml(source: &str) -> Result<Self, SimulationError> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SimulationError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SimulationError::ScenarioNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SimulationError> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
