//! Simulator configuration.
use std::path::Path;
use std::path::PathBuf;

use figment::providers::Format;
use figment::providers::Yaml;
use figment::Figment;
use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::ConfigError;

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct SimulatorConfig {
    /// Seed for randomised runs.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Number of steps generated per randomised run.
    #[serde(default = "default_steps")]
    #[validate(range(min = 1, max = 1_000_000))]
    pub steps: usize,
    /// Longest clock advance (ms) a randomised step may take.
    #[serde(default = "default_max_advance_ms")]
    #[validate(range(min = 1, max = 3_600_000))]
    pub max_advance_ms: u64,
}

fn default_seed() -> u64 {
    42
}

fn default_steps() -> usize {
    1000
}

fn default_max_advance_ms() -> u64 {
    15_000
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            steps: default_steps(),
            max_advance_ms: default_max_advance_ms(),
        }
    }
}

impl SimulatorConfig {
    /// Load only SimulatorConfig from a specific path.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(path)));
        }

        Figment::new()
            .merge(Yaml::file(path))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }
}
