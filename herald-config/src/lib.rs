//! # Herald Configuration System
//!
//! Hierarchical configuration for the status reporter, the live runtime and
//! the simulator.
//!
//! Hierarchy:
//! 1. Default values
//! 2. `config/herald.yaml`
//! 3. `config/<HERALD_ENV>.yaml` (environment overrides, `production` by default)
//! 4. `HERALD_*` environment variables, `__` separating nested keys

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod error;
mod reporter;
mod simulator;
mod telemetry;
mod validation;

pub use error::ConfigError;
pub use reporter::ReporterConfig;
pub use simulator::SimulatorConfig;
pub use telemetry::TelemetryConfig;

const BASE_FILE: &str = "config/herald.yaml";
const ENV_PREFIX: &str = "HERALD_";

/// Top‑level configuration container.
#[derive(Debug, Serialize, Deserialize, Validate, Default, Clone)]
pub struct HeraldConfig {
    /// Flicker guard and banner rendering.
    #[validate(nested)]
    #[serde(default)]
    pub reporter: ReporterConfig,

    /// Logging and metrics.
    #[validate(nested)]
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Deterministic simulation and fuzzing.
    #[validate(nested)]
    #[serde(default)]
    pub simulator: SimulatorConfig,
}

impl HeraldConfig {
    /// Load configuration from the default files and the environment.
    /// Missing files are skipped.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(HeraldConfig::default()));

        if Path::new(BASE_FILE).exists() {
            figment = figment.merge(Yaml::file(BASE_FILE));
        }

        let env = std::env::var("HERALD_ENV").unwrap_or_else(|_| "production".into());
        let env_file = format!("config/{}.yaml", env);
        if Path::new(&env_file).exists() {
            figment = figment.merge(Yaml::file(env_file));
        }

        Self::extract(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Load configuration from a specific file, with environment overrides.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(path)));
        }

        Self::extract(
            Figment::from(Serialized::defaults(HeraldConfig::default()))
                .merge(Yaml::file(path))
                .merge(Env::prefixed(ENV_PREFIX).split("__")),
        )
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        figment
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }
}
