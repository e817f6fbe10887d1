//! Reporter configuration.
//!
//! Flicker-guard timings and the class prefix used when rendering banners.

use serde::{Deserialize, Serialize};
use validator::Validate;

use herald_core::status::DEFAULT_CLASS_PREFIX;
use herald_core::ReporterTiming;

use crate::validation;

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct ReporterConfig {
    /// A failure younger than this (ms) survives a success report.
    #[serde(default = "default_guard_window_ms")]
    #[validate(range(min = 1, max = 600_000))]
    pub guard_window_ms: u64,

    /// Delay (ms) before a postponed success is re-checked.
    #[serde(default = "default_retry_delay_ms")]
    #[validate(range(min = 1, max = 600_000))]
    pub retry_delay_ms: u64,

    /// Base class name; banners get `<prefix> <prefix>-<kind>`.
    #[serde(default = "default_class_prefix")]
    #[validate(custom(function = validation::validate_class_prefix))]
    pub class_prefix: String,

    /// Name of the container banners are attached to.
    #[serde(default = "default_container")]
    #[validate(length(min = 1))]
    pub container: String,
}

fn default_guard_window_ms() -> u64 {
    ReporterTiming::DEFAULT_GUARD_WINDOW.as_millis() as u64
}

fn default_retry_delay_ms() -> u64 {
    ReporterTiming::DEFAULT_RETRY_DELAY.as_millis() as u64
}

fn default_class_prefix() -> String {
    DEFAULT_CLASS_PREFIX.into()
}

fn default_container() -> String {
    "body".into()
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            guard_window_ms: default_guard_window_ms(),
            retry_delay_ms: default_retry_delay_ms(),
            class_prefix: default_class_prefix(),
            container: default_container(),
        }
    }
}

impl ReporterConfig {
    pub fn timing(&self) -> ReporterTiming {
        ReporterTiming::from_millis(self.guard_window_ms, self.retry_delay_ms)
    }
}
