//! # Herald Telemetry
//!
//! Crate for logging and metrics around banner transitions.

pub mod logging;
pub mod metrics;

pub use logging::EventLogger;
pub use metrics::MetricsRecorder;
