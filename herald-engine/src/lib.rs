//! # herald-engine
//!
//! Live event loop for a [`StatusReporter`](herald_core::StatusReporter).
//!
//! The reporter is moved into a single tokio task. Callers talk to it through
//! a cloneable [`ReporterHandle`]; postponed success checks are timers that
//! post a re-check back into the same queue, so every state change happens on
//! that one task, in arrival order.

pub mod engine;

pub use engine::{
    reporter_from_config, EngineError, ReporterHandle, ReporterRuntime, RuntimeStats, TokioClock,
};
