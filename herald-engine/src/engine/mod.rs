mod clock;
mod error;
mod runtime;

pub use self::{
    clock::TokioClock,
    error::EngineError,
    runtime::{reporter_from_config, ReporterHandle, ReporterRuntime, RuntimeStats},
};

pub mod prelude {
    pub use super::{EngineError, ReporterHandle, ReporterRuntime, RuntimeStats, TokioClock};
}
