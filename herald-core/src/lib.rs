//! # herald-core
//!
//! Single-banner status reporting for a host surface.
//!
//! A [`StatusReporter`] shows at most one banner at a time. Failures always
//! win, delay notices never mask a failure, and a freshly shown failure is kept
//! on screen for a minimum window even if recovery is reported right away.
//!
//! ### Key Submodules:
//! - `reporter`: the state machine and its flicker guard
//! - `surface`: the append/remove capability the reporter renders into
//! - `time`: wall and virtual clocks plus the guard timings
//! - `events`: inbound status events and the transitions they produce

pub mod events;
pub mod reporter;
pub mod status;
pub mod surface;
pub mod time;

pub mod prelude {
    pub use crate::events::*;
    pub use crate::reporter::*;
    pub use crate::status::*;
    pub use crate::surface::*;
    pub use crate::time::*;
}

pub use events::{StatusEvent, Transition};
pub use reporter::{ReporterState, StatusReporter};
pub use status::StatusKind;
pub use surface::{MemorySurface, SharedSurface, Surface};
pub use time::{Clock, ReporterTiming, SystemClock, VirtualClock};
