//! ## herald-core::events
//! **Inbound status events and the transitions they cause**

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::status::StatusKind;

/// A status signal delivered to the reporter.
///
/// `Recheck` is never sent by callers directly: the event loop posts it when a
/// postponed success comes due.
///
/// In YAML, read lists of events through
/// `serde_yaml::with::singleton_map_recursive` to get the `failure: <msg>` form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusEvent {
    Failure(String),
    Delay(String),
    Success,
    Recheck,
}

impl StatusEvent {
    pub fn failure(error: impl fmt::Display) -> Self {
        StatusEvent::Failure(error.to_string())
    }

    pub fn delay(error: impl fmt::Display) -> Self {
        StatusEvent::Delay(error.to_string())
    }
}

/// Effect of one reporter operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A banner of `kind` is now displayed, replacing whatever `replaced` was.
    Shown { kind: StatusKind, replaced: StatusKind },
    /// A delay notice was ignored because a failure is visible.
    Suppressed,
    /// The banner was removed.
    Cleared { previous: StatusKind },
    /// A recent failure is kept; the success must be re-checked after `after`.
    Deferred { after: Duration },
    /// Success reported while nothing was displayed.
    Idle,
}

impl Transition {
    /// Short label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Transition::Shown { .. } => "shown",
            Transition::Suppressed => "suppressed",
            Transition::Cleared { .. } => "cleared",
            Transition::Deferred { .. } => "deferred",
            Transition::Idle => "idle",
        }
    }

    /// The re-check delay, if this transition asks for one.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Transition::Deferred { after } => Some(*after),
            _ => None,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Shown { kind, replaced } => write!(f, "shown {kind} (replaced {replaced})"),
            Transition::Suppressed => write!(f, "suppressed"),
            Transition::Cleared { previous } => write!(f, "cleared {previous}"),
            Transition::Deferred { after } => write!(f, "deferred {}ms", after.as_millis()),
            Transition::Idle => write!(f, "idle"),
        }
    }
}
