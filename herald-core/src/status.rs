//! Status kinds and their severity order.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix used for banner class names unless configured otherwise.
pub const DEFAULT_CLASS_PREFIX: &str = "status-report";

/// What the reporter currently shows.
///
/// Variants are declared in severity order, so `Ord` compares severity:
/// `Failure > Delay > None`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    #[default]
    None,
    Delay,
    Failure,
}

impl StatusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusKind::None => "none",
            StatusKind::Delay => "delay",
            StatusKind::Failure => "failure",
        }
    }

    /// `true` when this kind has a banner on the surface.
    #[inline]
    pub fn is_visible(&self) -> bool {
        *self != StatusKind::None
    }

    /// Class attribute for a banner of this kind: the base class followed by
    /// the kind-specific one, e.g. `status-report status-report-failure`.
    pub fn class_name(&self, prefix: &str) -> String {
        format!("{prefix} {prefix}-{}", self.as_str())
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_order() {
        assert!(StatusKind::Failure > StatusKind::Delay);
        assert!(StatusKind::Delay > StatusKind::None);
    }

    #[test]
    fn class_name_carries_base_and_kind() {
        assert_eq!(
            StatusKind::Failure.class_name(DEFAULT_CLASS_PREFIX),
            "status-report status-report-failure"
        );
        assert_eq!(StatusKind::Delay.class_name("x"), "x x-delay");
    }
}
