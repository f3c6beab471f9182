//! Alarm status and the escalation ordering used by hysteresis.

use std::fmt;

/// A rule or event's health status.
///
/// Declaration order is significant: `derive(Ord)` compares variants in the
/// order they're declared, and escalation (`new_status > rule.status`) relies
/// on `Removed < Undefined < Uninitialized < Unknown < Clear < Warning <
/// Critical`. Statuses below `Clear` are internal and never notified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum Status {
    Removed,
    Undefined,
    Uninitialized,
    Unknown,
    Clear,
    Warning,
    Critical,
}

impl Default for Status {
    fn default() -> Self {
        Status::Undefined
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Removed => "REMOVED",
            Status::Undefined => "UNDEFINED",
            Status::Uninitialized => "UNINITIALIZED",
            Status::Unknown => "UNKNOWN",
            Status::Clear => "CLEAR",
            Status::Warning => "WARNING",
            Status::Critical => "CRITICAL",
        };
        f.write_str(s)
    }
}
