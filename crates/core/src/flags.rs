//! Rule and event flag bits.
//!
//! Plain bool-field structs rather than a bitset crate: the flag sets here
//! are small and fixed, and nothing in this codebase's dependency lineage
//! reaches for a bitflags-style crate for this kind of thing.

/// Per-rule condition flags, recomputed every evaluation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleFlags {
    pub runnable: bool,
    pub disabled: bool,
    pub silenced: bool,
    pub db_error: bool,
    pub db_nan: bool,
    pub calc_error: bool,
    pub warn_error: bool,
    pub crit_error: bool,
    pub no_clear_notification: bool,
}

/// Per-event dispatch flags, set as the event moves through the log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventFlags {
    pub processed: bool,
    pub updated: bool,
    pub exec_run: bool,
    pub exec_failed: bool,
    pub silenced: bool,
    pub no_clear_notification: bool,
}
