//! The alarm rule type (spec §3, "Rule (R)").

use crate::flags::RuleFlags;
use crate::status::Status;
use crate::traits::Expression;

/// Relative-time metric lookup a rule performs before evaluating its
/// expressions. `after`/`before` are both `<= 0`, offsets from "now".
#[derive(Debug, Clone)]
pub struct DbLookup {
    pub after: i64,
    pub before: i64,
    pub dimensions: String,
    pub group: String,
    pub options: String,
}

/// One alarm rule, bound to a chart (or unbound — permanently not runnable).
pub struct Rule {
    // Identity
    pub alarm_id: u64,
    pub next_event_id: u64,
    pub name: String,
    pub chart: Option<String>,
    pub family: String,

    pub db_lookup: Option<DbLookup>,

    pub calculation: Option<Box<dyn Expression>>,
    pub warning: Option<Box<dyn Expression>>,
    pub critical: Option<Box<dyn Expression>>,

    // Cadence
    pub update_every: i64,
    pub next_update: i64,

    // Hysteresis
    pub delay_up_duration: i64,
    pub delay_down_duration: i64,
    pub delay_multiplier: f64,
    pub delay_max_duration: i64,
    pub delay_up_current: i64,
    pub delay_down_current: i64,
    pub delay_last: i64,
    pub delay_up_to_timestamp: i64,

    // Repeat
    pub warn_repeat_every: i64,
    pub crit_repeat_every: i64,
    pub last_repeat: i64,

    // State
    pub status: Status,
    pub old_status: Status,
    pub value: f64,
    pub old_value: f64,
    pub last_status_change: i64,
    pub last_updated: i64,
    /// Wall-clock of the rule's most recent transition into/out of a
    /// non-Clear status; used to compute `Event::non_clear_duration`.
    pub non_clear_since: i64,
    /// Cached from the chart's flags during the gate pass, so the dispatcher
    /// can count active (collected) rules without a second metric query.
    pub chart_last_collected: i64,

    // Dispatch
    pub exec: Option<String>,
    pub recipient: Option<String>,
    pub source: String,
    pub units: String,
    pub info: String,

    pub flags: RuleFlags,
}

impl Default for Rule {
    fn default() -> Self {
        Self {
            alarm_id: 0,
            next_event_id: 1,
            name: String::new(),
            chart: None,
            family: String::new(),
            db_lookup: None,
            calculation: None,
            warning: None,
            critical: None,
            update_every: 10,
            next_update: 0,
            delay_up_duration: 0,
            delay_down_duration: 0,
            delay_multiplier: 1.0,
            delay_max_duration: 3600,
            delay_up_current: 0,
            delay_down_current: 0,
            delay_last: 0,
            delay_up_to_timestamp: 0,
            warn_repeat_every: 0,
            crit_repeat_every: 0,
            last_repeat: 0,
            status: Status::default(),
            old_status: Status::default(),
            value: f64::NAN,
            old_value: f64::NAN,
            last_status_change: 0,
            last_updated: 0,
            non_clear_since: 0,
            chart_last_collected: 0,
            exec: None,
            recipient: None,
            source: String::new(),
            units: String::new(),
            info: String::new(),
            flags: RuleFlags::default(),
        }
    }
}

impl Rule {
    pub fn new(alarm_id: u64, name: impl Into<String>, chart: Option<String>) -> Self {
        Self {
            alarm_id,
            name: name.into(),
            chart,
            ..Default::default()
        }
    }

    pub fn has_db_lookup(&self) -> bool {
        self.db_lookup.is_some()
    }

    pub fn is_repeating(&self) -> bool {
        self.warn_repeat_every > 0 || self.crit_repeat_every > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rule_defaults_to_undefined() {
        let r = Rule::new(1, "disk_full", Some("disk.used".to_string()));
        assert_eq!(r.status, Status::Undefined);
        assert!(!r.has_db_lookup());
        assert!(!r.is_repeating());
    }

    #[test]
    fn is_repeating_iff_any_cadence_positive() {
        let mut r = Rule::new(1, "x", None);
        assert!(!r.is_repeating());
        r.warn_repeat_every = 3600;
        assert!(r.is_repeating());
        r.warn_repeat_every = 0;
        r.crit_repeat_every = 300;
        assert!(r.is_repeating());
    }
}
