//! The alarm state machine (spec §4.3-§4.5, C5): value→status derivation,
//! hysteresis delay, and the event-creation policy that runs on transition.

use health_core::{Event, EventFlags, Rule, Status};

/// The three-valued classification an expression's numeric result collapses
/// to before status derivation (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueStatus {
    Undefined,
    Clear,
    Raised,
}

pub fn value_to_status(result: f64) -> ValueStatus {
    if result.is_nan() || result.is_infinite() {
        ValueStatus::Undefined
    } else if result == 0.0 {
        ValueStatus::Clear
    } else {
        ValueStatus::Raised
    }
}

/// Derives the new rule status from the warning and critical expression
/// classifications (spec §4.3).
pub fn derive_status(warn_status: ValueStatus, crit_status: ValueStatus) -> Status {
    let mut status = Status::Undefined;

    match warn_status {
        ValueStatus::Clear => status = Status::Clear,
        ValueStatus::Raised => status = Status::Warning,
        ValueStatus::Undefined => {}
    }

    match crit_status {
        ValueStatus::Clear if status == Status::Undefined => status = Status::Clear,
        ValueStatus::Raised => status = Status::Critical,
        _ => {}
    }

    status
}

/// Applies hysteresis back-off when `new_status != rule.status` (spec
/// §4.4). Mutates the rule's delay working state and returns the delay to
/// attach to the resulting event.
pub fn apply_hysteresis(rule: &mut Rule, new_status: Status, now: i64) -> i64 {
    if now > rule.delay_up_to_timestamp {
        rule.delay_up_current = rule.delay_up_duration;
        rule.delay_down_current = rule.delay_down_duration;
        rule.delay_last = 0;
        rule.delay_up_to_timestamp = 0;
    } else {
        rule.delay_up_current = ((rule.delay_up_current as f64) * rule.delay_multiplier) as i64;
        rule.delay_up_current = rule.delay_up_current.min(rule.delay_max_duration);
        rule.delay_down_current = ((rule.delay_down_current as f64) * rule.delay_multiplier) as i64;
        rule.delay_down_current = rule.delay_down_current.min(rule.delay_max_duration);
    }

    let escalating = new_status > rule.status;
    let delay = if escalating {
        rule.delay_up_current
    } else {
        rule.delay_down_current
    };

    rule.delay_last = delay;
    rule.delay_up_to_timestamp = now + delay;
    delay
}

/// Runs the full transition: hysteresis, event creation (unless the rule is
/// repeating, per I4/§4.5, or the new status is `Undefined`, per P4), and the
/// rule state update. Returns the event to append, if any.
pub fn on_transition(rule: &mut Rule, new_status: Status, now: i64) -> Option<Event> {
    if new_status == rule.status {
        return None;
    }

    let delay = apply_hysteresis(rule, new_status, now);

    let event = if rule.is_repeating() || new_status == Status::Undefined {
        None
    } else {
        Some(Event {
            unique_id: 0,
            alarm_id: rule.alarm_id,
            alarm_event_id: rule.next_event_id,
            when: now,
            name: rule.name.clone(),
            chart: rule.chart.clone().unwrap_or_default(),
            family: rule.family.clone(),
            exec: rule.exec.clone().unwrap_or_default(),
            recipient: rule.recipient.clone().unwrap_or_default(),
            duration: now - rule.last_status_change,
            non_clear_duration: if rule.non_clear_since > 0 {
                now - rule.non_clear_since
            } else {
                0
            },
            old_value: rule.old_value,
            new_value: rule.value,
            old_status: rule.status,
            new_status,
            source: rule.source.clone(),
            units: rule.units.clone(),
            info: rule.info.clone(),
            delay,
            flags: EventFlags {
                no_clear_notification: rule.flags.no_clear_notification,
                silenced: rule.flags.silenced,
                ..Default::default()
            },
            exec_run_timestamp: 0,
            exec_code: 0,
            last_repeat: rule.last_repeat,
        })
    };

    if new_status == Status::Clear {
        rule.non_clear_since = 0;
    } else if rule.status == Status::Clear || rule.non_clear_since == 0 {
        rule.non_clear_since = now;
    }

    rule.next_event_id += 1;
    rule.last_status_change = now;
    rule.old_status = rule.status;
    rule.status = new_status;

    event
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_and_infinite_are_undefined() {
        assert_eq!(value_to_status(f64::NAN), ValueStatus::Undefined);
        assert_eq!(value_to_status(f64::INFINITY), ValueStatus::Undefined);
        assert_eq!(value_to_status(f64::NEG_INFINITY), ValueStatus::Undefined);
    }

    #[test]
    fn zero_is_clear_nonzero_is_raised() {
        assert_eq!(value_to_status(0.0), ValueStatus::Clear);
        assert_eq!(value_to_status(1.0), ValueStatus::Raised);
        assert_eq!(value_to_status(-5.0), ValueStatus::Raised);
    }

    #[test]
    fn critical_overrides_warning() {
        assert_eq!(derive_status(ValueStatus::Raised, ValueStatus::Raised), Status::Critical);
    }

    #[test]
    fn warning_alone_raises_warning() {
        assert_eq!(derive_status(ValueStatus::Raised, ValueStatus::Undefined), Status::Warning);
    }

    #[test]
    fn both_clear_is_clear() {
        assert_eq!(derive_status(ValueStatus::Clear, ValueStatus::Clear), Status::Clear);
    }

    #[test]
    fn both_undefined_is_undefined() {
        assert_eq!(derive_status(ValueStatus::Undefined, ValueStatus::Undefined), Status::Undefined);
    }

    #[test]
    fn crit_clear_does_not_override_warning() {
        // crit_status == Clear only sets status when status is still Undefined.
        assert_eq!(derive_status(ValueStatus::Raised, ValueStatus::Clear), Status::Warning);
    }

    #[test]
    fn hysteresis_resets_after_delay_window_passes() {
        let mut rule = Rule::new(1, "x", Some("c".into()));
        rule.delay_up_duration = 10;
        rule.delay_down_duration = 5;
        rule.delay_up_to_timestamp = 0;
        rule.status = Status::Warning;

        let delay = apply_hysteresis(&mut rule, Status::Critical, 100);
        assert_eq!(delay, 10);
        assert_eq!(rule.delay_up_to_timestamp, 110);
    }

    #[test]
    fn hysteresis_backs_off_on_rapid_retransition() {
        let mut rule = Rule::new(1, "x", Some("c".into()));
        rule.delay_up_duration = 10;
        rule.delay_down_duration = 5;
        rule.delay_multiplier = 2.0;
        rule.delay_max_duration = 100;
        rule.status = Status::Warning;
        apply_hysteresis(&mut rule, Status::Critical, 100);
        // Still within the previous delay window: multiply instead of reset.
        let delay = apply_hysteresis(&mut rule, Status::Warning, 105);
        assert_eq!(delay, 10); // down_current started at 5, doubled to 10
    }

    #[test]
    fn non_repeating_transition_appends_event_and_advances_rule() {
        let mut rule = Rule::new(1, "x", Some("c".into()));
        rule.status = Status::Undefined;
        let event = on_transition(&mut rule, Status::Clear, 100).unwrap();
        assert_eq!(event.old_status, Status::Undefined);
        assert_eq!(event.new_status, Status::Clear);
        assert_eq!(rule.status, Status::Clear);
        assert_eq!(rule.last_status_change, 100);
    }

    #[test]
    fn repeating_rule_transition_does_not_append() {
        let mut rule = Rule::new(1, "x", Some("c".into()));
        rule.warn_repeat_every = 60;
        rule.status = Status::Undefined;
        let event = on_transition(&mut rule, Status::Warning, 100);
        assert!(event.is_none());
        assert_eq!(rule.status, Status::Warning);
    }

    #[test]
    fn same_status_is_not_a_transition() {
        let mut rule = Rule::new(1, "x", Some("c".into()));
        rule.status = Status::Clear;
        assert!(on_transition(&mut rule, Status::Clear, 100).is_none());
    }

    #[test]
    fn transition_to_undefined_does_not_append_but_still_advances_rule() {
        // A query or expression failure forces new_status to Undefined
        // (main_loop::pass_b); that must never produce a log event (P4),
        // but the rule's own status bookkeeping still has to move on.
        let mut rule = Rule::new(1, "x", Some("c".into()));
        rule.status = Status::Warning;
        let event = on_transition(&mut rule, Status::Undefined, 100);
        assert!(event.is_none());
        assert_eq!(rule.status, Status::Undefined);
        assert_eq!(rule.old_status, Status::Warning);
        assert_eq!(rule.last_status_change, 100);
    }
}
