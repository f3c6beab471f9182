//! Repeating-alarm emitter (spec §4.6, C8). Repeating rules never touch the
//! event log (P5): a synthetic event is built, handed straight to the same
//! execution path the dispatcher uses, and dropped.

use health_core::{Event, EventFlags, Rule, Status};

use crate::dispatcher::execute_for_repeat;
use crate::host::Host;

/// Walks `host`'s rules and fires a repeat notification for any repeating
/// rule whose cadence has elapsed. Mutates `last_repeat` on the rules it
/// fires.
pub async fn emit_repeats(host: &Host, now: i64) {
    let due: Vec<Event> = {
        let mut rules = host.rules.write().unwrap();
        rules
            .iter_mut()
            .filter_map(|rule| repeat_event_if_due(rule, now))
            .collect()
    };

    for event in due {
        // Repeats are dispatched inline and never appended to the log
        // (spec §4.6, P5); the dedup scan has no log entry to anchor from,
        // so it starts at the head.
        execute_for_repeat(host, event, now).await;
    }
}

fn repeat_event_if_due(rule: &mut Rule, now: i64) -> Option<Event> {
    if !rule.is_repeating() {
        return None;
    }
    if !matches!(rule.status, Status::Warning | Status::Critical) {
        return None;
    }

    let cadence = if rule.status == Status::Critical {
        rule.crit_repeat_every
    } else {
        rule.warn_repeat_every
    };
    if cadence <= 0 || rule.last_repeat + cadence > now {
        return None;
    }

    rule.last_repeat = now;

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
        non_clear_duration: if rule.non_clear_since > 0 { now - rule.non_clear_since } else { 0 },
        old_value: rule.old_value,
        new_value: rule.value,
        old_status: rule.old_status,
        new_status: rule.status,
        source: rule.source.clone(),
        units: rule.units.clone(),
        info: rule.info.clone(),
        delay: 0,
        flags: EventFlags {
            no_clear_notification: rule.flags.no_clear_notification,
            silenced: rule.flags.silenced,
            ..Default::default()
        },
        exec_run_timestamp: 0,
        exec_code: 0,
        last_repeat: now,
    })
}
