//! Notification dispatcher (spec §4.8, C7): drains unprocessed events,
//! dedups against the prior event of the same alarm, spawns the notifier,
//! and records the outcome.

use std::sync::atomic::Ordering;

use health_core::{Event, Rule, Status};
use health_notify::run_notifier;

use crate::host::Host;

/// Runs one dispatcher pass over `host`'s event log (spec §4.8 steps 1-4).
pub async fn log_process(host: &Host, now: i64) {
    let last_processed_id = host.health_last_processed_id.load(Ordering::Acquire);
    let snapshot = host.event_log.snapshot_since(last_processed_id);
    let first_waiting = host.event_log.compute_first_waiting(last_processed_id);

    for event in snapshot {
        if event.flags.processed || event.flags.updated {
            continue;
        }
        let ready_at = event.when + event.delay;
        if now < ready_at {
            continue;
        }
        let outcome = execute(host, event, now).await;
        let id = outcome.unique_id;
        host.event_log.update_event(id, move |e| *e = outcome);
    }

    host.health_last_processed_id.store(first_waiting, Ordering::Release);

    if host.event_log.len() > host.event_log.max() {
        host.event_log.trim();
    }
}

/// Decides whether `event` should notify, runs the notifier if so, and
/// returns the event with its dispatch flags updated. Never touches the
/// log's lock itself — callers persist the result.
async fn execute(host: &Host, event: Event, now: i64) -> Event {
    let anchor = Some(event.unique_id);
    decide_and_notify(host, event, now, anchor).await
}

/// The repeat emitter's counterpart to `execute`: same notification
/// decision and spawn, but the event has no log entry to persist back to
/// (spec §4.6, P5), so the dedup scan has no anchor and starts at the head.
pub(crate) async fn execute_for_repeat(host: &Host, event: Event, now: i64) {
    let _ = decide_and_notify(host, event, now, None).await;
}

async fn decide_and_notify(host: &Host, mut event: Event, now: i64, dedup_anchor: Option<u64>) -> Event {
    event.flags.processed = true;

    if event.new_status < Status::Clear {
        return event;
    }
    if event.new_status <= Status::Clear && event.flags.no_clear_notification {
        return event;
    }

    if !event.flags.no_clear_notification {
        let prior = host.event_log.most_recent_notified(event.alarm_id, dedup_anchor);
        match prior {
            Some(p) if p.new_status == event.new_status => return event,
            None if event.new_status == Status::Clear => return event,
            _ => {}
        }
    }

    if event.flags.silenced {
        return event;
    }

    let rules = host.rules.read().unwrap();
    let rule = rules.iter().find(|r| r.alarm_id == event.alarm_id);
    let exec = resolve_exec(host, &event, rule);
    let recipient = resolve_recipient(host, &event, rule);
    let (warn_count, crit_count, expr_source, expr_error) = count_active_and_capture(&rules, &event);
    let argv = build_argv(host, &event, &exec, &recipient, warn_count, crit_count, &expr_source, &expr_error);
    drop(rules);

    match run_notifier(&exec, &argv).await {
        Ok(outcome) => {
            event.exec_code = outcome.code;
            event.flags.exec_failed = !outcome.success();
            event.flags.exec_run = true;
            event.exec_run_timestamp = now;
        }
        Err(err) => {
            tracing::warn!(alarm_id = event.alarm_id, error = %err, "failed to spawn notifier");
            event.flags.exec_run = true;
            event.exec_run_timestamp = now;
        }
    }

    event
}

fn resolve_exec(host: &Host, event: &Event, rule: Option<&Rule>) -> String {
    rule.and_then(|r| r.exec.clone())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| {
            if event.exec.is_empty() {
                host.default_exec.clone()
            } else {
                event.exec.clone()
            }
        })
}

fn resolve_recipient(host: &Host, event: &Event, rule: Option<&Rule>) -> String {
    rule.and_then(|r| r.recipient.clone())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| {
            if event.recipient.is_empty() {
                host.default_recipient.clone()
            } else {
                event.recipient.clone()
            }
        })
}

/// Counts rules currently active (chart collected, status Warning/Critical)
/// and, for the rule matching `event.alarm_id`, captures the expression
/// source/error to attach to the notifier argv (spec §4.8 "Counts").
fn count_active_and_capture(rules: &[Rule], event: &Event) -> (usize, usize, String, String) {
    let mut warn_count = 0;
    let mut crit_count = 0;
    let mut expr_source = String::new();
    let mut expr_error = String::new();

    for rule in rules {
        if rule.chart_last_collected != 0 {
            match rule.status {
                Status::Warning => warn_count += 1,
                Status::Critical => crit_count += 1,
                _ => {}
            }
        }

        if rule.alarm_id == event.alarm_id {
            let expr = if event.new_status == Status::Critical {
                rule.critical.as_ref()
            } else {
                rule.warning.as_ref()
            };
            if let Some(expr) = expr {
                expr_source = expr.source().to_string();
                expr_error = expr.error_msg().to_string();
            }
        }
    }

    (warn_count, crit_count, expr_source, expr_error)
}

#[allow(clippy::too_many_arguments)]
fn build_argv(
    host: &Host,
    event: &Event,
    exec: &str,
    recipient: &str,
    warn_count: usize,
    crit_count: usize,
    expr_source: &str,
    expr_error: &str,
) -> Vec<String> {
    vec![
        exec.to_string(),
        recipient.to_string(),
        host.registry_hostname.clone(),
        event.unique_id.to_string(),
        event.alarm_id.to_string(),
        event.alarm_event_id.to_string(),
        event.when.to_string(),
        event.name.clone(),
        event.chart.clone(),
        event.family.clone(),
        event.new_status.to_string(),
        event.old_status.to_string(),
        format!("{}", event.new_value),
        format!("{}", event.old_value),
        event.source.clone(),
        event.duration.to_string(),
        event.non_clear_duration.to_string(),
        event.units.clone(),
        event.info.clone(),
        format!("{}", event.new_value),
        format!("{}", event.old_value),
        expr_source.to_string(),
        expr_error.to_string(),
        warn_count.to_string(),
        crit_count.to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use health_core::{EventFlags, Status};

    fn host_with_log(max: usize) -> Host {
        Host::new("web-01", "web-01", max)
    }

    fn base_event(alarm_id: u64, new_status: Status) -> Event {
        Event {
            unique_id: 0,
            alarm_id,
            alarm_event_id: 1,
            when: 100,
            name: "disk_full".into(),
            chart: "disk.used".into(),
            family: "disk".into(),
            exec: String::new(),
            recipient: String::new(),
            duration: 0,
            non_clear_duration: 0,
            old_value: 0.0,
            new_value: 1.0,
            old_status: Status::Undefined,
            new_status,
            source: String::new(),
            units: String::new(),
            info: String::new(),
            delay: 0,
            flags: EventFlags::default(),
            exec_run_timestamp: 0,
            exec_code: 0,
            last_repeat: 0,
        }
    }

    #[tokio::test]
    async fn first_time_clear_is_suppressed() {
        let host = host_with_log(100);
        let id = host.event_log.append(base_event(1, Status::Clear));
        log_process(&host, 200).await;

        let events = host.event_log.snapshot_since(0);
        let e = events.iter().find(|e| e.unique_id == id).unwrap();
        assert!(e.flags.processed);
        assert!(!e.flags.exec_run);
        assert!(host.health_last_processed_id.load(Ordering::Acquire) >= id);
    }

    #[tokio::test]
    async fn internal_status_never_notifies() {
        let host = host_with_log(100);
        let id = host.event_log.append(base_event(1, Status::Undefined));
        log_process(&host, 200).await;

        let events = host.event_log.snapshot_since(0);
        let e = events.iter().find(|e| e.unique_id == id).unwrap();
        assert!(e.flags.processed);
        assert!(!e.flags.exec_run);
    }

    #[tokio::test]
    async fn not_yet_ready_events_are_left_unprocessed() {
        let host = host_with_log(100);
        let mut event = base_event(1, Status::Warning);
        event.delay = 50;
        let id = host.event_log.append(event);
        log_process(&host, 120).await;

        let events = host.event_log.snapshot_since(0);
        let e = events.iter().find(|e| e.unique_id == id).unwrap();
        assert!(!e.flags.processed);
    }

    #[tokio::test]
    async fn repeated_critical_suppresses_via_dedup_scan() {
        let host = host_with_log(100);
        let warn_event = base_event(1, Status::Warning);
        host.event_log.append(warn_event);

        let crit_event = base_event(1, Status::Critical);
        host.event_log.append(crit_event);

        // First pass: both the flapped Warning and the Critical transition
        // get dispatched (no prior exec_run for this alarm yet).
        log_process(&host, 200).await;

        let second_crit = base_event(1, Status::Critical);
        let id2 = host.event_log.append(second_crit);
        log_process(&host, 200).await;

        let events = host.event_log.snapshot_since(0);
        let e = events.iter().find(|e| e.unique_id == id2).unwrap();
        assert!(e.flags.processed);
        assert!(!e.flags.exec_run, "dedup scan should have suppressed the repeat Critical");
    }
}
