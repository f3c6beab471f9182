//! Runnability gate (spec §4.1, C4): decides whether a rule is eligible for
//! evaluation on this pass, and caches the chart flags the gate already
//! fetched so the dispatcher doesn't need a second query (spec §4.8's
//! active-rule count).

use health_core::{MetricQuery, Rule};

/// Returns `true` iff `rule` should run this pass. `next_run` is lowered to
/// the earliest timestamp that would make a currently-ineligible rule
/// runnable, mirroring the source's scheduling hint.
pub fn evaluate_runnable(rule: &mut Rule, now: i64, next_run: &mut i64, query: &dyn MetricQuery) -> bool {
    let Some(chart) = rule.chart.clone() else {
        return false;
    };

    if rule.next_update > now {
        *next_run = (*next_run).min(rule.next_update);
        return false;
    }

    if rule.update_every == 0 {
        return false;
    }

    let flags = query.flags(&chart);
    rule.chart_last_collected = flags.last_collected_sec;

    if flags.obsolete || !flags.enabled {
        return false;
    }
    if flags.collected_samples < 2 {
        return false;
    }

    if let Some(lookup) = &rule.db_lookup {
        let first_time = query.first_time(&chart);
        let last_time = query.last_time(&chart);
        let needed = now + lookup.before + lookup.after;

        if needed + rule.update_every < first_time {
            return false;
        }
        if needed - rule.update_every > last_time {
            return false;
        }
        if now + rule.update_every < first_time {
            return false;
        }
    }

    true
}
