//! Reload coordinator (spec §4.9, C10): quiesces a host's rule set, marks
//! surviving log entries stale, and re-binds rules from the loader.

use crate::host::Host;
use crate::loader::RuleLoader;

/// Drops `host`'s current rules, marks every non-`Removed` log entry
/// `Updated` (suppressing notifications for state the reload is about to
/// replace), then re-binds rules from `loader` for `host.hostname`.
pub fn reload(host: &Host, loader: &RuleLoader) {
    {
        let mut rules = host.rules.write().unwrap();
        rules.clear();
    }

    host.event_log.mark_updated_all_except_removed();

    let rebound = loader.bind_all(&host.hostname);
    *host.rules.write().unwrap() = rebound;
}
