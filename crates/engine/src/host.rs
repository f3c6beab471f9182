//! The per-host rule registry (spec §3, "Host (H)").

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::RwLock;

use health_core::{Rule, SilencerRuleset};

use crate::event_log::EventLog;

/// One monitored host: its rule set, its event log, and the bookkeeping the
/// main loop and dispatcher need between iterations.
pub struct Host {
    pub hostname: String,
    pub registry_hostname: String,
    pub health_enabled: bool,
    pub default_exec: String,
    pub default_recipient: String,

    /// Wall-clock after which evaluation resumes; pushed forward when a
    /// suspension is detected (spec §4.10).
    pub health_delay_up_to: AtomicI64,
    /// Low-water mark the dispatcher advances past processed events
    /// (spec §4.8 step 3).
    pub health_last_processed_id: AtomicU64,

    pub rules: RwLock<Vec<Rule>>,
    pub event_log: EventLog,
    pub silencers: RwLock<SilencerRuleset>,
}

impl Host {
    pub fn new(hostname: impl Into<String>, registry_hostname: impl Into<String>, log_max: usize) -> Self {
        Self {
            hostname: hostname.into(),
            registry_hostname: registry_hostname.into(),
            health_enabled: true,
            default_exec: String::new(),
            default_recipient: String::new(),
            health_delay_up_to: AtomicI64::new(0),
            health_last_processed_id: AtomicU64::new(0),
            rules: RwLock::new(Vec::new()),
            event_log: EventLog::new(log_max),
            silencers: RwLock::new(SilencerRuleset::default()),
        }
    }

    pub fn is_evaluation_due(&self, now: i64) -> bool {
        self.health_enabled && now >= self.health_delay_up_to.load(Ordering::Acquire)
    }

    pub fn postpone_until(&self, timestamp: i64) {
        self.health_delay_up_to.store(timestamp, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_host_is_never_due() {
        let mut host = Host::new("web-01", "web-01", 1000);
        host.health_enabled = false;
        assert!(!host.is_evaluation_due(1_000_000));
    }

    #[test]
    fn postponement_holds_off_evaluation() {
        let host = Host::new("web-01", "web-01", 1000);
        host.postpone_until(200);
        assert!(!host.is_evaluation_due(100));
        assert!(host.is_evaluation_due(200));
    }
}
