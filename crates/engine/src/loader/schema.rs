//! On-disk rule-file schema (C11 supplement). Deliberately a single flat
//! shape — unlike the teacher's envelope/kind scheme, this format describes
//! exactly one kind of document, so there's no first-pass "what kind is
//! this" deserialization.

use serde::Deserialize;

use health_core::{DbLookup, Rule};

use super::error::HealthError;

fn default_wildcard() -> String {
    "*".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DelaySpec {
    #[serde(default)]
    pub up: Option<String>,
    #[serde(default)]
    pub down: Option<String>,
    #[serde(default)]
    pub multiplier: Option<f64>,
    #[serde(default)]
    pub max: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepeatSpec {
    #[serde(default)]
    pub warning: Option<String>,
    #[serde(default)]
    pub critical: Option<String>,
}

/// A parsed rule-file document, not yet bound to a live chart or alarm id.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleTemplate {
    pub alarm: String,
    pub on: String,
    #[serde(default = "default_wildcard")]
    pub hosts: String,
    #[serde(default = "default_wildcard")]
    pub families: String,
    #[serde(default)]
    pub lookup: Option<String>,
    pub every: String,
    #[serde(default)]
    pub warn: Option<String>,
    #[serde(default)]
    pub crit: Option<String>,
    #[serde(default)]
    pub delay: DelaySpec,
    #[serde(default)]
    pub repeat: RepeatSpec,
    #[serde(default)]
    pub exec: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub units: String,
    #[serde(default)]
    pub info: String,
    #[serde(default)]
    pub options: String,
    #[serde(default)]
    pub no_clear_notification: bool,
}

impl RuleTemplate {
    pub fn matches_host(&self, hostname: &str) -> bool {
        wildmatch::WildMatch::new(&self.hosts).matches(hostname)
    }

    /// Binds this template to a concrete `alarm_id`, producing a live
    /// `Rule`. `calculation`/`warning`/`critical` are left unset: the
    /// expression compiler that turns `warn`/`crit` text into an
    /// `Expression` is an external collaborator (spec §1/§6), not part of
    /// this loader.
    pub fn bind(&self, alarm_id: u64) -> Result<Rule, HealthError> {
        let update_every = parse_duration(&self.every)?;

        let mut rule = Rule::new(alarm_id, self.alarm.clone(), Some(self.on.clone()));
        rule.family = self.families.clone();
        rule.update_every = update_every;
        rule.next_update = 0;
        rule.exec = self.exec.clone();
        rule.recipient = self.to.clone();
        rule.units = self.units.clone();
        rule.info = self.info.clone();
        rule.flags.no_clear_notification = self.no_clear_notification;

        if self.lookup.is_some() {
            rule.db_lookup = Some(DbLookup {
                after: -update_every,
                before: 0,
                dimensions: String::new(),
                group: String::new(),
                options: self.options.clone(),
            });
        }

        if let Some(up) = &self.delay.up {
            rule.delay_up_duration = parse_duration(up)?;
        }
        if let Some(down) = &self.delay.down {
            rule.delay_down_duration = parse_duration(down)?;
        }
        if let Some(m) = self.delay.multiplier {
            rule.delay_multiplier = m;
        }
        if let Some(max) = &self.delay.max {
            rule.delay_max_duration = parse_duration(max)?;
        }

        if let Some(w) = &self.repeat.warning {
            rule.warn_repeat_every = parse_duration(w)?;
        }
        if let Some(c) = &self.repeat.critical {
            rule.crit_repeat_every = parse_duration(c)?;
        }

        Ok(rule)
    }
}

/// Parses durations like `"10s"`, `"5m"`, `"1h"`, or a bare integer (seconds).
pub fn parse_duration(raw: &str) -> Result<i64, HealthError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(HealthError::Validation("empty duration".to_string()));
    }

    let (value, multiplier) = match raw.chars().last() {
        Some('s') => (&raw[..raw.len() - 1], 1),
        Some('m') => (&raw[..raw.len() - 1], 60),
        Some('h') => (&raw[..raw.len() - 1], 3600),
        _ => (raw, 1),
    };

    value
        .parse::<i64>()
        .map(|v| v * multiplier)
        .map_err(|e| HealthError::Validation(format!("invalid duration '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_suffixed_durations() {
        assert_eq!(parse_duration("10s").unwrap(), 10);
        assert_eq!(parse_duration("5m").unwrap(), 300);
        assert_eq!(parse_duration("1h").unwrap(), 3600);
    }

    #[test]
    fn bare_integer_is_seconds() {
        assert_eq!(parse_duration("42").unwrap(), 42);
    }

    #[test]
    fn empty_duration_is_rejected() {
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn bind_produces_a_runnable_template() {
        let yaml = r#"
alarm: disk_full
on: disk.used_percent
every: 10s
warn: "$this > 80"
crit: "$this > 95"
delay:
  up: 60s
  down: 120s
  multiplier: 1.5
  max: 1h
repeat:
  warning: 1h
  critical: 5m
exec: /usr/libexec/alarm-notify.sh
to: sysadmin
units: "%"
"#;
        let template: RuleTemplate = serde_yaml::from_str(yaml).unwrap();
        let rule = template.bind(1).unwrap();
        assert_eq!(rule.update_every, 10);
        assert_eq!(rule.delay_up_duration, 60);
        assert_eq!(rule.delay_down_duration, 120);
        assert_eq!(rule.delay_multiplier, 1.5);
        assert_eq!(rule.delay_max_duration, 3600);
        assert_eq!(rule.warn_repeat_every, 3600);
        assert_eq!(rule.crit_repeat_every, 300);
        assert!(rule.is_repeating());
    }

    #[test]
    fn host_glob_matching() {
        let yaml = "alarm: x\non: y\nevery: 10s\nhosts: \"web-*\"\n";
        let template: RuleTemplate = serde_yaml::from_str(yaml).unwrap();
        assert!(template.matches_host("web-01"));
        assert!(!template.matches_host("db-01"));
    }
}
