//! Silencer ruleset value type (spec §3, "Silencer ruleset (S)").
//!
//! Matching logic (`Silencer::matches`) lives here since it's a pure
//! function of the pattern fields; the policy built on top of it
//! (`check_silenced`, `update_disabled_silenced`) lives in the engine crate
//! because it mutates `Rule` flags.

use serde::{Deserialize, Serialize};

/// Effect a matching silencer has on a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SilenceType {
    None,
    DisableAlarms,
    SilenceNotifications,
}

impl Default for SilenceType {
    fn default() -> Self {
        SilenceType::None
    }
}

/// One glob-pattern matcher. Fields left `None` act as wildcards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Silencer {
    #[serde(default)]
    pub alarm: Option<String>,
    #[serde(default)]
    pub chart: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub family: Option<String>,
}

impl Silencer {
    /// A matcher matches iff every pattern it defines matches the
    /// corresponding field; absent patterns are wildcards.
    pub fn matches(&self, alarm: &str, chart: &str, context: &str, host: &str, family: &str) -> bool {
        Self::pattern_matches(&self.alarm, alarm)
            && Self::pattern_matches(&self.chart, chart)
            && Self::pattern_matches(&self.context, context)
            && Self::pattern_matches(&self.host, host)
            && Self::pattern_matches(&self.family, family)
    }

    fn pattern_matches(pattern: &Option<String>, value: &str) -> bool {
        match pattern {
            None => true,
            Some(p) => wildmatch::WildMatch::new(p).matches(value),
        }
    }
}

/// The full silencer ruleset: an ordered matcher list plus a global effect.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SilencerRuleset {
    #[serde(default)]
    pub silencers: Vec<Silencer>,
    #[serde(default)]
    pub stype: SilenceType,
    #[serde(default)]
    pub all_alarms: bool,
}
