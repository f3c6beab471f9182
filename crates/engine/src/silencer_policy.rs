//! Silencer policy (spec §4.2, C2): turns a matched `Silencer` into rule
//! flag mutations. The matching predicate itself lives on `Silencer` in the
//! core crate; this is the stateful half that touches `Rule`.

use health_core::{Rule, SilenceType, SilencerRuleset};

/// Walks `ruleset.silencers` in order; the first matcher that matches wins.
/// An unmatched rule yields `SilenceType::None`.
pub fn check_silenced(rule: &Rule, hostname: &str, ruleset: &SilencerRuleset) -> SilenceType {
    let chart = rule.chart.as_deref().unwrap_or("");
    for silencer in &ruleset.silencers {
        if silencer.matches(&rule.name, chart, chart, hostname, &rule.family) {
            return ruleset.stype;
        }
    }
    SilenceType::None
}

/// Clears `Disabled`/`Silenced` on `rule`, then reapplies them per the
/// current ruleset. Returns `true` iff `Disabled` ended up set, so the
/// caller can skip the rule entirely.
pub fn update_disabled_silenced(rule: &mut Rule, hostname: &str, ruleset: &SilencerRuleset) -> bool {
    rule.flags.disabled = false;
    rule.flags.silenced = false;

    let effective = if ruleset.all_alarms {
        ruleset.stype
    } else {
        check_silenced(rule, hostname, ruleset)
    };

    match effective {
        SilenceType::None => {}
        SilenceType::DisableAlarms => rule.flags.disabled = true,
        SilenceType::SilenceNotifications => rule.flags.silenced = true,
    }

    rule.flags.disabled
}

#[cfg(test)]
mod tests {
    use super::*;
    use health_core::Silencer;

    fn ruleset(stype: SilenceType, all_alarms: bool, silencers: Vec<Silencer>) -> SilencerRuleset {
        SilencerRuleset {
            silencers,
            stype,
            all_alarms,
        }
    }

    #[test]
    fn all_alarms_applies_stype_unconditionally() {
        let mut rule = Rule::new(1, "disk_full", Some("disk.used".into()));
        let rs = ruleset(SilenceType::DisableAlarms, true, vec![]);
        assert!(update_disabled_silenced(&mut rule, "web-01", &rs));
        assert!(rule.flags.disabled);
    }

    #[test]
    fn non_matching_rule_is_untouched() {
        let mut rule = Rule::new(1, "disk_full", Some("disk.used".into()));
        let rs = ruleset(
            SilenceType::SilenceNotifications,
            false,
            vec![Silencer {
                alarm: Some("cpu_*".into()),
                ..Default::default()
            }],
        );
        assert!(!update_disabled_silenced(&mut rule, "web-01", &rs));
        assert!(!rule.flags.disabled);
        assert!(!rule.flags.silenced);
    }

    #[test]
    fn matching_rule_gets_silenced_not_disabled() {
        let mut rule = Rule::new(1, "disk_full", Some("disk.used".into()));
        let rs = ruleset(
            SilenceType::SilenceNotifications,
            false,
            vec![Silencer {
                alarm: Some("disk_*".into()),
                ..Default::default()
            }],
        );
        assert!(!update_disabled_silenced(&mut rule, "web-01", &rs));
        assert!(rule.flags.silenced);
    }

    #[test]
    fn first_match_wins() {
        let rule = Rule::new(1, "disk_full", Some("disk.used".into()));
        let rs = ruleset(
            SilenceType::DisableAlarms,
            false,
            vec![
                Silencer {
                    alarm: Some("disk_*".into()),
                    ..Default::default()
                },
                Silencer::default(),
            ],
        );
        assert_eq!(check_silenced(&rule, "web-01", &rs), SilenceType::DisableAlarms);
    }
}
