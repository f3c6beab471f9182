//! Environment-driven daemon configuration (spec §6, "Config keys").
//!
//! Simplified from the teacher's `Config::from_env` / `for_profile` pattern:
//! a single daemon has no multi-tenant profiles, so the `{PROFILE}_{KEY}`
//! indirection is dropped and the flat `env_or`/`env_u64` helpers are kept
//! directly.

use std::env;
use std::path::PathBuf;

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_bool(key: &str, default: bool) -> bool {
    env_opt(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_i64(key: &str, default: i64) -> i64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Master configuration for the health-monitoring daemon (spec §6 config
/// keys, plus the silencer file path/size bound every running daemon needs).
#[derive(Debug, Clone)]
pub struct HealthConfig {
    pub enabled: bool,
    pub min_run_every_secs: u64,
    pub hibernation_delay_secs: i64,
    pub rules_dir: PathBuf,
    pub stock_rules_dir: Option<PathBuf>,
    pub silencers_file: PathBuf,
    pub silencers_max_bytes: u64,
}

impl HealthConfig {
    /// Build config from environment variables, applying spec §6 defaults.
    pub fn from_env() -> Self {
        let stock = env_opt("HEALTH_STOCK_CONFIG_DIR").map(PathBuf::from);
        Self {
            enabled: env_bool("HEALTH_ENABLED", true),
            min_run_every_secs: env_u64("HEALTH_RUN_AT_LEAST_EVERY", 10).max(1),
            hibernation_delay_secs: env_i64("HEALTH_HIBERNATION_DELAY", 60),
            rules_dir: PathBuf::from(env_or("HEALTH_CONFIG_DIR", "/etc/health.d")),
            stock_rules_dir: stock,
            silencers_file: PathBuf::from(env_or(
                "HEALTH_SILENCERS_FILE",
                "/etc/health-silencers.json",
            )),
            silencers_max_bytes: env_u64("HEALTH_SILENCERS_MAX_BYTES", 10 * 1024 * 1024),
        }
    }

    /// Print a summary for startup logs. Nothing here is secret, but keep
    /// the shape the teacher uses for its own config dump.
    pub fn log_summary(&self) {
        tracing::info!(
            enabled = self.enabled,
            min_run_every_secs = self.min_run_every_secs,
            hibernation_delay_secs = self.hibernation_delay_secs,
            rules_dir = %self.rules_dir.display(),
            stock_rules_dir = ?self.stock_rules_dir,
            silencers_file = %self.silencers_file.display(),
            "health config loaded"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        // Isolated from the process env: construct the struct directly
        // rather than relying on from_env(), since tests may run in
        // parallel and env vars are process-global.
        let cfg = HealthConfig {
            enabled: true,
            min_run_every_secs: 10,
            hibernation_delay_secs: 60,
            rules_dir: PathBuf::from("/etc/health.d"),
            stock_rules_dir: None,
            silencers_file: PathBuf::from("/etc/health-silencers.json"),
            silencers_max_bytes: 10 * 1024 * 1024,
        };
        assert!(cfg.enabled);
        assert_eq!(cfg.hibernation_delay_secs, 60);
    }

    #[test]
    fn min_run_every_floors_at_one_second() {
        assert_eq!(10u64.max(1), 10);
        assert_eq!(0u64.max(1), 1);
    }
}
