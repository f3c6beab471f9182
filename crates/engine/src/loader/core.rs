//! [`RuleLoader`]: filesystem-backed rule-file loading with optional
//! hot-reload (C11 supplement), grounded on the teacher's
//! `loader::core::RuleLoader`.

use std::collections::HashMap;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{info, warn};

use health_core::Rule;

use super::error::{HealthError, LoadResult, LoadStatus, Result};
use super::schema::RuleTemplate;
use super::watcher::handle_fs_event;

/// Derives a stable `alarm_id` from an alarm's declared name. Stable across
/// reloads and across events for the same logical alarm (spec §3's
/// identity requirement), since the name — not the file path — is what a
/// human author treats as the alarm's identity.
pub fn alarm_id_for(alarm_name: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    alarm_name.hash(&mut hasher);
    hasher.finish()
}

/// Scans one or more directories for `*.yml`/`*.yaml` rule files and keeps
/// an in-memory map of parsed templates, optionally kept fresh via a
/// filesystem watcher.
pub struct RuleLoader {
    rules_dir: PathBuf,
    stock_rules_dir: Option<PathBuf>,
    templates: Arc<RwLock<HashMap<PathBuf, RuleTemplate>>>,
    _watcher: Option<RecommendedWatcher>,
}

impl RuleLoader {
    pub fn new(rules_dir: PathBuf, stock_rules_dir: Option<PathBuf>) -> Self {
        if !rules_dir.exists() {
            if let Err(e) = fs::create_dir_all(&rules_dir) {
                warn!(path = %rules_dir.display(), error = %e, "failed to create rules directory");
            }
        }
        Self {
            rules_dir,
            stock_rules_dir,
            templates: Arc::new(RwLock::new(HashMap::new())),
            _watcher: None,
        }
    }

    pub fn rules_dir(&self) -> &Path {
        &self.rules_dir
    }

    /// Loads the stock directory first, then the user directory, so
    /// user-authored files with the same alarm name take effect last (the
    /// map is keyed by path, not alarm name, so both survive — `bind_all`
    /// is what would need to resolve a name collision, and currently does
    /// not; see DESIGN.md).
    pub fn load_all(&self) -> Result<Vec<LoadResult>> {
        let mut results = Vec::new();
        if let Some(stock) = self.stock_rules_dir.clone() {
            self.scan_dir_recursive(&stock, &mut results)?;
        }
        self.scan_dir_recursive(&self.rules_dir, &mut results)?;
        Ok(results)
    }

    fn scan_dir_recursive(&self, dir: &Path, results: &mut Vec<LoadResult>) -> Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "failed to read rules directory");
                return Ok(());
            }
        };

        for entry in entries {
            let entry = entry?;
            let path = entry.path();

            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with('.') {
                    continue;
                }
            }

            if path.is_dir() {
                self.scan_dir_recursive(&path, results)?;
                continue;
            }

            let is_yaml = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e == "yml" || e == "yaml")
                .unwrap_or(false);
            if !is_yaml {
                results.push(LoadResult {
                    path,
                    status: LoadStatus::Skipped {
                        reason: "not a YAML file".to_string(),
                    },
                });
                continue;
            }

            match self.load_file(&path) {
                Ok(template) => {
                    info!(alarm = %template.alarm, path = %path.display(), "loaded rule file");
                    let alarm = template.alarm.clone();
                    self.templates.write().unwrap().insert(path.clone(), template);
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Loaded { alarm },
                    });
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load rule file");
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Failed { error: e.to_string() },
                    });
                }
            }
        }

        Ok(())
    }

    pub fn load_file(&self, path: &Path) -> Result<RuleTemplate> {
        let contents = fs::read_to_string(path)?;
        let template: RuleTemplate = serde_yaml::from_str(&contents)?;
        if template.alarm.is_empty() {
            return Err(HealthError::Validation("rule 'alarm' must not be empty".to_string()));
        }
        Ok(template)
    }

    /// Starts a filesystem watcher with a 500ms poll debounce (mirrors the
    /// teacher's loader).
    pub fn watch(&mut self) -> Result<()> {
        let templates = Arc::clone(&self.templates);

        let mut watcher = notify::recommended_watcher(move |res: std::result::Result<notify::Event, notify::Error>| {
            match res {
                Ok(event) => handle_fs_event(&event, &templates),
                Err(e) => warn!(error = %e, "filesystem watcher error"),
            }
        })?;

        watcher.watch(&self.rules_dir, RecursiveMode::Recursive)?;
        let _ = watcher.configure(notify::Config::default().with_poll_interval(Duration::from_millis(500)));

        info!(path = %self.rules_dir.display(), "watching rules directory for changes");
        self._watcher = Some(watcher);
        Ok(())
    }

    /// Binds every loaded template whose host glob matches `hostname` into
    /// a live `Rule`. Bind failures (e.g. a malformed duration) are logged
    /// and the template is skipped rather than aborting the whole reload
    /// (spec §7's non-fatal posture).
    pub fn bind_all(&self, hostname: &str) -> Vec<Rule> {
        let templates = self.templates.read().unwrap();
        templates
            .values()
            .filter(|t| t.matches_host(hostname))
            .filter_map(|t| match t.bind(alarm_id_for(&t.alarm)) {
                Ok(rule) => Some(rule),
                Err(e) => {
                    warn!(alarm = %t.alarm, error = %e, "failed to bind rule template");
                    None
                }
            })
            .collect()
    }

    pub fn templates(&self) -> Arc<RwLock<HashMap<PathBuf, RuleTemplate>>> {
        Arc::clone(&self.templates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_nested_directories_and_skips_dotfiles() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("disk.yml"),
            "alarm: disk_full\non: disk.used_percent\nevery: 10s\n",
        )
        .unwrap();
        fs::write(dir.path().join(".hidden.yml"), "not: loaded").unwrap();

        let sub = dir.path().join("nested");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("cpu.yml"), "alarm: cpu_high\non: cpu.usage\nevery: 5s\n").unwrap();

        let loader = RuleLoader::new(dir.path().to_path_buf(), None);
        let results = loader.load_all().unwrap();

        let loaded: Vec<_> = results
            .iter()
            .filter(|r| matches!(r.status, LoadStatus::Loaded { .. }))
            .collect();
        assert_eq!(loaded.len(), 2);

        let rules = loader.bind_all("any-host");
        assert_eq!(rules.len(), 2);
    }

    #[test]
    fn malformed_file_is_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.yml"), "not: valid: yaml: at all:").unwrap();

        let loader = RuleLoader::new(dir.path().to_path_buf(), None);
        let results = loader.load_all().unwrap();
        assert!(matches!(results[0].status, LoadStatus::Failed { .. }));
    }

    #[test]
    fn alarm_id_is_stable_for_the_same_name() {
        assert_eq!(alarm_id_for("disk_full"), alarm_id_for("disk_full"));
        assert_ne!(alarm_id_for("disk_full"), alarm_id_for("cpu_high"));
    }
}
