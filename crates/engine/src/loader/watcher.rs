//! Filesystem hot-reload handler (mirrors the teacher's
//! `loader::watcher::handle_fs_event`): re-parses a changed file and
//! upserts it, or drops the in-memory template on removal.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use notify::event::{EventKind, ModifyKind, RemoveKind};
use tracing::{info, warn};

use super::schema::RuleTemplate;

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "yml" || e == "yaml")
        .unwrap_or(false)
}

fn is_dotfile(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

pub fn handle_fs_event(
    event: &notify::Event,
    templates: &RwLock<HashMap<PathBuf, RuleTemplate>>,
) {
    match event.kind {
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any) => {
            for path in &event.paths {
                if is_dotfile(path) || !is_yaml(path) {
                    continue;
                }
                match std::fs::read_to_string(path) {
                    Ok(contents) => match serde_yaml::from_str::<RuleTemplate>(&contents) {
                        Ok(template) => {
                            info!(alarm = %template.alarm, path = %path.display(), "reloaded rule file");
                            templates.write().unwrap().insert(path.clone(), template);
                        }
                        Err(err) => {
                            warn!(path = %path.display(), error = %err, "malformed rule file, keeping previous version");
                        }
                    },
                    Err(err) => {
                        warn!(path = %path.display(), error = %err, "failed to read changed rule file");
                    }
                }
            }
        }
        EventKind::Remove(RemoveKind::File) | EventKind::Remove(RemoveKind::Any) => {
            for path in &event.paths {
                if templates.write().unwrap().remove(path).is_some() {
                    info!(path = %path.display(), "rule file removed");
                }
            }
        }
        _ => {}
    }
}
