//! Silencer ruleset file (spec §6 "Silencer file: JSON"). Parsed once at
//! startup (and whenever the control API asks for a reload) from a path
//! bounded by a max size; missing or malformed files log and fall back to
//! an empty ruleset rather than aborting the engine (spec §7).

use std::path::Path;

use health_core::{CoreError, SilencerRuleset};

/// Loads and parses the silencer ruleset at `path`. Returns an empty
/// ruleset (silences nothing) on any failure, having logged the cause.
pub fn load_silencer_ruleset(path: &Path, max_bytes: u64) -> SilencerRuleset {
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "silencer file missing, continuing with empty ruleset");
            return SilencerRuleset::default();
        }
    };

    if metadata.len() == 0 {
        tracing::warn!(path = %path.display(), "silencer file is empty, continuing with empty ruleset");
        return SilencerRuleset::default();
    }
    if metadata.len() > max_bytes {
        tracing::warn!(
            path = %path.display(),
            size = metadata.len(),
            max_bytes,
            "silencer file exceeds size bound, continuing with empty ruleset"
        );
        return SilencerRuleset::default();
    }

    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "failed to read silencer file, continuing with empty ruleset");
            return SilencerRuleset::default();
        }
    };

    match serde_json::from_str(&contents) {
        Ok(ruleset) => ruleset,
        Err(err) => {
            let err = CoreError::InvalidSilencerRuleset(err.to_string());
            tracing::warn!(path = %path.display(), error = %err, "malformed silencer file, continuing with empty ruleset");
            SilencerRuleset::default()
        }
    }
}
