use thiserror::Error;

/// Errors surfaced by core data-model operations. The bulk of this crate is
/// plain data and traits; most fallible work (file I/O, YAML parsing) lives
/// in the engine crate's `HealthError`, which wraps this where needed.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("malformed silencer ruleset: {0}")]
    InvalidSilencerRuleset(String),

    #[error("{0}")]
    Other(String),
}
