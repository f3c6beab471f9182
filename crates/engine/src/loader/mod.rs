//! On-disk rule-file loader (C11 supplement, spec §1's "Loading of alarm
//! rule files from disk" — out of scope for the evaluation core itself,
//! but a running daemon needs a concrete implementation of it).

pub mod core;
pub mod error;
pub mod schema;
pub mod watcher;

pub use self::core::{alarm_id_for, RuleLoader};
pub use error::{HealthError, LoadResult, LoadStatus};
pub use schema::{parse_duration, DelaySpec, RepeatSpec, RuleTemplate};
