//! Alarm evaluation engine: the rule registry, the per-iteration
//! collect/evaluate/dispatch passes, and the on-disk rule loader that feeds
//! it.

pub mod dispatcher;
pub mod event_log;
pub mod gate;
pub mod host;
pub mod loader;
pub mod main_loop;
pub mod reload;
pub mod repeat;
pub mod silencer_file;
pub mod silencer_policy;
pub mod state_machine;

pub use dispatcher::log_process;
pub use event_log::EventLog;
pub use gate::evaluate_runnable;
pub use host::Host;
pub use loader::{HealthError, RuleLoader};
pub use main_loop::MainLoop;
pub use reload::reload;
pub use repeat::emit_repeats;
pub use silencer_file::load_silencer_ruleset;
pub use silencer_policy::{check_silenced, update_disabled_silenced};
pub use state_machine::{apply_hysteresis, derive_status, value_to_status, ValueStatus};
