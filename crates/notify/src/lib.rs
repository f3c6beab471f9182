//! Notifier process invocation.
//!
//! Spawns the configured notifier executable with the fixed positional
//! argument vector and reports back its exit status. No routing, no
//! templating, no channel selection — that all happens one layer up, in
//! the engine crate's dispatcher, which builds the argv this crate just
//! executes.

pub mod error;
pub mod process;

pub use error::DispatchError;
pub use process::{run_notifier, ExecOutcome};
