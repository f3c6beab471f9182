use thiserror::Error;

/// Failures spawning or waiting on the notifier child process.
///
/// Per spec §7: a spawn failure is logged and the event still gets `ExecRun`
/// set (the attempt was made) but not `ExecFailed` (the process never
/// reached an exit code). Callers decide how to record that distinction;
/// this type only reports what happened.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("no notifier executable configured")]
    NoExecutable,

    #[error("failed to spawn notifier: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("failed waiting on notifier: {0}")]
    Wait(#[source] std::io::Error),
}
