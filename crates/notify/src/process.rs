//! Spawns the notifier executable and drains its output.
//!
//! There is exactly one wire format here (spec §4.8's fixed positional
//! argv), so this is a concrete function rather than a `Notifier` trait with
//! multiple channel implementations — contrast with the teacher's `notify`
//! crate, which needs the trait because it routes to several channel kinds
//! (webhook/email/telegram).

use tokio::io::AsyncReadExt;
use tokio::process::Command;

use crate::error::DispatchError;

/// Outcome of one notifier invocation.
#[derive(Debug, Clone, Copy)]
pub struct ExecOutcome {
    /// Process exit code, or -1 if the process was killed by a signal.
    pub code: i32,
}

impl ExecOutcome {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Spawn `exec` with `argv`, drain its stdout to completion, and wait for
/// exit. Stdout content is discarded (spec §6: "Stdout is drained and
/// discarded").
pub async fn run_notifier(exec: &str, argv: &[String]) -> Result<ExecOutcome, DispatchError> {
    if exec.is_empty() {
        return Err(DispatchError::NoExecutable);
    }

    let mut child = Command::new(exec)
        .args(argv)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map_err(DispatchError::Spawn)?;

    if let Some(mut stdout) = child.stdout.take() {
        let mut sink = Vec::new();
        let _ = stdout.read_to_end(&mut sink).await;
    }

    let status = child.wait().await.map_err(DispatchError::Wait)?;
    Ok(ExecOutcome {
        code: status.code().unwrap_or(-1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_exec_is_rejected() {
        let err = run_notifier("", &[]).await.unwrap_err();
        assert!(matches!(err, DispatchError::NoExecutable));
    }

    #[tokio::test]
    async fn successful_exit_code_is_captured() {
        let outcome = run_notifier("/bin/true", &[]).await.unwrap();
        assert!(outcome.success());
        assert_eq!(outcome.code, 0);
    }

    #[tokio::test]
    async fn nonzero_exit_code_is_captured() {
        let outcome = run_notifier("/bin/false", &[]).await.unwrap();
        assert!(!outcome.success());
        assert_eq!(outcome.code, 1);
    }

    #[tokio::test]
    async fn stdout_is_drained_without_blocking() {
        let outcome = run_notifier("/bin/echo", &vec!["hello".to_string(); 4096])
            .await
            .unwrap();
        assert!(outcome.success());
    }

    #[tokio::test]
    async fn missing_executable_is_a_spawn_error() {
        let err = run_notifier("/no/such/notifier-binary", &[]).await.unwrap_err();
        assert!(matches!(err, DispatchError::Spawn(_)));
    }
}
