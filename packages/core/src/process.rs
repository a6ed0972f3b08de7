//! Child process helpers shared by the tunnel transport and the launcher

use std::future::Future;
use std::process::{ExitStatus, Output};
use std::time::Duration;
use tracing::debug;

/// Wait for a child while letting Ctrl-C reach it
///
/// The child shares our process group, so the terminal delivers SIGINT to it
/// directly; we only need to survive the signal and keep waiting for its exit
/// status.
pub(crate) async fn wait_interruptible<F>(wait: F) -> std::io::Result<Output>
where
    F: Future<Output = std::io::Result<Output>>,
{
    tokio::pin!(wait);
    loop {
        tokio::select! {
            result = &mut wait => return result,
            signal = tokio::signal::ctrl_c() => {
                if signal.is_err() {
                    return wait.await;
                }
                debug!("interrupt received; waiting for child to exit");
            }
        }
    }
}

/// [`wait_interruptible`] with an optional deadline
///
/// Returns `Err(limit)` when `timeout` expires first, which drops (and, with
/// `kill_on_drop`, kills) the child.
pub(crate) async fn wait_passing_interrupts<F>(
    wait: F,
    timeout: Option<Duration>,
) -> Result<std::io::Result<Output>, Duration>
where
    F: Future<Output = std::io::Result<Output>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, wait_interruptible(wait))
            .await
            .map_err(|_| limit),
        None => Ok(wait_interruptible(wait).await),
    }
}

/// Exit code of a finished process; signals map to `128 + signo`
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tokio::process::Command;

    #[tokio::test]
    async fn exit_code_passes_through() {
        let output = Command::new("/bin/sh")
            .args(["-c", "exit 3"])
            .output()
            .await
            .unwrap();
        assert_eq!(exit_code(output.status), 3);
    }

    #[tokio::test]
    async fn signal_maps_to_128_plus_signo() {
        let output = Command::new("/bin/sh")
            .args(["-c", "kill -TERM $$"])
            .output()
            .await
            .unwrap();
        assert_eq!(exit_code(output.status), 128 + 15);
    }

    #[tokio::test]
    async fn wait_without_timeout_returns_output() {
        let child = Command::new("/bin/sh")
            .args(["-c", "echo hi"])
            .stdout(std::process::Stdio::piped())
            .spawn()
            .unwrap();
        let output = wait_passing_interrupts(child.wait_with_output(), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hi");
    }

    #[tokio::test]
    async fn expired_timeout_reports_limit() {
        let child = Command::new("/bin/sh")
            .args(["-c", "sleep 5"])
            .kill_on_drop(true)
            .spawn()
            .unwrap();
        let limit = Duration::from_millis(50);
        let result = wait_passing_interrupts(child.wait_with_output(), Some(limit)).await;
        assert_eq!(result.unwrap_err(), limit);
    }
}
