//! Secure tunnel transport
//!
//! [`Transport`] is the seam between command construction and the process
//! that actually reaches the VM. Production code uses [`GcloudTransport`],
//! which wraps `gcloud compute ssh` (optionally through an IAP tunnel).

use super::error::RemoteError;
use super::handoff::replace_process;
use super::quote;
use crate::config::TargetIdentity;
use crate::process::{exit_code, wait_passing_interrupts};
use std::convert::Infallible;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Where the remote command's output goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Collect stdout/stderr; stdin is closed
    Capture,
    /// Share the caller's stdin/stdout/stderr
    Inherit,
}

/// One remote command line to run to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    /// Already-escaped shell line
    pub line: String,
    pub output: OutputMode,
    /// Force a remote pseudo-terminal (needed for prompts on the VM)
    pub tty: bool,
    pub timeout: Option<Duration>,
}

impl RunRequest {
    pub fn captured(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            output: OutputMode::Capture,
            tty: false,
            timeout: None,
        }
    }

    pub fn streamed(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            output: OutputMode::Inherit,
            tty: false,
            timeout: None,
        }
    }

    pub fn with_tty(mut self, tty: bool) -> Self {
        self.tty = tty;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Raw result of a transport run, before classification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// A way of reaching the target VM
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Run a command line remotely and wait for it
    ///
    /// Returns the raw exit code; only failures to start the local
    /// transport process are errors here.
    async fn run(
        &self,
        target: &TargetIdentity,
        request: &RunRequest,
    ) -> Result<RunOutput, RemoteError>;

    /// Replace the current process with an interactive session
    ///
    /// `line` runs instead of the login shell when given. Only returns if
    /// the handoff could not happen.
    fn attach(
        &self,
        target: &TargetIdentity,
        line: Option<&str>,
    ) -> Result<Infallible, RemoteError>;
}

/// `gcloud compute ssh` transport
#[derive(Debug, Clone)]
pub struct GcloudTransport {
    gcloud_bin: String,
}

impl Default for GcloudTransport {
    fn default() -> Self {
        Self::new("gcloud")
    }
}

impl GcloudTransport {
    pub fn new(gcloud_bin: impl Into<String>) -> Self {
        Self {
            gcloud_bin: gcloud_bin.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.gcloud_bin
    }

    /// Arguments for `gcloud` reaching `target`
    pub fn ssh_args(&self, target: &TargetIdentity, line: Option<&str>, tty: bool) -> Vec<String> {
        let mut args = vec![
            "compute".to_string(),
            "ssh".to_string(),
            target.instance.clone(),
            format!("--zone={}", target.zone),
            format!("--project={}", target.project),
        ];
        if target.tunnel_through_iap {
            args.push("--tunnel-through-iap".to_string());
        }
        if let Some(line) = line {
            args.push(format!("--command={line}"));
        }
        if tty {
            args.push("--ssh-flag=-t".to_string());
        }
        args
    }

    /// Copy-pasteable local command line, used for `--dry-run`
    pub fn describe(&self, target: &TargetIdentity, line: Option<&str>, tty: bool) -> String {
        let mut argv = vec![self.gcloud_bin.clone()];
        argv.extend(self.ssh_args(target, line, tty));
        quote::join(&argv)
    }

    fn connection_error(&self, target: &TargetIdentity, err: std::io::Error) -> RemoteError {
        let message = if err.kind() == std::io::ErrorKind::NotFound {
            format!("'{}' not found; install the Google Cloud CLI", self.gcloud_bin)
        } else {
            format!("failed to run '{}': {err}", self.gcloud_bin)
        };
        RemoteError::Connection {
            target: target.instance.clone(),
            message,
        }
    }
}

impl Transport for GcloudTransport {
    async fn run(
        &self,
        target: &TargetIdentity,
        request: &RunRequest,
    ) -> Result<RunOutput, RemoteError> {
        let args = self.ssh_args(target, Some(&request.line), request.tty);
        debug!(
            program = %self.gcloud_bin,
            instance = %target.instance,
            line = %request.line,
            "running remote command"
        );

        let mut cmd = Command::new(&self.gcloud_bin);
        cmd.args(&args).kill_on_drop(true);
        match request.output {
            OutputMode::Capture => {
                cmd.stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped());
            }
            OutputMode::Inherit => {
                cmd.stdin(Stdio::inherit())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit());
            }
        }

        let child = cmd
            .spawn()
            .map_err(|e| self.connection_error(target, e))?;
        let output = wait_passing_interrupts(child.wait_with_output(), request.timeout)
            .await
            .map_err(RemoteError::Timeout)?
            .map_err(|e| self.connection_error(target, e))?;

        let exit_code = exit_code(output.status);
        debug!(instance = %target.instance, exit_code, "remote command finished");
        Ok(RunOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn attach(
        &self,
        target: &TargetIdentity,
        line: Option<&str>,
    ) -> Result<Infallible, RemoteError> {
        // A custom command line gets no terminal from ssh unless asked.
        let args = self.ssh_args(target, line, line.is_some());
        debug!(
            program = %self.gcloud_bin,
            instance = %target.instance,
            "handing off to interactive session"
        );
        let mut cmd = std::process::Command::new(&self.gcloud_bin);
        cmd.args(&args);
        replace_process(cmd)
    }
}
