//! Remote execution error types

use std::time::Duration;
use thiserror::Error;

/// Exit code ssh uses for its own failures (connect, auth, host key)
pub const SSH_CONNECTION_FAILURE: i32 = 255;

/// Errors from running commands on the target VM
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The tunnel could not be established: network, auth or unreachable host
    #[error("Connection to {target} failed: {message}")]
    Connection { target: String, message: String },

    /// The remote command ran and exited non-zero
    ///
    /// `stderr` is only filled for captured runs; streamed runs already
    /// showed it on the terminal.
    #[error("Remote command exited with status {exit_code}{}", last_line(.stderr))]
    RemoteCommand { exit_code: i32, stderr: String },

    #[error("Remote command must have at least one argument")]
    EmptyCommand,

    #[error("Remote command timed out after {}", humanize(.0))]
    Timeout(Duration),

    /// A step needs a human at a terminal (device-flow login) but the run is
    /// non-interactive
    #[error("Step '{0}' needs manual intervention at an interactive terminal")]
    ManualInterventionRequired(String),

    /// A required bootstrap step's fix action failed
    #[error("Required step '{step}' failed: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: Box<RemoteError>,
    },

    /// Replacing the process with the interactive session failed
    #[error("Failed to start interactive session: {0}")]
    Handoff(#[source] std::io::Error),
}

impl RemoteError {
    /// Exit code the CLI should terminate with for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            RemoteError::RemoteCommand { exit_code, .. } => *exit_code,
            RemoteError::Connection { .. } => SSH_CONNECTION_FAILURE,
            RemoteError::Timeout(_) => 124,
            RemoteError::StepFailed { source, .. } => match source.as_ref() {
                RemoteError::RemoteCommand { .. } => 1,
                other => other.exit_code(),
            },
            _ => 1,
        }
    }

    pub fn is_connection(&self) -> bool {
        match self {
            RemoteError::Connection { .. } => true,
            RemoteError::StepFailed { source, .. } => source.is_connection(),
            _ => false,
        }
    }
}

fn last_line(stderr: &str) -> String {
    match stderr.lines().rev().map(str::trim).find(|l| !l.is_empty()) {
        Some(line) => format!(": {line}"),
        None => String::new(),
    }
}

fn humanize(d: &Duration) -> String {
    if d.subsec_millis() == 0 {
        format!("{}s", d.as_secs())
    } else {
        format!("{:.1}s", d.as_secs_f64())
    }
}
