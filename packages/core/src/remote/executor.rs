//! Remote command executor
//!
//! Turns transport exit codes into typed results: 255 (ssh's own failure)
//! is a connection error, any other non-zero code is the remote command's
//! failure and is surfaced as-is.
//!
//! When the caller sits at a terminal, streamed one-shot runs ask for a
//! remote pty so Ctrl-C reaches the remote process instead of killing the
//! local ssh.

use super::error::{RemoteError, SSH_CONNECTION_FAILURE};
use super::quote::{self, ExecMode, RemoteCommand};
use super::transport::{RunOutput, RunRequest, Transport};
use crate::config::TargetIdentity;
use std::convert::Infallible;
use std::time::Duration;

/// Successful remote run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub exit_code: i32,
    /// Empty when output was streamed to the terminal
    pub stdout: String,
}

impl ExecutionResult {
    /// First non-empty line of stdout, trimmed
    pub fn first_line(&self) -> Option<&str> {
        self.stdout.lines().map(str::trim).find(|l| !l.is_empty())
    }
}

/// Runs commands on a target through a [`Transport`]
#[derive(Debug, Clone)]
pub struct RemoteExecutor<T> {
    transport: T,
    terminal: bool,
}

impl<T: Transport> RemoteExecutor<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            terminal: false,
        }
    }

    /// Whether our stdin is a terminal the remote side may take over
    pub fn with_terminal(mut self, terminal: bool) -> Self {
        self.terminal = terminal;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Execute a structured command
    ///
    /// One-shot commands stream their output and return the exit status.
    /// Interactive commands hand the process over and only return on error.
    pub async fn execute(
        &self,
        target: &TargetIdentity,
        command: &RemoteCommand,
        timeout: Option<Duration>,
    ) -> Result<ExecutionResult, RemoteError> {
        self.execute_line(target, command.to_shell_line(), command.mode(), timeout)
            .await
    }

    /// [`execute`](Self::execute) for a line that is already escaped
    pub async fn execute_line(
        &self,
        target: &TargetIdentity,
        line: String,
        mode: ExecMode,
        timeout: Option<Duration>,
    ) -> Result<ExecutionResult, RemoteError> {
        match mode {
            ExecMode::OneShot => {
                let request = RunRequest::streamed(line)
                    .with_tty(self.terminal)
                    .with_timeout(timeout);
                self.run(target, &request).await
            }
            ExecMode::Interactive => match self.handoff(target, Some(&line)) {
                Err(e) => Err(e),
                Ok(never) => match never {},
            },
        }
    }

    /// Run a cheap read-only query and capture its stdout
    pub async fn query(
        &self,
        target: &TargetIdentity,
        line: &str,
    ) -> Result<ExecutionResult, RemoteError> {
        self.run(target, &RunRequest::captured(line)).await
    }

    /// Run a prepared request and classify its exit code
    pub async fn run(
        &self,
        target: &TargetIdentity,
        request: &RunRequest,
    ) -> Result<ExecutionResult, RemoteError> {
        let output = self.transport.run(target, request).await?;
        classify(target, output)
    }

    /// Replace this process with an interactive session on `target`
    pub fn handoff(
        &self,
        target: &TargetIdentity,
        line: Option<&str>,
    ) -> Result<Infallible, RemoteError> {
        self.transport.attach(target, line)
    }
}

fn classify(target: &TargetIdentity, output: RunOutput) -> Result<ExecutionResult, RemoteError> {
    match output.exit_code {
        0 => Ok(ExecutionResult {
            exit_code: 0,
            stdout: output.stdout,
        }),
        SSH_CONNECTION_FAILURE => {
            let detail = output
                .stderr
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .last()
                .unwrap_or("ssh exited with status 255")
                .to_string();
            Err(RemoteError::Connection {
                target: target.instance.clone(),
                message: detail,
            })
        }
        exit_code => Err(RemoteError::RemoteCommand {
            exit_code,
            stderr: output.stderr,
        }),
    }
}

/// Remote line for `exec`: switch the active project, then run `command`
pub fn project_prefixed_line(project: &str, command: &RemoteCommand) -> String {
    format!(
        "{} && {}",
        quote::join(&[
            "gcloud",
            "config",
            "set",
            "project",
            project,
            "--verbosity=error"
        ]),
        command.to_shell_line()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Transport returning canned outputs and recording requests
    struct Canned {
        output: RunOutput,
        requests: Mutex<Vec<RunRequest>>,
        attached: Mutex<Vec<Option<String>>>,
    }

    impl Canned {
        fn new(exit_code: i32, stdout: &str, stderr: &str) -> Self {
            Self {
                output: RunOutput {
                    exit_code,
                    stdout: stdout.to_string(),
                    stderr: stderr.to_string(),
                },
                requests: Mutex::new(Vec::new()),
                attached: Mutex::new(Vec::new()),
            }
        }
    }

    impl Transport for Canned {
        async fn run(
            &self,
            _target: &TargetIdentity,
            request: &RunRequest,
        ) -> Result<RunOutput, RemoteError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(self.output.clone())
        }

        fn attach(
            &self,
            _target: &TargetIdentity,
            line: Option<&str>,
        ) -> Result<Infallible, RemoteError> {
            self.attached.lock().unwrap().push(line.map(str::to_string));
            Err(RemoteError::Handoff(std::io::Error::other("test transport")))
        }
    }

    fn target() -> TargetIdentity {
        TargetIdentity::new("europe-west1-b", "ops-vm", "acme-ops")
    }

    #[tokio::test]
    async fn success_returns_stdout() {
        let executor = RemoteExecutor::new(Canned::new(0, "acme-ops\n", ""));
        let result = executor
            .query(&target(), "gcloud config get-value project")
            .await
            .unwrap();
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.first_line(), Some("acme-ops"));
    }

    #[tokio::test]
    async fn exit_255_is_a_connection_error() {
        let executor = RemoteExecutor::new(Canned::new(
            255,
            "",
            "ERROR: (gcloud.compute.start-iap-tunnel) Error while connecting [4003: 'failed to connect to backend'].\n",
        ));
        let err = executor.query(&target(), "true").await.unwrap_err();
        match err {
            RemoteError::Connection { target, message } => {
                assert_eq!(target, "ops-vm");
                assert!(message.contains("failed to connect to backend"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn other_non_zero_is_a_remote_command_error() {
        let executor = RemoteExecutor::new(Canned::new(2, "", ""));
        let cmd = RemoteCommand::new(["ls", "/missing"]).unwrap();
        let err = executor.execute(&target(), &cmd, None).await.unwrap_err();
        assert!(matches!(
            err,
            RemoteError::RemoteCommand { exit_code: 2, .. }
        ));
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn one_shot_streams_with_timeout() {
        let executor = RemoteExecutor::new(Canned::new(0, "", ""));
        let cmd = RemoteCommand::new(["echo", "a b"]).unwrap();
        executor
            .execute(&target(), &cmd, Some(Duration::from_secs(5)))
            .await
            .unwrap();
        let requests = executor.transport().requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].line, "echo 'a b'");
        assert_eq!(requests[0].timeout, Some(Duration::from_secs(5)));
        assert_eq!(
            requests[0].output,
            crate::remote::transport::OutputMode::Inherit
        );
        assert!(!requests[0].tty);
    }

    #[tokio::test]
    async fn one_shot_at_a_terminal_gets_a_remote_pty() {
        let executor = RemoteExecutor::new(Canned::new(0, "", "")).with_terminal(true);
        let cmd = RemoteCommand::new(["kubectl", "logs", "-f", "api"]).unwrap();
        executor.execute(&target(), &cmd, None).await.unwrap();
        executor
            .query(&target(), "gcloud config get-value project")
            .await
            .unwrap();

        let requests = executor.transport().requests.lock().unwrap();
        assert!(requests[0].tty);
        // Captured queries never take the terminal.
        assert!(!requests[1].tty);
    }

    #[tokio::test]
    async fn interactive_command_hands_off() {
        let executor = RemoteExecutor::new(Canned::new(0, "", ""));
        let cmd = RemoteCommand::new(["htop"]).unwrap().interactive();
        let err = executor.execute(&target(), &cmd, None).await.unwrap_err();
        assert!(matches!(err, RemoteError::Handoff(_)));
        assert!(executor.transport().requests.lock().unwrap().is_empty());
        assert_eq!(
            *executor.transport().attached.lock().unwrap(),
            vec![Some("htop".to_string())]
        );
    }

    #[tokio::test]
    async fn prefixed_line_is_sent_unchanged() {
        let executor = RemoteExecutor::new(Canned::new(0, "", ""));
        let cmd = RemoteCommand::new(["kubectl", "get", "pods"]).unwrap();
        let line = project_prefixed_line("acme-ops", &cmd);
        executor
            .execute_line(&target(), line.clone(), cmd.mode(), None)
            .await
            .unwrap();
        assert_eq!(executor.transport().requests.lock().unwrap()[0].line, line);
    }

    #[test]
    fn kubectl_line_is_preceded_by_project_switch() {
        let cmd = RemoteCommand::new(["kubectl", "get", "pods", "-A"]).unwrap();
        let line = project_prefixed_line("acme-ops", &cmd);
        assert_eq!(
            line,
            "gcloud config set project acme-ops --verbosity=error && kubectl get pods -A"
        );
    }

    #[test]
    fn project_is_quoted_in_prefix() {
        let cmd = RemoteCommand::new(["true"]).unwrap();
        let line = project_prefixed_line("x; rm -rf /", &cmd);
        assert!(line.starts_with("gcloud config set project 'x; rm -rf /' "));
    }
}
