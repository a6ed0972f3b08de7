//! POSIX shell quoting for remote command lines
//!
//! ssh hands the remote side a single string which the login shell splits
//! again, so every token is escaped individually before joining. The output
//! of [`join`] parsed by `sh` yields exactly the input tokens.

use super::error::RemoteError;

/// Execution mode for a remote command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    /// Run to completion and report the exit status
    OneShot,
    /// Take over the terminal; the calling process does not continue
    Interactive,
}

/// A remote command as a structured argument list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCommand {
    argv: Vec<String>,
    mode: ExecMode,
}

impl RemoteCommand {
    /// Build a one-shot command; fails when `argv` is empty
    pub fn new<I, S>(argv: I) -> Result<Self, RemoteError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
        if argv.is_empty() {
            return Err(RemoteError::EmptyCommand);
        }
        Ok(Self {
            argv,
            mode: ExecMode::OneShot,
        })
    }

    pub fn interactive(mut self) -> Self {
        self.mode = ExecMode::Interactive;
        self
    }

    pub fn mode(&self) -> ExecMode {
        self.mode
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// The escaped single-line form sent to the remote shell
    pub fn to_shell_line(&self) -> String {
        join(&self.argv)
    }
}

/// Quote one token for a POSIX shell
///
/// Tokens made only of characters with no special meaning are returned
/// unchanged; anything else is single-quoted with embedded `'` written as
/// `'\''`.
pub fn quote(token: &str) -> String {
    if token.is_empty() {
        return "''".to_string();
    }
    if token.bytes().all(is_safe_byte) {
        return token.to_string();
    }
    format!("'{}'", token.replace('\'', r"'\''"))
}

/// Quote every token and join them with single spaces
pub fn join<S: AsRef<str>>(tokens: &[S]) -> String {
    tokens
        .iter()
        .map(|t| quote(t.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_safe_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(b, b'_' | b'-' | b'.' | b'/' | b'=' | b':' | b',' | b'+' | b'@' | b'%')
}
