//! Process handoff to an interactive session
//!
//! After a successful handoff no code of the calling process runs again, so
//! callers must finish all cleanup (spinners, log flushing) beforehand.

use super::error::RemoteError;
use std::convert::Infallible;
use std::process::Command;

/// Replace the current process image with `cmd`
///
/// On Unix this is `execvp`: the new process inherits the controlling
/// terminal and stdio directly. Elsewhere the command is spawned, waited on,
/// and this process exits with the child's exit code.
pub fn replace_process(cmd: Command) -> Result<Infallible, RemoteError> {
    exec_or_wait(cmd)
}

#[cfg(unix)]
fn exec_or_wait(mut cmd: Command) -> Result<Infallible, RemoteError> {
    use std::os::unix::process::CommandExt;

    // exec() only returns on error
    let err = cmd.exec();
    Err(RemoteError::Handoff(err))
}

#[cfg(not(unix))]
fn exec_or_wait(mut cmd: Command) -> Result<Infallible, RemoteError> {
    let status = cmd.status().map_err(RemoteError::Handoff)?;
    std::process::exit(crate::process::exit_code(status))
}
