//! Exec command
//!
//! Runs one command on the VM in the profile's project and mirrors its exit
//! code.

use super::{CommandContext, config_failure};
use crate::output::{format_remote_error, show_error};
use anyhow::Result;
use clap::Args;
use console::style;
use opsdesk_core::remote::{ExecMode, RemoteCommand, RemoteError, project_prefixed_line};
use std::time::Duration;
use tracing::debug;

/// Arguments for the exec command
#[derive(Args)]
pub struct ExecArgs {
    /// Command to run on the VM, with its arguments
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    pub command: Vec<String>,

    /// Kill the command after this long (e.g. 30s, 5m)
    #[arg(long, value_parser = humantime::parse_duration, conflicts_with = "tty")]
    pub timeout: Option<Duration>,

    /// Don't switch the VM's gcloud project before running
    #[arg(long)]
    pub no_project_prefix: bool,

    /// Give the command the terminal (for programs that prompt)
    #[arg(long)]
    pub tty: bool,

    /// Print the gcloud command instead of running it
    #[arg(long)]
    pub dry_run: bool,
}

/// The structured command from `args`
fn remote_command(args: &ExecArgs) -> Result<RemoteCommand, RemoteError> {
    let command = RemoteCommand::new(args.command.iter())?;
    Ok(if args.tty {
        command.interactive()
    } else {
        command
    })
}

/// Project switch plus command, unless `--no-project-prefix`
fn prefixed_line(args: &ExecArgs, project: &str, command: &RemoteCommand) -> Option<String> {
    (!args.no_project_prefix).then(|| project_prefixed_line(project, command))
}

/// Run a command remotely
///
/// A remote non-zero exit is passed through as-is; its stderr was already
/// streamed, so nothing more is printed.
pub async fn cmd_exec(args: &ExecArgs, ctx: &CommandContext) -> Result<i32> {
    let (_, profile) = match ctx.select_profile() {
        Ok(selected) => selected,
        Err(e) => return Ok(config_failure(&e)),
    };

    let command = match remote_command(args) {
        Ok(command) => command,
        Err(e) => {
            show_error(&format_remote_error(&e));
            return Ok(e.exit_code());
        }
    };
    let prefixed = prefixed_line(args, &profile.target.project, &command);
    let shown = prefixed.clone().unwrap_or_else(|| command.to_shell_line());

    if args.dry_run {
        let tty = command.mode() == ExecMode::Interactive;
        println!(
            "{}",
            ctx.transport().describe(&profile.target, Some(&shown), tty)
        );
        return Ok(0);
    }

    let timeout = ctx.timeout(args.timeout);
    debug!(line = %shown, ?timeout, "exec");
    if ctx.verbose > 0 && !ctx.quiet {
        eprintln!(
            "{} {}: {}",
            style("[info]").cyan(),
            profile.target.instance,
            style(&shown).dim()
        );
    }

    let executor = ctx.executor();
    let outcome = match prefixed {
        Some(line) => {
            executor
                .execute_line(&profile.target, line, command.mode(), timeout)
                .await
        }
        None => executor.execute(&profile.target, &command, timeout).await,
    };
    match outcome {
        Ok(result) => Ok(result.exit_code),
        Err(RemoteError::RemoteCommand { exit_code, .. }) => Ok(exit_code),
        Err(e) => {
            show_error(&format_remote_error(&e));
            Ok(e.exit_code())
        }
    }
}
