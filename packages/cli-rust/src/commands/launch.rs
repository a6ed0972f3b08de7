//! Launch command
//!
//! Starts the local operations app inside its virtual environment.

use super::CommandContext;
use crate::output::{format_launch_error, show_error};
use anyhow::Result;
use clap::Args;
use opsdesk_core::Launcher;
use std::path::PathBuf;

/// Arguments for the launch command
#[derive(Args, Default)]
pub struct LaunchArgs {
    /// Virtual environment directory (default from config: .venv)
    #[arg(long, value_name = "DIR")]
    pub venv: Option<PathBuf>,

    /// Application entrypoint (default from config: app.py)
    #[arg(long, value_name = "FILE")]
    pub entrypoint: Option<PathBuf>,

    /// Arguments passed to the application
    #[arg(last = true)]
    pub args: Vec<String>,
}

fn launcher_for(args: &LaunchArgs, ctx: &CommandContext) -> Launcher {
    let mut launcher = Launcher::from_config(&ctx.config.launcher);
    if let Some(venv) = &args.venv {
        launcher = launcher.with_venv_dir(venv);
    }
    if let Some(entrypoint) = &args.entrypoint {
        launcher = launcher.with_entrypoint(entrypoint);
    }
    launcher
}

/// Run the app and return its exit code
pub async fn cmd_launch(args: &LaunchArgs, ctx: &CommandContext) -> Result<i32> {
    match launcher_for(args, ctx).run(&args.args).await {
        Ok(code) => Ok(code),
        Err(e) => {
            show_error(&format_launch_error(&e));
            Ok(1)
        }
    }
}
