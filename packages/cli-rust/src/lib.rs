//! opsdesk CLI - Operator desk for a cloud VM
//!
//! This module contains the shared CLI implementation used by all binaries.

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::CommandContext;
use console::style;
use opsdesk_core::config::{self, PROFILE_ENV};
use opsdesk_core::{get_version, load_config_or_default};
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

/// Operator desk for a cloud VM
#[derive(Parser)]
#[command(name = "opsdesk")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Bootstrap and attach to an ops VM, run remote commands, launch the local app", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Increase verbosity level
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Profile to use (defaults to "default" or the only profile)
    #[arg(long, global = true, env = PROFILE_ENV)]
    profile: Option<String>,

    /// Never prompt; steps that need a human fail instead
    #[arg(long, global = true)]
    non_interactive: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Bootstrap the VM, then open an interactive shell on it
    #[command(visible_alias = "bootstrap-and-attach")]
    Attach(commands::AttachArgs),
    /// Run a command on the VM
    Exec(commands::ExecArgs),
    /// Run the local operations app in its virtual environment
    Launch(commands::LaunchArgs),
    /// Inspect profiles
    Profile(commands::ProfileArgs),
    /// Inspect configuration
    Config(commands::ConfigArgs),
}

/// Filter directive for the given flags; `RUST_LOG` takes precedence
fn log_directive(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_directive(verbose, quiet)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Configure color output
    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    init_tracing(cli.verbose, cli.quiet);

    let Some(command) = cli.command else {
        print_help_hint();
        return Ok(());
    };

    let config = match load_config_or_default() {
        Ok(config) => config,
        Err(e) => {
            output::show_error(&output::format_config_error(&e));
            std::process::exit(1);
        }
    };

    if cli.verbose > 0
        && let Some(path) = config::paths::get_config_path()
    {
        eprintln!(
            "{} Config: {}",
            style("[info]").cyan(),
            path.display()
        );
    }

    let terminal = std::io::stdin().is_terminal();
    let ctx = CommandContext {
        config,
        requested_profile: cli.profile,
        interactive: !cli.non_interactive && terminal,
        terminal,
        quiet: cli.quiet,
        verbose: cli.verbose,
    };

    let code = match command {
        Commands::Attach(args) => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(commands::cmd_attach(&args, &ctx))?
        }
        Commands::Exec(args) => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(commands::cmd_exec(&args, &ctx))?
        }
        Commands::Launch(args) => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(commands::cmd_launch(&args, &ctx))?
        }
        Commands::Profile(args) => commands::cmd_profile(args, &ctx)?,
        Commands::Config(args) => commands::cmd_config(args, &ctx.config)?,
    };

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

fn print_help_hint() {
    println!(
        "{} {}",
        style("opsdesk").cyan().bold(),
        style(get_version()).dim()
    );
    println!();
    println!("Run {} for available commands.", style("--help").green());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(log_directive(0, false), "warn");
        assert_eq!(log_directive(1, false), "info");
        assert_eq!(log_directive(3, false), "debug");
        assert_eq!(log_directive(2, true), "error");
    }

    #[test]
    fn bootstrap_and_attach_alias_parses() {
        let cli = Cli::try_parse_from(["opsdesk", "bootstrap-and-attach", "--skip-bootstrap"])
            .unwrap();
        match cli.command {
            Some(Commands::Attach(args)) => assert!(args.skip_bootstrap),
            _ => panic!("expected attach"),
        }
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::try_parse_from([
            "opsdesk",
            "exec",
            "--profile",
            "prod",
            "--non-interactive",
            "uptime",
        ])
        .unwrap();
        assert_eq!(cli.profile.as_deref(), Some("prod"));
        assert!(cli.non_interactive);
    }

    #[test]
    fn launch_passes_trailing_args() {
        let cli = Cli::try_parse_from(["opsdesk", "launch", "--", "--port", "8080"]).unwrap();
        match cli.command {
            Some(Commands::Launch(args)) => assert_eq!(args.args, vec!["--port", "8080"]),
            _ => panic!("expected launch"),
        }
    }
}
