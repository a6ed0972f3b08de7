//! Config subcommand implementations
//!
//! Provides `opsdesk config` subcommands for viewing configuration.

mod show;

use anyhow::{Result, anyhow};
use clap::{Args, Subcommand};
use opsdesk_core::Config;
use opsdesk_core::config::paths;

pub use show::cmd_config_show;

/// Configuration command arguments
#[derive(Args)]
pub struct ConfigArgs {
    /// Output as JSON instead of table format
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Option<ConfigSubcommands>,
}

/// Configuration subcommands
#[derive(Subcommand)]
pub enum ConfigSubcommands {
    /// Show the effective configuration
    Show {
        /// Output as JSON instead of table format
        #[arg(long)]
        json: bool,
    },
    /// Print the config file path
    Path,
}

/// Handle config command
///
/// Routes to the appropriate handler based on the subcommand.
/// If no subcommand is given, defaults to Show.
pub fn cmd_config(args: ConfigArgs, config: &Config) -> Result<i32> {
    match args.command {
        Some(ConfigSubcommands::Show { json }) => cmd_config_show(config, json || args.json)?,
        Some(ConfigSubcommands::Path) => {
            let path = paths::get_config_path()
                .ok_or_else(|| anyhow!("Could not determine config path"))?;
            println!("{}", path.display());
        }
        None => cmd_config_show(config, args.json)?,
    }
    Ok(0)
}
