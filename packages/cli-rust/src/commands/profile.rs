//! Profile subcommands
//!
//! `opsdesk profile list` and `opsdesk profile show`.

use super::{CommandContext, config_failure};
use anyhow::Result;
use clap::{Args, Subcommand};
use comfy_table::{Cell, Color, Table};
use console::style;
use opsdesk_core::{Profile, ProfileSet};

/// Profile command arguments
#[derive(Args)]
pub struct ProfileArgs {
    #[command(subcommand)]
    command: Option<ProfileSubcommands>,
}

#[derive(Subcommand)]
pub enum ProfileSubcommands {
    /// List configured profiles
    List,
    /// Show one profile (default: the one that would be selected)
    Show {
        name: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Handle profile command; defaults to `list`
pub fn cmd_profile(args: ProfileArgs, ctx: &CommandContext) -> Result<i32> {
    let profiles = match ctx.profiles() {
        Ok(profiles) => profiles,
        Err(e) => return Ok(config_failure(&e)),
    };

    match args.command.unwrap_or(ProfileSubcommands::List) {
        ProfileSubcommands::List => {
            let selected = profiles
                .select(ctx.requested_profile.as_deref())
                .ok()
                .map(|(name, _)| name);
            println!("{}", list_table(&profiles, selected.as_deref()));
            Ok(0)
        }
        ProfileSubcommands::Show { name, json } => {
            let requested = name.as_deref().or(ctx.requested_profile.as_deref());
            let (name, profile) = match profiles.select(requested) {
                Ok(selected) => selected,
                Err(e) => return Ok(config_failure(&e)),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(profile)?);
            } else {
                show_profile(&name, profile);
            }
            Ok(0)
        }
    }
}

fn list_table(profiles: &ProfileSet, selected: Option<&str>) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["", "Name", "Instance", "Zone", "Project", "IAP"]);
    for (name, profile) in profiles.iter() {
        let marker = if selected == Some(name.as_str()) {
            Cell::new("*").fg(Color::Green)
        } else {
            Cell::new("")
        };
        let target = &profile.target;
        table.add_row(vec![
            marker,
            Cell::new(name),
            Cell::new(&target.instance),
            Cell::new(&target.zone),
            Cell::new(&target.project),
            Cell::new(if target.tunnel_through_iap { "yes" } else { "no" }),
        ]);
    }
    table
}

fn show_profile(name: &str, profile: &Profile) {
    let target = &profile.target;
    println!("{}", style(name).bold());
    if let Some(description) = &profile.description {
        println!("  {}", style(description).dim());
    }
    println!("  Instance: {}", target.instance);
    println!("  Zone:     {}", target.zone);
    println!("  Project:  {}", target.project);
    println!(
        "  IAP:      {}",
        if target.tunnel_through_iap { "yes" } else { "no" }
    );
    println!(
        "  Account:  {}",
        profile.account.as_deref().unwrap_or("(any)")
    );
    let packages = if profile.packages.is_empty() {
        "(none)".to_string()
    } else {
        profile.packages.join(", ")
    };
    println!("  Packages: {packages}");
    if let Some(shell) = &profile.remote_shell {
        println!("  Shell:    {shell}");
    }
}
