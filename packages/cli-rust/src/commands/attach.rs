//! Attach command
//!
//! Bootstraps the selected profile's VM (auth, project, packages) and then
//! replaces this process with an interactive shell on it.

use super::{CommandContext, config_failure};
use crate::output::{CommandSpinner, format_remote_error, outcome_style, show_error};
use anyhow::Result;
use clap::Args;
use console::style;
use dialoguer::Confirm;
use opsdesk_core::Profile;
use opsdesk_core::remote::{
    AttachOptions, BootstrapObserver, BootstrapReport, BootstrapStep, StepOutcome, StepReport,
    bootstrap_and_attach, plan_for_profile, session_line,
};
use std::cell::RefCell;

/// Arguments for the attach command
#[derive(Args, Default)]
pub struct AttachArgs {
    /// Skip the bootstrap checks and connect straight away
    #[arg(long)]
    pub skip_bootstrap: bool,

    /// Print the gcloud commands instead of running them
    #[arg(long)]
    pub dry_run: bool,
}

/// Bootstrap the VM and hand the terminal over to a remote shell
///
/// Only returns when something failed before the handoff; the exit code is
/// then the failure's. After a successful handoff the remote session owns
/// the process and its exit code.
pub async fn cmd_attach(args: &AttachArgs, ctx: &CommandContext) -> Result<i32> {
    let (name, profile) = match ctx.select_profile() {
        Ok(selected) => selected,
        Err(e) => return Ok(config_failure(&e)),
    };

    if args.dry_run {
        return print_dry_run(ctx, &profile, args.skip_bootstrap);
    }

    if !ctx.quiet {
        eprintln!(
            "{} {} ({} in {})",
            style("Profile:").cyan(),
            style(&name).bold(),
            profile.target.instance,
            profile.target.zone
        );
    }

    let executor = ctx.executor();
    let observer = StepObserver::new(ctx.quiet);
    let options = AttachOptions {
        interactive: ctx.interactive,
        skip_bootstrap: args.skip_bootstrap,
    };

    let result = bootstrap_and_attach(&executor, &profile, options, &observer, |report| {
        observer.clear();
        if !ctx.quiet {
            print_summary(report);
            eprintln!(
                "{} Connecting to {}...",
                style("→").cyan(),
                style(&profile.target.instance).bold()
            );
        }
    })
    .await;

    match result {
        Ok(never) => match never {},
        Err(e) => {
            observer.fail("Bootstrap stopped");
            show_error(&format_remote_error(&e));
            Ok(e.exit_code())
        }
    }
}

fn print_dry_run(ctx: &CommandContext, profile: &Profile, skip_bootstrap: bool) -> Result<i32> {
    let transport = ctx.transport();
    let target = &profile.target;

    if !skip_bootstrap {
        let steps = match plan_for_profile(profile) {
            Ok(steps) => steps,
            Err(e) => {
                show_error(&format_remote_error(&e));
                return Ok(e.exit_code());
            }
        };
        for step in &steps {
            println!("# {} (check)", step.name);
            println!("{}", transport.describe(target, Some(&step.query), false));
            println!("# {} (fix, only if the check does not match)", step.name);
            let fix = step.fix.to_shell_line();
            println!(
                "{}",
                transport.describe(target, Some(&fix), step.needs_terminal)
            );
        }
    }

    let line = session_line(profile);
    println!("# session");
    println!(
        "{}",
        transport.describe(target, line.as_deref(), line.is_some())
    );
    Ok(0)
}

fn print_summary(report: &BootstrapReport) {
    let applied = report.applied();
    let failures: Vec<_> = report.failures().collect();
    if applied == 0 && failures.is_empty() {
        return;
    }
    eprintln!(
        "{} {} step(s) applied, {} warning(s)",
        style("Bootstrap:").cyan(),
        applied,
        failures.len()
    );
    for (step, reason) in failures {
        eprintln!("  {} {step}: {reason}", style("Warning:").yellow());
    }
}

/// Shows a spinner per step and asks before device-flow logins
struct StepObserver {
    quiet: bool,
    current: RefCell<Option<CommandSpinner>>,
}

impl StepObserver {
    fn new(quiet: bool) -> Self {
        Self {
            quiet,
            current: RefCell::new(None),
        }
    }

    /// Drop the active spinner, if any, without a status line
    fn clear(&self) {
        if let Some(spinner) = self.current.borrow_mut().take() {
            spinner.clear();
        }
    }

    /// Mark the active spinner, if any, as failed
    fn fail(&self, message: &str) {
        if let Some(spinner) = self.current.borrow_mut().take() {
            spinner.fail(message);
        }
    }

    fn start(&self, message: &str) {
        self.clear();
        *self.current.borrow_mut() = Some(CommandSpinner::new_maybe(message, self.quiet));
    }
}

impl BootstrapObserver for StepObserver {
    fn checking(&self, step: &BootstrapStep) {
        self.start(&format!("Checking {}...", step.name));
    }

    fn applying(&self, step: &BootstrapStep) {
        if step.needs_terminal {
            // The fix talks to the user directly.
            self.clear();
            return;
        }
        if let Some(spinner) = self.current.borrow().as_ref() {
            spinner.update(&format!("Applying {}...", step.name));
        }
    }

    fn confirm_manual_step(&self, step: &BootstrapStep) -> bool {
        self.clear();
        eprintln!(
            "{} Step '{}' needs you: the VM will print a sign-in URL and ask for the code shown in your browser.",
            style("Note:").cyan(),
            step.name
        );
        Confirm::new()
            .with_prompt("Sign in now?")
            .default(true)
            .interact()
            .unwrap_or(false)
    }

    fn finished(&self, report: &StepReport) {
        let spinner = self
            .current
            .borrow_mut()
            .take()
            .unwrap_or_else(|| CommandSpinner::new_maybe(&report.name, self.quiet));
        let label = outcome_style(&report.outcome);
        match &report.outcome {
            StepOutcome::Failed(reason) => {
                spinner.warn(&format!("{} {label}: {reason}", report.name));
            }
            _ => spinner.success(&format!("{} {label}", report.name)),
        }
    }
}
