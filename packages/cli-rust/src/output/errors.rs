//! Centralized error formatting
//!
//! Turns the core library's typed errors into styled, actionable messages
//! for stderr.

use console::style;
use opsdesk_core::config::{ConfigError, PROFILE_ENV};
use opsdesk_core::{LaunchError, RemoteError};

/// Format remote execution errors with troubleshooting tips
pub fn format_remote_error(e: &RemoteError) -> String {
    match e {
        RemoteError::Connection { target, message } => render(
            &format!("Cannot reach {target}"),
            &[message.clone()],
            &[
                "Check that the VM is running: gcloud compute instances list".to_string(),
                "Check your local credentials: gcloud auth login".to_string(),
                "Through IAP your account needs the IAP-secured Tunnel User role".to_string(),
            ],
        ),
        RemoteError::RemoteCommand { exit_code, stderr } => render(
            &format!("Remote command exited with status {exit_code}"),
            &stderr_tail(stderr),
            &[],
        ),
        RemoteError::EmptyCommand => render(
            "Nothing to run",
            &[],
            &["Pass the remote command after 'exec': opsdesk exec -- kubectl get pods".to_string()],
        ),
        RemoteError::Timeout(_) => render(
            &e.to_string(),
            &[],
            &[
                "Raise the limit with --timeout, or set command_timeout_secs in config.json"
                    .to_string(),
            ],
        ),
        RemoteError::ManualInterventionRequired(step) => render(
            &format!("Step '{step}' needs you at a terminal"),
            &["Signing in on the VM uses a device code that must be entered in a browser."
                .to_string()],
            &[
                "Run 'opsdesk attach' from an interactive terminal without --non-interactive"
                    .to_string(),
                "Or sign in on the VM yourself: gcloud auth login --no-launch-browser".to_string(),
            ],
        ),
        RemoteError::StepFailed { step, source } => {
            let mut tips = Vec::new();
            if source.is_connection() {
                tips.push("Check your local credentials: gcloud auth login".to_string());
            } else {
                tips.push("Re-run with -vv to see the remote commands".to_string());
            }
            render(
                &format!("Bootstrap step '{step}' failed"),
                &[source.to_string()],
                &tips,
            )
        }
        RemoteError::Handoff(err) => render(
            "Could not start the interactive session",
            &[err.to_string()],
            &["Check that gcloud is installed and on PATH".to_string()],
        ),
    }
}

/// Format configuration and profile errors
pub fn format_config_error(e: &ConfigError) -> String {
    match e {
        ConfigError::Invalid { path, source } => render(
            "Invalid configuration",
            &[
                format!("{}: {}", source.field, source.message),
                format!("File: {}", style(path.display()).yellow()),
            ],
            &[format!("Fix: {}", source.fix)],
        ),
        ConfigError::Parse { path, message } => render(
            "Configuration error",
            &[
                message.clone(),
                format!("File: {}", style(path.display()).yellow()),
            ],
            &["Check the file for syntax errors or unknown fields.".to_string()],
        ),
        ConfigError::NoProfiles { dir } => render(
            "No profiles configured",
            &[format!("Looked in {}", style(dir.display()).yellow())],
            &[format!(
                "Create {} with: {}",
                dir.join("default.json").display(),
                r#"{"target": {"zone": "...", "instance": "...", "project": "..."}}"#
            )],
        ),
        ConfigError::UnknownProfile {
            requested,
            available,
        } => render(
            &format!("Unknown profile '{requested}'"),
            &[format!("Available: {}", available.join(", "))],
            &["List profiles with: opsdesk profile list".to_string()],
        ),
        ConfigError::AmbiguousProfile { available } => render(
            "Several profiles configured and none is named 'default'",
            &[format!("Available: {}", available.join(", "))],
            &[format!("Choose one with --profile <name> or {PROFILE_ENV}=<name>")],
        ),
        _ => render(&e.to_string(), &[], &[]),
    }
}

/// Format launcher errors, including setup remediation
pub fn format_launch_error(e: &LaunchError) -> String {
    match e.remediation() {
        Some([first, second]) => render(
            "Local setup is incomplete",
            &[e.to_string()],
            &[first, second],
        ),
        None => render(&e.to_string(), &[], &[]),
    }
}

/// Show a formatted error on stderr
///
/// Prints a blank line before the error message for visual separation.
pub fn show_error(msg: &str) {
    eprintln!();
    eprintln!("{msg}");
}

fn render(headline: &str, details: &[String], tips: &[String]) -> String {
    let mut out = format!("{} {}", style("Error:").red().bold(), style(headline).bold());
    if !details.is_empty() {
        out.push('\n');
        for detail in details {
            out.push_str(&format!("\n  {detail}"));
        }
    }
    if !tips.is_empty() {
        out.push('\n');
        for tip in tips {
            out.push_str(&format!("\n  {} {tip}", style("Tip:").cyan()));
        }
    }
    out
}

/// Last few non-empty lines of captured stderr
fn stderr_tail(stderr: &str) -> Vec<String> {
    let lines: Vec<_> = stderr
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty())
        .collect();
    let start = lines.len().saturating_sub(5);
    lines[start..].iter().map(|l| l.to_string()).collect()
}
