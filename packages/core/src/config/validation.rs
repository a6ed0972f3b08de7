//! Profile validation with actionable error messages
//!
//! Validates a profile and reports exactly which field to fix.

use super::schema::{Config, Profile};
use std::fmt;

/// A validation error with an actionable fix hint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The field that has an error
    pub field: String,
    /// Description of what's wrong
    pub message: String,
    /// What to change to fix the issue
    pub fix: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate a profile, stopping at the first error
pub fn validate_profile(profile: &Profile) -> Result<(), ValidationError> {
    let target = &profile.target;
    require_non_blank("target.zone", &target.zone, "\"zone\": \"europe-west1-b\"")?;
    require_non_blank("target.instance", &target.instance, "\"instance\": \"ops-vm\"")?;
    require_non_blank("target.project", &target.project, "\"project\": \"my-project\"")?;

    if target.instance.starts_with('-') {
        return Err(ValidationError {
            field: "target.instance".to_string(),
            message: "Instance name must not start with '-'".to_string(),
            fix: "Use the VM name as shown by 'gcloud compute instances list'".to_string(),
        });
    }

    if let Some(account) = profile.account.as_deref()
        && !account.contains('@')
    {
        return Err(ValidationError {
            field: "account".to_string(),
            message: format!("'{account}' is not an account email"),
            fix: "\"account\": \"you@example.com\" (or remove the field)".to_string(),
        });
    }

    if let Some(pkg) = profile.packages.iter().find(|p| !is_valid_package_name(p)) {
        return Err(ValidationError {
            field: "packages".to_string(),
            message: format!("'{pkg}' is not a valid package name"),
            fix: "Use Debian package names such as \"kubectl\"".to_string(),
        });
    }

    if let Some(shell) = profile.remote_shell.as_deref()
        && shell.trim().is_empty()
    {
        return Err(ValidationError {
            field: "remote_shell".to_string(),
            message: "remote_shell cannot be empty".to_string(),
            fix: "\"remote_shell\": \"/bin/bash\" (or remove the field)".to_string(),
        });
    }

    Ok(())
}

/// Validate the global configuration
pub fn validate_config(config: &Config) -> Result<(), ValidationError> {
    require_non_blank("gcloud_bin", &config.gcloud_bin, "\"gcloud_bin\": \"gcloud\"")?;
    require_non_blank(
        "launcher.python",
        &config.launcher.python,
        "\"python\": \"python\"",
    )?;
    if config.command_timeout_secs == Some(0) {
        return Err(ValidationError {
            field: "command_timeout_secs".to_string(),
            message: "command_timeout_secs must be > 0".to_string(),
            fix: "Remove the field to disable the timeout".to_string(),
        });
    }
    Ok(())
}

fn require_non_blank(field: &str, value: &str, example: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError {
            field: field.to_string(),
            message: format!("{field} cannot be empty"),
            fix: format!("Set {example}"),
        });
    }
    Ok(())
}

// Debian policy: lowercase alnum plus '+', '-', '.', at least two chars,
// starting with an alnum.
fn is_valid_package_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    if bytes.len() < 2 || !bytes[0].is_ascii_alphanumeric() {
        return false;
    }
    bytes
        .iter()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.'))
}
