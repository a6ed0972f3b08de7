//! Configuration schema for opsdesk
//!
//! Defines the structure and defaults for the global config.json file and
//! for the per-VM profile files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure for opsdesk
///
/// Serialized to/from `~/.config/opsdesk/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Config file version for migrations
    pub version: u32,

    /// gcloud executable used for the tunnel and for auth (default: "gcloud")
    #[serde(default = "default_gcloud_bin")]
    pub gcloud_bin: String,

    /// Directory holding profile files (default: `<config dir>/profiles`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profiles_dir: Option<PathBuf>,

    /// Default timeout for `exec`, in seconds (default: none)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_timeout_secs: Option<u64>,

    /// Local launcher settings
    #[serde(default)]
    pub launcher: LauncherConfig,
}

/// Settings for the local `launch` command
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LauncherConfig {
    /// Virtual environment directory, relative to the working directory
    #[serde(default = "default_venv_dir")]
    pub venv_dir: PathBuf,

    /// Application entrypoint run inside the environment
    #[serde(default = "default_entrypoint")]
    pub entrypoint: PathBuf,

    /// Interpreter name inside `<venv>/bin`
    #[serde(default = "default_python")]
    pub python: String,
}

/// Target VM identity
///
/// Immutable for the lifetime of a command; every remote operation is
/// addressed to exactly one of these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TargetIdentity {
    /// Compute zone (e.g. "europe-west1-b")
    pub zone: String,
    /// VM instance name
    pub instance: String,
    /// Cloud project identifier
    pub project: String,
    /// Route the SSH connection through an IAP tunnel (default: true)
    #[serde(default = "default_tunnel_through_iap")]
    pub tunnel_through_iap: bool,
}

/// A named VM profile, loaded from `<profiles_dir>/<name>.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    /// Display name; the file stem is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Short description shown by `profile show`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// The VM to operate on
    pub target: TargetIdentity,

    /// Account expected to be active on the VM; any active account is
    /// accepted when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,

    /// System packages installed on a best-effort basis during bootstrap
    #[serde(default = "default_packages")]
    pub packages: Vec<String>,

    /// Login shell started by `attach` instead of the account default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_shell: Option<String>,
}

fn default_gcloud_bin() -> String {
    "gcloud".to_string()
}

fn default_venv_dir() -> PathBuf {
    PathBuf::from(".venv")
}

fn default_entrypoint() -> PathBuf {
    PathBuf::from("app.py")
}

fn default_python() -> String {
    "python".to_string()
}

fn default_tunnel_through_iap() -> bool {
    true
}

fn default_packages() -> Vec<String> {
    vec![
        "kubectl".to_string(),
        "google-cloud-cli-gke-gcloud-auth-plugin".to_string(),
    ]
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            venv_dir: default_venv_dir(),
            entrypoint: default_entrypoint(),
            python: default_python(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: 1,
            gcloud_bin: default_gcloud_bin(),
            profiles_dir: None,
            command_timeout_secs: None,
            launcher: LauncherConfig::default(),
        }
    }
}

impl Config {
    /// Create a new Config with default values
    pub fn new() -> Self {
        Self::default()
    }
}

impl TargetIdentity {
    pub fn new(
        zone: impl Into<String>,
        instance: impl Into<String>,
        project: impl Into<String>,
    ) -> Self {
        Self {
            zone: zone.into(),
            instance: instance.into(),
            project: project.into(),
            tunnel_through_iap: true,
        }
    }

    /// Disable the IAP tunnel (direct connection to the external IP)
    pub fn without_iap(mut self) -> Self {
        self.tunnel_through_iap = false;
        self
    }
}

impl Profile {
    pub fn new(target: TargetIdentity) -> Self {
        Self {
            name: None,
            description: None,
            target,
            account: None,
            packages: default_packages(),
            remote_shell: None,
        }
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    pub fn with_packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.packages = packages.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, 1);
        assert_eq!(config.gcloud_bin, "gcloud");
        assert!(config.profiles_dir.is_none());
        assert!(config.command_timeout_secs.is_none());
        assert_eq!(config.launcher.venv_dir, PathBuf::from(".venv"));
        assert_eq!(config.launcher.entrypoint, PathBuf::from("app.py"));
        assert_eq!(config.launcher.python, "python");
    }

    #[test]
    fn test_deserialize_with_missing_optional_fields() {
        let json = r#"{"version": 1}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_launcher_section_keeps_defaults() {
        let json = r#"{"version": 1, "launcher": {"entrypoint": "main.py"}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.launcher.entrypoint, PathBuf::from("main.py"));
        assert_eq!(config.launcher.venv_dir, PathBuf::from(".venv"));
    }

    #[test]
    fn test_reject_unknown_fields() {
        let json = r#"{"version": 1, "unknown_field": "value"}"#;
        let result: Result<Config, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_profile_defaults() {
        let json = r#"{
            "target": {"zone": "europe-west1-b", "instance": "ops-vm", "project": "acme-ops"}
        }"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert!(profile.target.tunnel_through_iap);
        assert!(profile.account.is_none());
        assert_eq!(profile.packages, default_packages());
    }

    #[test]
    fn test_profile_empty_packages_is_respected() {
        let json = r#"{
            "target": {"zone": "z", "instance": "i", "project": "p", "tunnel_through_iap": false},
            "packages": []
        }"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert!(!profile.target.tunnel_through_iap);
        assert!(profile.packages.is_empty());
    }
}
