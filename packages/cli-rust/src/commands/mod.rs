//! CLI command implementations
//!
//! Each command returns the process exit code. Typed failures are rendered
//! through [`crate::output::errors`] here rather than bubbling up, so the
//! exit code can mirror the remote side.

mod attach;
mod config;
mod exec;
mod launch;
mod profile;

pub use attach::{AttachArgs, cmd_attach};
pub use config::{ConfigArgs, cmd_config};
pub use exec::{ExecArgs, cmd_exec};
pub use launch::{LaunchArgs, cmd_launch};
pub use profile::{ProfileArgs, cmd_profile};

use crate::output::{format_config_error, show_error};
use opsdesk_core::config::{ConfigError, paths};
use opsdesk_core::remote::RemoteExecutor;
use opsdesk_core::{Config, GcloudTransport, Profile, ProfileSet, load_profiles};
use std::time::Duration;
use tracing::debug;

/// Settings every command runs with
pub struct CommandContext {
    pub config: Config,
    /// `--profile` or `OPSDESK_ENV`
    pub requested_profile: Option<String>,
    /// A human can answer prompts
    pub interactive: bool,
    /// stdin is a terminal
    pub terminal: bool,
    pub quiet: bool,
    pub verbose: u8,
}

impl CommandContext {
    /// Load all profiles from the configured directory
    pub fn profiles(&self) -> Result<ProfileSet, ConfigError> {
        let dir = paths::get_profiles_dir(self.config.profiles_dir.as_ref())
            .ok_or(ConfigError::NoConfigDir)?;
        debug!(dir = %dir.display(), "loading profiles");
        load_profiles(&dir)
    }

    /// The profile this invocation targets
    pub fn select_profile(&self) -> Result<(String, Profile), ConfigError> {
        let profiles = self.profiles()?;
        let (name, profile) = profiles.select(self.requested_profile.as_deref())?;
        debug!(profile = %name, instance = %profile.target.instance, "selected profile");
        Ok((name, profile.clone()))
    }

    pub fn transport(&self) -> GcloudTransport {
        GcloudTransport::new(&self.config.gcloud_bin)
    }

    pub fn executor(&self) -> RemoteExecutor<GcloudTransport> {
        RemoteExecutor::new(self.transport()).with_terminal(self.terminal)
    }

    /// `--timeout` if given, else `command_timeout_secs` from config
    pub fn timeout(&self, flag: Option<Duration>) -> Option<Duration> {
        flag.or(self.config.command_timeout_secs.map(Duration::from_secs))
    }
}

/// Print a configuration error and return the exit code for it
pub(crate) fn config_failure(e: &ConfigError) -> i32 {
    show_error(&format_config_error(e));
    1
}
