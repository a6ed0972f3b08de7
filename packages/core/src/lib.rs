//! opsdesk-core - Core library for opsdesk
//!
//! This library provides the shared functionality for the opsdesk CLI:
//! configuration and profile loading, remote command execution over a
//! `gcloud compute ssh` tunnel, idempotent VM bootstrap, and the local
//! application launcher.

pub mod config;
pub mod launcher;
mod process;
pub mod remote;

// Re-export commonly used types
pub use config::{
    Config, ConfigError, LauncherConfig, Profile, ProfileSet, TargetIdentity,
    load_config_or_default, load_profiles,
};
pub use launcher::{LaunchError, Launcher};
pub use process::exit_code;
pub use remote::{GcloudTransport, RemoteCommand, RemoteError, RemoteExecutor};

/// Get the version of the opsdesk-core library
pub fn get_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_version() {
        let version = get_version();
        assert!(!version.is_empty());
        assert!(version.contains('.'));
    }
}
