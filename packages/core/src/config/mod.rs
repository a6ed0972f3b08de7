//! Configuration management for opsdesk
//!
//! Handles loading the global config file and the per-VM profiles.
//! Both accept JSON with comments (JSONC).

pub mod paths;
pub mod profiles;
pub mod schema;
pub mod validation;

use jsonc_parser::ParseOptions;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub use profiles::{ProfileSet, load_profiles, slugify};
pub use schema::{Config, LauncherConfig, Profile, TargetIdentity};
pub use validation::{ValidationError, validate_config, validate_profile};

/// Environment variable selecting the active profile
pub const PROFILE_ENV: &str = "OPSDESK_ENV";

/// Errors from loading configuration and profiles
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine config directory (is HOME set?)")]
    NoConfigDir,

    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Invalid {}: {source}", .path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },

    #[error("No profiles found in {}", .dir.display())]
    NoProfiles { dir: PathBuf },

    #[error("Duplicate profile name '{name}' from {file}")]
    DuplicateProfile { name: String, file: String },

    #[error("Unknown profile '{requested}'. Available: {}", .available.join(", "))]
    UnknownProfile {
        requested: String,
        available: Vec<String>,
    },

    #[error("Several profiles configured; choose one with --profile or OPSDESK_ENV. Available: {}", .available.join(", "))]
    AmbiguousProfile { available: Vec<String> },
}

/// Load the config file at `path`, falling back to defaults when missing
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        debug!(path = %path.display(), "config file missing, using defaults");
        return Ok(Config::default());
    }
    let config: Config = read_jsonc(path)?;
    validate_config(&config).map_err(|source| ConfigError::Invalid {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(config)
}

/// Load the config from its standard location, or defaults if it doesn't exist
pub fn load_config_or_default() -> Result<Config, ConfigError> {
    let path = paths::get_config_path().ok_or(ConfigError::NoConfigDir)?;
    load_config_from(&path)
}

/// Read a JSONC file and deserialize it
pub(crate) fn read_jsonc<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_jsonc(&text).map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

fn parse_jsonc<T: DeserializeOwned>(text: &str) -> Result<T, String> {
    let value = jsonc_parser::parse_to_serde_value(text, &ParseOptions::default())
        .map_err(|e| e.to_string())?
        .ok_or_else(|| "file is empty".to_string())?;
    serde_json::from_value(value).map_err(|e| e.to_string())
}
