//! Filesystem locations for opsdesk configuration

use directories::ProjectDirs;
use std::path::PathBuf;

/// Overrides the config file location
pub const CONFIG_PATH_ENV: &str = "OPSDESK_CONFIG";

/// Overrides the profiles directory
pub const PROFILES_DIR_ENV: &str = "OPSDESK_PROFILES_DIR";

const CONFIG_FILE_NAME: &str = "config.json";
const PROFILES_DIR_NAME: &str = "profiles";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "opsdesk")
}

/// Get the configuration directory (e.g. `~/.config/opsdesk` on Linux)
pub fn get_config_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the config file path
///
/// `OPSDESK_CONFIG` wins when set to a non-empty value.
pub fn get_config_path() -> Option<PathBuf> {
    if let Some(path) = env_path(CONFIG_PATH_ENV) {
        return Some(path);
    }
    get_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Get the profiles directory
///
/// Resolution order:
/// 1. `OPSDESK_PROFILES_DIR`
/// 2. `profiles_dir` from config.json
/// 3. `<config dir>/profiles`
pub fn get_profiles_dir(configured: Option<&PathBuf>) -> Option<PathBuf> {
    if let Some(path) = env_path(PROFILES_DIR_ENV) {
        return Some(path);
    }
    if let Some(path) = configured {
        return Some(path.clone());
    }
    get_config_dir().map(|dir| dir.join(PROFILES_DIR_NAME))
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var(var)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
