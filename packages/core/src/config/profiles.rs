//! Profile discovery and selection
//!
//! Every `*.json` file in the profiles directory describes one VM. A
//! profile's key is its `name` field (or the file stem) slugified, so
//! `"Prod EU"` and `prod-eu.json` both resolve to `prod-eu`.

use super::schema::Profile;
use super::validation::validate_profile;
use super::{ConfigError, read_jsonc};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

const DEFAULT_PROFILE: &str = "default";

/// All profiles found in a directory, keyed by slug
#[derive(Debug, Clone, Default)]
pub struct ProfileSet {
    profiles: BTreeMap<String, Profile>,
}

impl ProfileSet {
    pub fn from_profiles<I>(profiles: I) -> Self
    where
        I: IntoIterator<Item = (String, Profile)>,
    {
        Self {
            profiles: profiles.into_iter().collect(),
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Profile)> {
        self.profiles.iter()
    }

    /// Pick the active profile
    ///
    /// Resolution order:
    /// 1. Explicit selection (`--profile` or `OPSDESK_ENV`)
    /// 2. A profile named `default`
    /// 3. The only profile, if there is exactly one
    pub fn select(&self, requested: Option<&str>) -> Result<(String, &Profile), ConfigError> {
        if let Some(requested) = requested.map(str::trim).filter(|r| !r.is_empty()) {
            let key = slugify(requested);
            return self
                .profiles
                .get_key_value(&key)
                .map(|(k, p)| (k.clone(), p))
                .ok_or_else(|| ConfigError::UnknownProfile {
                    requested: requested.to_string(),
                    available: self.names(),
                });
        }

        if let Some(profile) = self.profiles.get(DEFAULT_PROFILE) {
            return Ok((DEFAULT_PROFILE.to_string(), profile));
        }

        let mut iter = self.profiles.iter();
        match (iter.next(), iter.next()) {
            (Some((name, profile)), None) => Ok((name.clone(), profile)),
            _ => Err(ConfigError::AmbiguousProfile {
                available: self.names(),
            }),
        }
    }
}

/// Load and validate every profile in `dir`
///
/// Files are read in name order so duplicate detection is deterministic.
/// A missing directory is reported like an empty one.
pub fn load_profiles(dir: &Path) -> Result<ProfileSet, ConfigError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ConfigError::NoProfiles {
                dir: dir.to_path_buf(),
            });
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: dir.to_path_buf(),
                source,
            });
        }
    };

    let mut files: Vec<_> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(ConfigError::NoProfiles {
            dir: dir.to_path_buf(),
        });
    }

    let mut profiles = BTreeMap::new();
    for path in files {
        let profile: Profile = read_jsonc(&path)?;
        validate_profile(&profile).map_err(|source| ConfigError::Invalid {
            path: path.clone(),
            source,
        })?;

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = profile
            .name
            .as_deref()
            .filter(|n| !slugify(n).is_empty())
            .unwrap_or(&stem);
        let key = slugify(name);
        let file = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        if profiles.contains_key(&key) {
            return Err(ConfigError::DuplicateProfile { name: key, file });
        }
        debug!(profile = %key, file = %file, "loaded profile");
        profiles.insert(key, profile);
    }

    Ok(ProfileSet { profiles })
}

/// Normalize a profile name: lowercase, runs of anything outside
/// `[a-z0-9_-]` collapsed to a single `-`, leading/trailing `-` removed
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_gap = false;
    for c in name.trim().to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-' {
            out.push(c);
            in_gap = false;
        } else if !in_gap {
            out.push('-');
            in_gap = true;
        }
    }
    out.trim_matches('-').to_string()
}
