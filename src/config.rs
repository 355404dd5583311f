//! Locating and loading `icann.config`.
//!
//! The file is TOML holding exactly the three directory settings:
//!
//! ```toml
//! SSACDir = "~/Documents/icann/ssac"
//! RSSACDir = "~/Documents/icann/rssac"
//! OCTODir = "/srv/icann/octo"
//! ```
//!
//! Any other key is rejected, and every directory must already exist.

use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::Error;
use crate::family::Family;

pub const CONFIG_FILE_NAME: &str = "icann.config";

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "ICANN_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub ssac_dir: PathBuf,
    pub rssac_dir: PathBuf,
    pub octo_dir: PathBuf,
    /// File the settings were read from, for diagnostics.
    pub source: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(rename = "SSACDir", default)]
    ssac_dir: Option<String>,
    #[serde(rename = "RSSACDir", default)]
    rssac_dir: Option<String>,
    #[serde(rename = "OCTODir", default)]
    octo_dir: Option<String>,
}

impl Config {
    pub fn dir(&self, family: Family) -> &Path {
        match family {
            Family::Ssac => &self.ssac_dir,
            Family::Rssac => &self.rssac_dir,
            Family::Octo => &self.octo_dir,
        }
    }
}

/// Candidate config files, highest priority first.
pub fn search_paths(home: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(3);
    if let Some(home) = home {
        paths.push(home.join("bin").join(CONFIG_FILE_NAME));
    }
    paths.push(Path::new("/usr/local/bin").join(CONFIG_FILE_NAME));
    if let Some(home) = home {
        paths.push(home.join(".icann").join(CONFIG_FILE_NAME));
    }
    paths
}

/// Pick the config file: `explicit` when given, else the first existing
/// search path.
pub fn locate(explicit: Option<&Path>, home: Option<&Path>) -> Result<PathBuf, Error> {
    let candidates = match explicit {
        Some(path) => vec![path.to_path_buf()],
        None => search_paths(home),
    };
    if let Some(found) = candidates.iter().find(|p| p.is_file()) {
        return Ok(found.clone());
    }
    Err(Error::ConfigNotFound {
        searched: candidates,
    })
}

/// Find, read and validate the configuration.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let home = dirs::home_dir();
    let path = locate(explicit, home.as_deref())?;
    debug!(path = %path.display(), "using config");
    let text = std::fs::read_to_string(&path).map_err(|source| Error::ConfigRead {
        path: path.clone(),
        source,
    })?;
    Ok(parse_config(&text, &path, home.as_deref())?)
}

/// Parse config text read from `source`. Directories are checked in family
/// order so the first missing one is named.
pub fn parse_config(text: &str, source: &Path, home: Option<&Path>) -> Result<Config, Error> {
    let raw: RawConfig = toml::from_str(text).map_err(|e| Error::ConfigParse {
        path: source.to_path_buf(),
        source: e,
    })?;

    let checked = |family: Family, value: Option<String>| -> Result<PathBuf, Error> {
        let value = value.unwrap_or_default();
        let value = value.trim();
        if value.is_empty() {
            return Err(Error::MissingDirectory {
                var: family.config_key(),
                path: source.to_path_buf(),
            });
        }
        let dir = expand_home(value, home);
        if !dir.is_dir() {
            return Err(Error::NotADirectory {
                var: family.config_key(),
                dir,
                path: source.to_path_buf(),
            });
        }
        Ok(dir)
    };

    Ok(Config {
        ssac_dir: checked(Family::Ssac, raw.ssac_dir)?,
        rssac_dir: checked(Family::Rssac, raw.rssac_dir)?,
        octo_dir: checked(Family::Octo, raw.octo_dir)?,
        source: source.to_path_buf(),
    })
}

fn expand_home(value: &str, home: Option<&Path>) -> PathBuf {
    match (value.strip_prefix("~/"), home) {
        (Some(rest), Some(home)) => home.join(rest),
        _ if value == "~" => home.map(Path::to_path_buf).unwrap_or_else(|| value.into()),
        _ => PathBuf::from(value),
    }
}
