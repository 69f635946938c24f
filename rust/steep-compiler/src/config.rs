//! Configuration file parsing for `steep.toml`.
//!
//! Searches the given directory then its ancestors. Only the `[compiler]`
//! table is read here; the runtime reads `[dispatch]` from the same file.

use crate::CompileOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE: &str = "steep.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read '{path}': {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("invalid toml in '{path}': {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
}

#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct SteepConfig {
    #[serde(default)]
    pub compiler: CompileOptions,
}

impl SteepConfig {
    /// Parse a TOML string directly. Tables other than `[compiler]` are ignored.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Load the nearest `steep.toml` at or above `start`.
    /// Returns `Ok(None)` when no file exists.
    pub fn discover(start: &Path) -> Result<Option<(PathBuf, Self)>, ConfigError> {
        match find_config(start) {
            Some(path) => {
                let cfg = Self::load_from(&path)?;
                tracing::debug!(path = %path.display(), "loaded compiler config");
                Ok(Some((path, cfg)))
            }
            None => Ok(None),
        }
    }
}

/// Nearest `steep.toml` at or above `start`.
pub fn find_config(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}
