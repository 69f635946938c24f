//! Dispatcher configuration, read from the `[dispatch]` table of `steep.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read '{path}': {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("invalid toml in '{path}': {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
}

/// Shape of addresses accepted by the default validator: a fixed
/// human-readable prefix followed by bech32 data characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchOptions {
    pub address_prefix: String,
    pub address_data_len: usize,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self { address_prefix: "tea1".to_string(), address_data_len: 38 }
    }
}

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    dispatch: DispatchOptions,
}

impl DispatchOptions {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<ConfigFile>(s).map(|f| f.dispatch)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_table_missing() {
        let opts = DispatchOptions::from_toml_str("[compiler]\nrecognize_address_type = true\n").unwrap();
        assert_eq!(opts, DispatchOptions::default());
    }

    #[test]
    fn parse_dispatch_table() {
        let opts = DispatchOptions::from_toml_str("[dispatch]\naddress_prefix = \"teat1\"\naddress_data_len = 10\n").unwrap();
        assert_eq!(opts.address_prefix, "teat1");
        assert_eq!(opts.address_data_len, 10);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("steep.toml");
        std::fs::write(&path, "[dispatch]\naddress_data_len = 20\n").unwrap();
        let opts = DispatchOptions::load_from(&path).unwrap();
        assert_eq!(opts.address_prefix, "tea1");
        assert_eq!(opts.address_data_len, 20);
        assert!(matches!(DispatchOptions::load_from(&dir.path().join("missing.toml")), Err(ConfigError::Read { .. })));
    }
}
