//! Configuration management.
//!
//! Supports configuration from:
//! - TOML config files
//! - Environment variables (`P1EXT_` prefix)

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{P1Error, Result};

/// Extension configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionConfig {
    /// Path of the persisted session record file
    pub store_path: Option<PathBuf>,

    /// Skip rebind and force a full login on the next connection,
    /// even when a saved session exists
    #[serde(default)]
    pub force_fresh_login: bool,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            store_path: dirs::data_dir().map(|p| p.join("p1ext").join("session.json")),
            force_fresh_login: false,
        }
    }
}

impl ExtensionConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| P1Error::Config(format!("Failed to read config file: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| P1Error::Config(format!("Failed to parse config: {e}")))
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("P1EXT_STORE_PATH") {
            config.store_path = Some(PathBuf::from(path));
        }
        if let Ok(val) = std::env::var("P1EXT_FORCE_FRESH_LOGIN") {
            if let Ok(val) = val.parse() {
                config.force_fresh_login = val;
            }
        }

        config
    }
}
