//! Configuration for pushprefs
//!
//! Loaded from `$PUSHPREFS_CONFIG`, else `<config_dir>/pushprefs/config.toml`.
//! A missing file means defaults.

use crate::error::{CoreError, Result};
use crate::notifications::{NotificationOptions, TickerKey, DISPLAY_FLAG_DEFAULT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_ENV_VAR: &str = "PUSHPREFS_CONFIG";

/// Which store backend to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// One JSON file per partition (default)
    #[default]
    Json,
    /// Single SQLite database
    Sqlite,
    /// Nothing persisted
    Memory,
}

impl std::str::FromStr for BackendKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(BackendKind::Json),
            "sqlite" => Ok(BackendKind::Sqlite),
            "memory" => Ok(BackendKind::Memory),
            other => Err(CoreError::InvalidConfig {
                message: format!("unknown backend '{}' (expected json, sqlite or memory)", other),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefsConfig {
    pub backend: BackendKind,

    /// Store directory, `<data_dir>/pushprefs` when unset
    pub data_dir: Option<PathBuf>,

    /// Display flag returned when none was stored
    pub default_display_flag: i32,

    pub ticker_key: TickerKey,
}

impl Default for PrefsConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Json,
            data_dir: None,
            default_display_flag: DISPLAY_FLAG_DEFAULT,
            ticker_key: TickerKey::SharedWithTitle,
        }
    }
}

impl PrefsConfig {
    /// Load from the resolved config path
    pub fn load() -> Result<Self> {
        match resolve_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from an explicit path; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|source| CoreError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: PrefsConfig = toml::from_str(&raw).map_err(|source| CoreError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), backend = ?config.backend, "Config loaded");
        Ok(config)
    }

    pub fn effective_data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        dirs::data_dir()
            .map(|base| base.join("pushprefs"))
            .ok_or_else(|| CoreError::InvalidConfig {
                message: "no data directory configured and none could be determined".to_string(),
            })
    }

    pub fn notification_options(&self) -> NotificationOptions {
        NotificationOptions {
            default_display_flag: self.default_display_flag,
            ticker_key: self.ticker_key,
        }
    }
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|base| base.join("pushprefs").join("config.toml"))
}
