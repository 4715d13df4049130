//! Local configuration management for the Vulnerable Bank client.

use crate::auth::AdminPolicy;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";

/// Application configuration stored locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Bank API base URL
    pub server_url: String,

    /// How the admin flag of a new session is decided
    pub admin_policy: AdminPolicy,

    /// Where the session entries are persisted. If None, use the default location.
    pub session_file: Option<PathBuf>,

    /// Log file path. If None, logs go next to the config file.
    pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            admin_policy: AdminPolicy::default(),
            session_file: None,
            log_file: None,
        }
    }
}

impl AppConfig {
    /// Config directory for this application.
    pub fn dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vulnerable-bank")
    }

    /// Get the config file path.
    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load config from disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path())
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn session_path(&self) -> PathBuf {
        self.session_file
            .clone()
            .unwrap_or_else(crate::storage::FileStore::default_path)
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| Self::dir().join("vbank.log"))
    }
}
