//! Petsync configuration.
//!
//! Loaded from `~/.petsync/config.toml`. Created with defaults if missing.
//! `PETSYNC_API_URL` overrides the service URL.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::session::Timing;

/// Where the pet service lives unless told otherwise.
pub const DEFAULT_API_BASE_URL: &str = "https://us-central1-office-pets.cloudfunctions.net";

/// Environment variable that overrides `api-base-url`.
pub const API_URL_ENV: &str = "PETSYNC_API_URL";

/// Petsync configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Base URL of the pet service.
    pub api_base_url: String,

    /// Seconds between automatic flushes of buffered actions.
    pub flush_interval_secs: u64,

    /// Per-request timeout.
    pub request_timeout_secs: u64,

    /// How long an action blocks the next one, in milliseconds.
    pub action_lock_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            flush_interval_secs: 15,
            request_timeout_secs: 10,
            action_lock_ms: 3000,
        }
    }
}

impl Config {
    /// Load config from `~/.petsync/config.toml`, writing defaults first if
    /// the file doesn't exist.
    pub fn load() -> Result<Self, String> {
        let path = Self::path().ok_or("could not determine home directory")?;
        let mut config = Self::load_from(&path)?;
        if let Ok(url) = std::env::var(API_URL_ENV)
            && !url.trim().is_empty()
        {
            config.api_base_url = url.trim().to_string();
        }
        Ok(config)
    }

    /// Load config from `path`, creating it with defaults when missing.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            let config = Self::default();
            config.write_to(path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;

        let config: Self = toml::from_str(&contents)
            .map_err(|e| format!("invalid config at {}: {e}", path.display()))?;

        if config.api_base_url.trim().is_empty() {
            return Err(format!("api-base-url is empty in {}", path.display()));
        }
        if config.flush_interval_secs == 0 {
            return Err(format!(
                "flush-interval-secs must be at least 1 in {}",
                path.display()
            ));
        }

        Ok(config)
    }

    fn write_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("failed to create {}: {e}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| format!("failed to serialize config: {e}"))?;
        fs::write(path, contents).map_err(|e| format!("failed to write {}: {e}", path.display()))
    }

    /// The config file path: `~/.petsync/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".petsync").join("config.toml"))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn timing(&self) -> Timing {
        Timing {
            flush_interval: Duration::from_secs(self.flush_interval_secs),
            action_lock: Duration::from_millis(self.action_lock_ms),
        }
    }
}
