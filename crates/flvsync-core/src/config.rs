use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Top-level agent configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub account: AccountConfig,
    pub site: SiteConfig,
    pub refresh: RefreshConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl AccountConfig {
    pub fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub host: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    pub interval_secs: u64,
    pub request_timeout_secs: u64,
    pub max_concurrent_details: usize,
    pub malformed_items: MalformedItemPolicy,
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Handling of listing items that are missing their link, cover or title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedItemPolicy {
    /// Drop the item and keep the rest of the list.
    #[default]
    Skip,
    /// Fail the whole refresh.
    Abort,
}

impl AppConfig {
    /// Load config: user file (if it exists) merged over built-in defaults.
    pub fn load() -> Result<Self, CoreError> {
        let user_path = Self::config_path();
        if user_path.exists() {
            Self::load_from(&user_path)
        } else {
            Self::parse("")
        }
    }

    /// Load a specific file merged over built-in defaults.
    pub fn load_from(path: &Path) -> Result<Self, CoreError> {
        let user_str = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "Loading config file");
        Self::parse(&user_str)
    }

    /// Parse a TOML document, filling every missing key from the defaults.
    pub fn parse(user: &str) -> Result<Self, CoreError> {
        let mut merged: toml::Table =
            toml::from_str(DEFAULT_CONFIG).map_err(|e| CoreError::Config(e.to_string()))?;
        let user: toml::Table = toml::from_str(user).map_err(|e| CoreError::Config(e.to_string()))?;
        merge_tables(&mut merged, user);

        toml::Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| CoreError::Config(e.to_string()))
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "flvsync")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        if let toml::Value::Table(src) = value {
            if let Some(toml::Value::Table(dst)) = base.get_mut(&key) {
                merge_tables(dst, src);
                continue;
            }
            base.insert(key, toml::Value::Table(src));
        } else {
            base.insert(key, value);
        }
    }
}
