use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use xdg::BaseDirectories;

use crate::diff::DisplayLimit;
use crate::jules::{
    ClientConfig, DEFAULT_ACTIVITY_PAGE_SIZE, DEFAULT_BASE_URL, DEFAULT_SESSION_PAGE_SIZE,
};

pub const API_KEY_ENV: &str = "JULES_API_KEY";
pub const BASE_URL_ENV: &str = "JULES_BASE_URL";
/// Alternate config file location.
pub const CONFIG_PATH_ENV: &str = "JULES_CONFIG";

/// API key that never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<ApiKey>,
    pub base_url: String,
    pub timeout_secs: u64,
    /// Editor for messages and prompts. Falls back to $VISUAL, $EDITOR, vi.
    pub editor: Option<String>,
    pub diff: DiffConfig,
    pub launch: LaunchConfig,
    pub list: ListConfig,
    /// Where `media --save` writes files. Defaults to the Downloads folder.
    pub download_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    pub max_display_lines: usize,
    pub max_display_bytes: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    pub require_plan_approval: bool,
    pub auto_create_pr: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    pub session_page_size: u32,
    pub activity_page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout_secs: 30,
            editor: None,
            diff: DiffConfig::default(),
            launch: LaunchConfig::default(),
            list: ListConfig::default(),
            download_dir: None,
        }
    }
}

impl Default for DiffConfig {
    fn default() -> Self {
        let limit = DisplayLimit::default();
        Self {
            max_display_lines: limit.max_lines,
            max_display_bytes: limit.max_bytes,
        }
    }
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            session_page_size: DEFAULT_SESSION_PAGE_SIZE,
            activity_page_size: DEFAULT_ACTIVITY_PAGE_SIZE,
        }
    }
}

impl Config {
    /// Load the config file (defaults when absent), then apply environment
    /// overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = Self::load_from(&path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn config_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }
        let base_dirs =
            BaseDirectories::with_prefix("jules").context("Failed to get config directory")?;
        Ok(base_dirs.get_config_home().join("config.toml"))
    }

    /// Environment wins over the file. Blank values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(key) = get(API_KEY_ENV) {
            self.api_key = Some(ApiKey::new(key.trim()));
        }
        if let Some(url) = get(BASE_URL_ENV) {
            self.base_url = url.trim().to_owned();
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.as_ref().map(|k| k.expose().to_owned()),
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
        }
    }

    /// Inline diff bounds. A zero disables that bound.
    pub fn display_limit(&self) -> DisplayLimit {
        let unlimited = DisplayLimit::unlimited();
        let bound = |value: usize, none: usize| if value == 0 { none } else { value };
        DisplayLimit {
            max_lines: bound(self.diff.max_display_lines, unlimited.max_lines),
            max_bytes: bound(self.diff.max_display_bytes, unlimited.max_bytes),
        }
    }

    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(dirs::download_dir)
            .or_else(|| dirs::home_dir().map(|h| h.join("Downloads")))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
