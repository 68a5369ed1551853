use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TidingsConfig {
    #[serde(default)]
    pub feed: FeedConfig,
    /// Preferred output mode (`pretty`, `text`, `json`).
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Messages requested per history page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Activities the feed tries to hold after an initial load.
    #[serde(default = "default_min_activity_count")]
    pub min_activity_count: usize,
    /// Event type prefixes never requested from history.
    #[serde(default)]
    pub exclude_event_types: Vec<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            min_activity_count: default_min_activity_count(),
            exclude_event_types: Vec::new(),
        }
    }
}

/// Load a config file; a missing file yields defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(path: &Path) -> Result<TidingsConfig> {
    if !path.exists() {
        return Ok(TidingsConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<TidingsConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// `<config_dir>/tidings/config.toml`, if the platform has a config dir.
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tidings/config.toml"))
}

/// Load `<config_dir>/tidings/config.toml`, or defaults when absent.
///
/// # Errors
///
/// Returns an error if the user config exists but cannot be read or parsed.
pub fn load_user_config() -> Result<TidingsConfig> {
    let Some(path) = user_config_path() else {
        return Ok(TidingsConfig::default());
    };
    load_config(&path)
}

/// An explicit path wins over the user config. Unlike the user config, an
/// explicit path must exist.
///
/// # Errors
///
/// Returns an error if `explicit` does not exist, or if the chosen config
/// cannot be read or parsed.
pub fn resolve_config(explicit: Option<&Path>) -> Result<TidingsConfig> {
    match explicit {
        Some(path) => {
            anyhow::ensure!(
                path.exists(),
                "Config file {} does not exist",
                path.display()
            );
            load_config(path)
        }
        None => load_user_config(),
    }
}

const fn default_page_size() -> usize {
    15
}

const fn default_min_activity_count() -> usize {
    15
}
