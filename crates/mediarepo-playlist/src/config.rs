//! Playlist configuration

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::playlist::PlayMode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistConfig {
    /// Hard cap on the number of entries
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    /// RandomCat refills once the list is at or below this many entries
    #[serde(default = "default_refill_threshold")]
    pub refill_threshold: usize,
    /// Number of collections picked per RandomCat refill
    #[serde(default = "default_refill_batch")]
    pub refill_batch: usize,
    /// Mode a new playlist starts in
    #[serde(default)]
    pub mode: PlayMode,
}

fn default_max_items() -> usize {
    1024
}

fn default_refill_threshold() -> usize {
    2
}

fn default_refill_batch() -> usize {
    5
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            max_items: default_max_items(),
            refill_threshold: default_refill_threshold(),
            refill_batch: default_refill_batch(),
            mode: PlayMode::default(),
        }
    }
}

impl PlaylistConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Load configuration from file, falling back to defaults when it is missing
pub fn load_config(path: &Path) -> Result<PlaylistConfig> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config = PlaylistConfig::from_toml(&content)?;
        info!(path = %path.display(), "Loaded playlist configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Playlist configuration not found, using defaults"
        );
        Ok(PlaylistConfig::default())
    }
}
