//! Replica manager configuration

use anyhow::Result;
use mediarepo_core::FinalizeOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Replica manager settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaConfig {
    /// Base delay between update checks of one source
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Random extra delay added to every check, spreads load across sources
    #[serde(default = "default_poll_jitter_ms")]
    pub poll_jitter_ms: u64,
    /// Wake-up period of the background loop
    #[serde(default = "default_cycle_ms")]
    pub cycle_ms: u64,
    /// How often the source list is re-synced with discovery
    #[serde(default = "default_resync_interval_secs")]
    pub resync_interval_secs: u64,
    /// Upper bound on a single remote query; a timed out query counts as no data
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
    /// Largest decompressed snapshot accepted from a source
    #[serde(default = "default_max_snapshot_bytes")]
    pub max_snapshot_bytes: u64,
    /// Rollup options applied when a snapshot is finalized. Snapshots are
    /// always decoded strictly, duplicate ids reject the whole snapshot.
    #[serde(default)]
    pub finalize: FinalizeOptions,
}

fn default_poll_interval_ms() -> u64 {
    5_000
}

fn default_poll_jitter_ms() -> u64 {
    3_000
}

fn default_cycle_ms() -> u64 {
    1_000
}

fn default_resync_interval_secs() -> u64 {
    30
}

fn default_query_timeout_ms() -> u64 {
    10_000
}

fn default_max_snapshot_bytes() -> u64 {
    256 * 1024 * 1024
}

impl Default for ReplicaConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            poll_jitter_ms: default_poll_jitter_ms(),
            cycle_ms: default_cycle_ms(),
            resync_interval_secs: default_resync_interval_secs(),
            query_timeout_ms: default_query_timeout_ms(),
            max_snapshot_bytes: default_max_snapshot_bytes(),
            finalize: FinalizeOptions::default(),
        }
    }
}

impl ReplicaConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Load configuration from file, falling back to defaults when it is missing
pub fn load_config(path: &Path) -> Result<ReplicaConfig> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config = ReplicaConfig::from_toml(&content)?;
        info!(path = %path.display(), "Loaded replica configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Replica configuration not found, using defaults"
        );
        Ok(ReplicaConfig::default())
    }
}
