//! Catalog configuration loading

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::finalize::FinalizeOptions;

/// Catalog-level settings, usually the `[catalog]` table of a host config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Reject duplicate ids on insert instead of replacing
    #[serde(default = "default_true")]
    pub strict: bool,
    #[serde(default)]
    pub finalize: FinalizeOptions,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            strict: true,
            finalize: FinalizeOptions::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

impl CatalogConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Load configuration from file, falling back to defaults when it is missing
pub fn load_config(path: &Path) -> Result<CatalogConfig> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config = CatalogConfig::from_toml(&content)?;
        info!(path = %path.display(), "Loaded catalog configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Catalog configuration not found, using defaults"
        );
        Ok(CatalogConfig::default())
    }
}
