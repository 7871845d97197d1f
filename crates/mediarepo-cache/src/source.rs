//! Collaborator interfaces consumed by the replica manager

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Identifier of a remote catalog source (a repository server instance)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceId(pub String);

impl SourceId {
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SourceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Newer catalog data returned by a remote source
#[derive(Debug, Clone)]
pub struct SnapshotUpdate {
    /// Opaque serial identifying this snapshot
    pub serial: String,
    /// Compressed catalog snapshot (see [`crate::compress`])
    pub compressed: Vec<u8>,
}

/// Remote catalog source
#[async_trait]
pub trait RemoteCatalogSource: Send + Sync {
    /// Ask whether the source has anything newer than `known_serial`.
    ///
    /// `known_serial` is None before the first successful fetch. Returns
    /// `Ok(None)` when there is nothing newer.
    async fn query_is_newer(
        &self,
        source: &SourceId,
        known_serial: Option<&str>,
    ) -> Result<Option<SnapshotUpdate>>;
}

/// Discovery service listing the sources currently on the network
#[async_trait]
pub trait SourceDiscovery: Send + Sync {
    async fn list_known_sources(&self) -> Result<Vec<SourceId>>;
}
