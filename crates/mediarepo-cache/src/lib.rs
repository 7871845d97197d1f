//! Mediarepo Cache - background replicas of remote media catalogs
//!
//! A [`ReplicaManager`] tracks the sources reported by a
//! [`SourceDiscovery`], periodically asks each [`RemoteCatalogSource`]
//! whether it has a newer snapshot, and atomically installs finalized
//! catalogs that readers fetch as `Arc<MediaCatalog>`.

pub mod compress;
pub mod config;
pub mod error;
pub mod replica;
pub mod source;

pub use compress::{compress_snapshot, decompress_snapshot, SNAPSHOT_ENTRY};
pub use config::{load_config, ReplicaConfig};
pub use error::ReplicaError;
pub use replica::{ReplicaEvent, ReplicaManager, ReplicaStatus};
pub use source::{RemoteCatalogSource, SnapshotUpdate, SourceDiscovery, SourceId};
