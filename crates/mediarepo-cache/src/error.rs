//! Replica refresh errors

use mediarepo_core::MediaError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReplicaError {
    #[error("Remote source error: {0}")]
    Source(String),
    #[error("Remote query timed out after {0} ms")]
    Timeout(u64),
    #[error("Snapshot archive error: {0}")]
    Snapshot(#[from] zip::result::ZipError),
    #[error("Snapshot of {size} bytes exceeds limit of {limit} bytes")]
    TooLarge { size: u64, limit: u64 },
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Catalog decode error: {0}")]
    Catalog(#[from] MediaError),
    #[error("Snapshot build task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
