//! Error taxonomy shared by the catalog, cookie codec and playlist

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    /// Bad or unknown version, bad magic, truncated data, malformed cookie
    #[error("Format error: {0}")]
    Format(String),
    /// An id or cookie does not resolve
    #[error("Not found: {0}")]
    NotFound(String),
    /// A positional index is out of range
    #[error("Index {index} out of range (len {len})")]
    Index { index: usize, len: usize },
    /// A valid request refused by policy
    #[error("Rejected: {0}")]
    Rejected(String),
}

impl MediaError {
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }
}
