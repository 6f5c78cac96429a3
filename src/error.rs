//! Error types for Pear
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using PearError
pub type Result<T> = std::result::Result<T, PearError>;

/// Unified error type for Pear operations
#[derive(Debug, Error)]
pub enum PearError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    /// Any failure inside the storage engine (begin, get, put, delete, commit)
    #[error("Storage failure: {0}")]
    Storage(#[from] redb::Error),

    #[error("Write attempted in a read-only transaction")]
    ReadOnlyTransaction,

    // -------------------------------------------------------------------------
    // Request Errors
    // -------------------------------------------------------------------------
    #[error("Malformed request path")]
    MalformedPath,

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration / Startup Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Startup failure: {0}")]
    Startup(String),
}

impl PearError {
    /// Wrap any redb error type as a storage failure
    pub fn storage(err: impl Into<redb::Error>) -> Self {
        PearError::Storage(err.into())
    }

    /// True for errors that come from the storage engine
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, PearError::Storage(_))
    }
}
