//! Configuration for Pear
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{PearError, Result};

/// Main configuration for a Pear server
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding the database file
    /// Internal structure:
    ///   {data_dir}/
    ///     └── data.redb
    pub data_dir: PathBuf,

    /// Page cache size handed to the storage engine (bytes)
    pub cache_size: usize,

    /// What happens when a storage transaction fails mid-request
    pub storage_failure_policy: StorageFailurePolicy,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Number of worker threads, each with its own event loop
    pub workers: usize,

    /// How long an idle keep-alive connection may wait for its next request
    /// (milliseconds, 0 disables)
    pub idle_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Protocol Limits
    // -------------------------------------------------------------------------
    /// Longest accepted request line or header line (bytes)
    pub max_header_size: usize,

    /// Most header lines accepted per request
    pub max_headers: usize,

    /// Largest accepted request body (bytes)
    pub max_body_size: usize,
}

/// Reaction to a failed begin/get/put/delete/commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageFailurePolicy {
    /// Terminate the whole process immediately
    #[default]
    Abort,

    /// Fail only the current request with a 500 response
    Respond,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./store"),
            cache_size: 1_048_576_000,
            storage_failure_policy: StorageFailurePolicy::Abort,
            listen_addr: "127.0.0.1:8888".to_string(),
            workers: default_workers(),
            idle_timeout_ms: 60_000,
            max_header_size: 8 * 1024,
            max_headers: 100,
            max_body_size: 64 * 1024 * 1024, // 64 MB
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check values that would make the server unusable
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(PearError::Config("workers must be at least 1".to_string()));
        }
        if self.max_header_size == 0 {
            return Err(PearError::Config(
                "max_header_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Idle timeout as a Duration, `None` when disabled
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_ms > 0).then(|| Duration::from_millis(self.idle_timeout_ms))
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the storage cache size (in bytes)
    pub fn cache_size(mut self, bytes: usize) -> Self {
        self.config.cache_size = bytes;
        self
    }

    /// Set the storage failure policy
    pub fn storage_failure_policy(mut self, policy: StorageFailurePolicy) -> Self {
        self.config.storage_failure_policy = policy;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the number of worker threads
    pub fn workers(mut self, count: usize) -> Self {
        self.config.workers = count;
        self
    }

    /// Set the idle connection timeout (in milliseconds)
    pub fn idle_timeout_ms(mut self, ms: u64) -> Self {
        self.config.idle_timeout_ms = ms;
        self
    }

    /// Set the maximum request/header line length
    pub fn max_header_size(mut self, bytes: usize) -> Self {
        self.config.max_header_size = bytes;
        self
    }

    /// Set the maximum number of headers per request
    pub fn max_headers(mut self, count: usize) -> Self {
        self.config.max_headers = count;
        self
    }

    /// Set the maximum request body size
    pub fn max_body_size(mut self, bytes: usize) -> Self {
        self.config.max_body_size = bytes;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
