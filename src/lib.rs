//! # Pear
//!
//! A network-accessible key-value store with:
//! - PUT / GET / DELETE over a path-based addressing scheme (`/{key}/...`)
//! - One storage transaction per request, against an embedded engine
//! - A fixed pool of worker threads, each with its own event loop
//! - Single-writer / multi-reader snapshot concurrency from the engine
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Dispatch (accept loop)                     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  round-robin handoff
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │           Workers (one event loop per thread)               │
//! │              HTTP/1.x codec per connection                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │        Router → Key Extractor → PUT / GET / DELETE          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  begin / op / commit
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │              Store (redb, table "docs")                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod storage;
pub mod key;
pub mod handler;
pub mod router;
pub mod protocol;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{PearError, Result};
pub use config::{Config, StorageFailurePolicy};
pub use storage::Store;
pub use router::Router;
pub use network::Server;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of Pear
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
