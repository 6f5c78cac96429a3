//! Pear Server Binary
//!
//! Opens the store and serves it over HTTP.

use std::sync::Arc;

use clap::{Parser, ValueEnum};
use pear::{Config, Server, StorageFailurePolicy, Store};
use tracing_subscriber::{fmt, EnvFilter};

/// Pear Server
#[derive(Parser, Debug)]
#[command(name = "pear-server")]
#[command(about = "Multi-threaded HTTP key-value store")]
#[command(version)]
struct Args {
    /// Storage directory (created if missing)
    #[arg(short, long, default_value = "store")]
    db_path: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:8888")]
    listen: String,

    /// Worker threads (defaults to the number of CPUs)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Storage cache size in MB
    #[arg(long, default_value = "1000")]
    cache_mb: usize,

    /// What to do when a storage transaction fails
    #[arg(long, value_enum, default_value_t = OnStorageError::Abort)]
    storage_errors: OnStorageError,

    /// Idle keep-alive timeout in milliseconds (0 disables)
    #[arg(long, default_value = "60000")]
    idle_timeout_ms: u64,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OnStorageError {
    /// Terminate the process
    Abort,
    /// Fail the request with 500
    Respond,
}

impl From<OnStorageError> for StorageFailurePolicy {
    fn from(value: OnStorageError) -> Self {
        match value {
            OnStorageError::Abort => StorageFailurePolicy::Abort,
            OnStorageError::Respond => StorageFailurePolicy::Respond,
        }
    }
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,pear=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("Pear Server v{}", pear::VERSION);
    tracing::info!("Storage directory: {}", args.db_path);

    let mut builder = Config::builder()
        .data_dir(&args.db_path)
        .listen_addr(&args.listen)
        .cache_size(args.cache_mb * 1024 * 1024)
        .storage_failure_policy(args.storage_errors.into())
        .idle_timeout_ms(args.idle_timeout_ms);
    if let Some(workers) = args.workers {
        builder = builder.workers(workers);
    }
    let config = builder.build();

    let store = match Store::open(&config) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!("Failed to open store: {}", e);
            std::process::exit(1);
        }
    };

    let server = match Server::bind(&config, store) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
