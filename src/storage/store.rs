//! Store
//!
//! Process-wide handle on the storage environment.

use std::fs;
use std::path::{Path, PathBuf};

use redb::{Builder, Database, StorageBackend, TableDefinition};

use crate::config::Config;
use crate::error::{PearError, Result};

use super::{Transaction, TxnMode};

/// Name of the table holding every document
const DOCS_TABLE: &str = "docs";

/// Database file inside the data directory
pub const DB_FILENAME: &str = "data.redb";

pub(crate) const DOCS: TableDefinition<&[u8], &[u8]> = TableDefinition::new(DOCS_TABLE);

/// Shared storage handle
///
/// One `Store` exists per process and is shared by every worker through an
/// `Arc`. Each request begins its own [`Transaction`]; transactions are never
/// shared across requests or threads.
pub struct Store {
    db: Database,
    path: Option<PathBuf>,
}

impl Store {
    /// Open or create the environment described by `config`
    ///
    /// On startup:
    /// 1. Create the data directory if it doesn't exist
    /// 2. Open/create the database file with the configured cache size
    /// 3. Create the `docs` table so read-only transactions can always open it
    pub fn open(config: &Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;
        let path = config.data_dir.join(DB_FILENAME);

        let db = Builder::new()
            .set_cache_size(config.cache_size)
            .create(&path)
            .map_err(PearError::storage)?;

        tracing::debug!("Opened store at {}", path.display());
        Self::init(db, Some(path))
    }

    /// Open with a directory (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(dir: &Path) -> Result<Self> {
        let config = Config::builder().data_dir(dir).build();
        Self::open(&config)
    }

    /// Open on a caller-supplied storage backend instead of a file
    ///
    /// `config.data_dir` is ignored. With `redb::backends::InMemoryBackend`
    /// this gives a store that lives only as long as the process.
    pub fn open_backend(backend: impl StorageBackend, config: &Config) -> Result<Self> {
        let db = Builder::new()
            .set_cache_size(config.cache_size)
            .create_with_backend(backend)
            .map_err(PearError::storage)?;

        tracing::debug!("Opened store on a custom backend");
        Self::init(db, None)
    }

    fn init(db: Database, path: Option<PathBuf>) -> Result<Self> {
        let setup = db.begin_write().map_err(PearError::storage)?;
        {
            setup.open_table(DOCS).map_err(PearError::storage)?;
        }
        setup.commit().map_err(PearError::storage)?;

        Ok(Self { db, path })
    }

    /// Begin a transaction
    ///
    /// `ReadWrite` blocks until any other writer has committed or aborted.
    pub fn begin(&self, mode: TxnMode) -> Result<Transaction> {
        match mode {
            TxnMode::ReadOnly => {
                let txn = self.db.begin_read().map_err(PearError::storage)?;
                Ok(Transaction::ReadOnly(txn))
            }
            TxnMode::ReadWrite => {
                let txn = self.db.begin_write().map_err(PearError::storage)?;
                Ok(Transaction::ReadWrite(txn))
            }
        }
    }

    /// Path of the database file, `None` for a custom backend
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
