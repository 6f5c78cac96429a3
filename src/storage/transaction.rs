//! Transactions
//!
//! A transaction scopes exactly one storage operation: begun right before it,
//! committed or aborted right after.

use redb::{ReadTransaction, ReadableTable, WriteTransaction};

use crate::error::{PearError, Result};

use super::store::DOCS;

/// Transaction access mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnMode {
    /// Snapshot read; runs concurrently with the writer
    ReadOnly,

    /// Exclusive writer
    ReadWrite,
}

/// An open transaction against the `docs` table
pub enum Transaction {
    ReadOnly(ReadTransaction),
    ReadWrite(WriteTransaction),
}

impl Transaction {
    /// Mode this transaction was begun with
    pub fn mode(&self) -> TxnMode {
        match self {
            Transaction::ReadOnly(_) => TxnMode::ReadOnly,
            Transaction::ReadWrite(_) => TxnMode::ReadWrite,
        }
    }

    /// Look up a key
    ///
    /// A missing key is `Ok(None)`, not an error.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self {
            Transaction::ReadOnly(txn) => {
                let table = txn.open_table(DOCS).map_err(PearError::storage)?;
                let value = table
                    .get(key)
                    .map_err(PearError::storage)?
                    .map(|guard| guard.value().to_vec());
                Ok(value)
            }
            Transaction::ReadWrite(txn) => {
                let table = txn.open_table(DOCS).map_err(PearError::storage)?;
                let value = table
                    .get(key)
                    .map_err(PearError::storage)?
                    .map(|guard| guard.value().to_vec());
                Ok(value)
            }
        }
    }

    /// Insert or overwrite a key
    ///
    /// Not visible to anyone until [`commit`](Self::commit).
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let Transaction::ReadWrite(txn) = self else {
            return Err(PearError::ReadOnlyTransaction);
        };

        let mut table = txn.open_table(DOCS).map_err(PearError::storage)?;
        table.insert(key, value).map_err(PearError::storage)?;
        Ok(())
    }

    /// Remove a key
    ///
    /// Returns `false` when the key did not exist.
    pub fn delete(&mut self, key: &[u8]) -> Result<bool> {
        let Transaction::ReadWrite(txn) = self else {
            return Err(PearError::ReadOnlyTransaction);
        };

        let mut table = txn.open_table(DOCS).map_err(PearError::storage)?;
        let removed = table.remove(key).map_err(PearError::storage)?.is_some();
        Ok(removed)
    }

    /// Commit the transaction
    ///
    /// For a read-only transaction this releases the snapshot.
    pub fn commit(self) -> Result<()> {
        match self {
            Transaction::ReadOnly(txn) => {
                drop(txn);
                Ok(())
            }
            Transaction::ReadWrite(txn) => txn.commit().map_err(PearError::storage),
        }
    }

    /// Roll back every change made in this transaction
    pub fn abort(self) -> Result<()> {
        match self {
            Transaction::ReadOnly(txn) => {
                drop(txn);
                Ok(())
            }
            Transaction::ReadWrite(txn) => txn.abort().map_err(PearError::storage),
        }
    }
}
