//! Request handlers
//!
//! Each handler runs exactly one storage operation inside its own transaction:
//! begin → operation → commit (or abort on failure).
//!
//! | Handler | Transaction | Found                 | Missing                         |
//! |---------|-------------|-----------------------|---------------------------------|
//! | PUT     | read-write  | 200, empty            | n/a                             |
//! | GET     | read-only   | 200, body = value     | 404, empty, keep-alive forced   |
//! | DELETE  | read-write  | 200, empty            | 404, empty                      |
//!
//! A missing key is a normal outcome: the transaction still commits.
//! Storage errors propagate as `PearError::Storage`; the router decides what
//! they cost.

use bytes::Bytes;

use crate::error::{PearError, Result};
use crate::protocol::{Response, TEXT_PLAIN};
use crate::storage::{Store, Transaction, TxnMode};

/// Abort a write transaction after `err`, then hand `err` back
fn abandon(txn: Transaction, err: PearError) -> PearError {
    if let Err(abort_err) = txn.abort() {
        tracing::warn!("Abort after failed write also failed: {}", abort_err);
    }
    err
}

/// Store `body` under `key`, overwriting any previous value
pub fn put(store: &Store, key: &[u8], body: &[u8]) -> Result<Response> {
    let mut txn = store.begin(TxnMode::ReadWrite)?;

    if let Err(e) = txn.put(key, body) {
        return Err(abandon(txn, e));
    }
    txn.commit()?;

    Ok(Response::ok().with_header("Content-Type", TEXT_PLAIN))
}

/// Fetch the value stored under `key`
pub fn get(store: &Store, key: &[u8]) -> Result<Response> {
    let txn = store.begin(TxnMode::ReadOnly)?;
    let value = txn.get(key)?;
    txn.commit()?;

    match value {
        Some(value) => Ok(Response::ok()
            .with_header("Content-Type", TEXT_PLAIN)
            .with_body(Bytes::from(value))),
        // A miss should not cost the client a reconnect
        None => Ok(Response::not_found().with_forced_keep_alive()),
    }
}

/// Remove `key`
pub fn delete(store: &Store, key: &[u8]) -> Result<Response> {
    let mut txn = store.begin(TxnMode::ReadWrite)?;

    let removed = match txn.delete(key) {
        Ok(removed) => removed,
        Err(e) => return Err(abandon(txn, e)),
    };
    txn.commit()?;

    if removed {
        Ok(Response::ok())
    } else {
        Ok(Response::not_found())
    }
}
