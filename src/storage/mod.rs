//! Storage Module
//!
//! Transaction facade over the embedded storage engine (redb).
//!
//! ## Responsibilities
//! - Create/open the on-disk environment at startup
//! - Open the single `docs` table used for every document
//! - Hand out short-lived transactions, one per request
//!
//! ## Concurrency Model
//! The engine itself provides the discipline; nothing here takes a lock.
//! - **Read-write** transactions serialize against each other (single writer)
//! - **Read-only** transactions run alongside the writer and observe a
//!   consistent snapshot taken at `begin`
//!
//! ## File Layout
//! ```text
//! {data_dir}/
//!   └── data.redb      (all documents, table "docs")
//! ```

mod store;
mod transaction;

pub use store::{Store, DB_FILENAME};
pub use transaction::{Transaction, TxnMode};
