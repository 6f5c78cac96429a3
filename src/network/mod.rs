//! Network Module
//!
//! Dispatch thread, worker event loops, and per-connection handling.
//!
//! ## Architecture
//! ```text
//!                 ┌──────────────────────┐
//!   clients ────▶ │  Dispatch (accept)   │
//!                 └──────────┬───────────┘
//!                  round-robin handoff
//!          ┌─────────────────┼─────────────────┐
//!          ▼                 ▼                 ▼
//!   ┌─────────────┐   ┌─────────────┐   ┌─────────────┐
//!   │  Worker 0   │   │  Worker 1   │   │  Worker N   │
//!   │ event loop  │   │ event loop  │   │ event loop  │
//!   │ connections │   │ connections │   │ connections │
//!   └──────┬──────┘   └──────┬──────┘   └──────┬──────┘
//!          └─────────────────┼─────────────────┘
//!                            ▼
//!                  Router → Handlers → Store
//! ```
//!
//! - Each connection belongs to exactly one worker for its whole life
//! - Workers share only the `Router` (and through it the `Store`)
//! - Startup rendezvous: nothing is accepted until every worker is ready

mod server;
mod worker;
mod connection;

pub use server::{Server, ShutdownHandle};
pub use connection::Connection;
