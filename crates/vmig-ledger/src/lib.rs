//! Durable job ledger.
//!
//! This crate provides:
//! - The [`JobLedger`] contract used by the migration orchestrator
//! - A SQLite implementation over a single injected `sqlx` pool
//! - Pool setup (WAL, busy timeout) and embedded migrations

pub mod error;
pub mod ledger;
pub mod models;
pub mod pool;

pub use error::{LedgerError, LedgerResult};
pub use ledger::{JobLedger, SqliteJobLedger};
pub use pool::{init_pool, LedgerPool};
