//! Video migration worker.
//!
//! This crate provides:
//! - Source discovery and ledger registration
//! - The per-run orchestrator driving transfers job by job
//! - Structured job logging
//! - Environment-driven configuration

pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod migrator;

pub use config::WorkerConfig;
pub use discovery::{discover, scan_and_register, Candidate, ScanReport};
pub use error::{WorkerError, WorkerResult};
pub use logging::JobLogger;
pub use migrator::{Migrator, RunContext, RunReport};
