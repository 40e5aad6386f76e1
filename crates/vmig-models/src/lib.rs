//! Shared data models for the video migration engine.
//!
//! This crate provides Serde-serializable types for:
//! - Ledger jobs and their lifecycle status
//! - Ephemeral resumable transfer sessions
//! - Remote upload approaches and processing states

pub mod job;
pub mod remote;
pub mod transfer;
pub mod utils;

// Re-export common types
pub use job::{Job, JobId, JobStatus, LedgerSummary, ParseJobStatusError};
pub use remote::{ResourceStatus, UploadApproach};
pub use transfer::TransferSession;
pub use utils::{companion_filename, remote_id_from_uri};
