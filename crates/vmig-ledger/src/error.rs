//! Ledger error types.

use thiserror::Error;

use vmig_models::ParseJobStatusError;

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors raised by the job ledger. All of them are fatal to a run.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Job not found: {0}")]
    NotFound(i64),

    #[error("Invalid state transition for job {id}: cannot transition from {from} to {to}")]
    InvalidTransition { id: i64, from: String, to: String },

    #[error("Corrupt ledger row: {0}")]
    CorruptRow(String),
}

impl LedgerError {
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::CorruptRow(msg.into())
    }
}

impl From<ParseJobStatusError> for LedgerError {
    fn from(e: ParseJobStatusError) -> Self {
        Self::CorruptRow(e.to_string())
    }
}
