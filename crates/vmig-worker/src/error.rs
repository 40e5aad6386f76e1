//! Worker error types.

use std::path::PathBuf;

use thiserror::Error;

use vmig_host::HostError;
use vmig_ledger::LedgerError;
use vmig_transfer::TransferError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Source file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Transfer failed: {0}")]
    Transfer(#[from] TransferError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Hosting error: {0}")]
    Host(#[from] HostError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Errors that abort the whole run rather than failing one job.
    ///
    /// A ledger that cannot record outcomes would make every later attempt
    /// unaccounted for.
    pub fn is_fatal(&self) -> bool {
        matches!(self, WorkerError::Ledger(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_ledger_errors_are_fatal() {
        assert!(WorkerError::Ledger(LedgerError::NotFound(1)).is_fatal());
        assert!(!WorkerError::MissingFile(PathBuf::from("/v/a.mp4")).is_fatal());
        assert!(!WorkerError::Transfer(TransferError::ReadinessTimeout { attempts: 3 }).is_fatal());
        assert!(!WorkerError::Host(HostError::from_http_status(500, "x")).is_fatal());
    }

    #[test]
    fn test_missing_file_message_names_path() {
        let err = WorkerError::MissingFile(PathBuf::from("/videos/talk.mp4"));
        assert_eq!(err.to_string(), "Source file not found: /videos/talk.mp4");
    }
}
