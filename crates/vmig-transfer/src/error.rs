//! Transfer error types.

use thiserror::Error;
use vmig_host::HostError;

pub type TransferResult<T> = Result<T, TransferError>;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Upload session rejected: {0}")]
    SessionCreation(#[source] HostError),

    #[error("Protocol mismatch: {0}")]
    ProtocolMismatch(String),

    #[error("Chunk upload at offset {offset} failed with status {status}: {message}")]
    ChunkUpload {
        status: u16,
        offset: u64,
        message: String,
    },

    #[error("Transfer incomplete: remote confirmed {confirmed} of {expected} bytes")]
    IncompleteTransfer { confirmed: u64, expected: u64 },

    #[error("Local size {actual} differs from declared size {declared}")]
    SizeMismatch { declared: u64, actual: u64 },

    #[error("Remote processing failed for {0}")]
    RemoteProcessing(String),

    #[error("Resource not ready after {attempts} status polls")]
    ReadinessTimeout { attempts: u32 },

    #[error("Invalid transfer configuration: {0}")]
    InvalidConfig(String),

    #[error("Remote error: {0}")]
    Remote(#[from] HostError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransferError {
    pub fn protocol_mismatch(msg: impl Into<String>) -> Self {
        Self::ProtocolMismatch(msg.into())
    }

    /// Map a failed append, keeping the HTTP status when there is one.
    pub fn chunk_upload(offset: u64, err: HostError) -> Self {
        match err.http_status() {
            Some(status) => Self::ChunkUpload {
                status,
                offset,
                message: err.to_string(),
            },
            None => Self::Remote(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_upload_keeps_status() {
        let err = TransferError::chunk_upload(10, HostError::from_http_status(503, "busy"));
        assert!(matches!(
            err,
            TransferError::ChunkUpload {
                status: 503,
                offset: 10,
                ..
            }
        ));
    }

    #[test]
    fn test_chunk_upload_without_status_is_remote() {
        let err = TransferError::chunk_upload(0, HostError::invalid_response("garbled"));
        assert!(matches!(err, TransferError::Remote(HostError::InvalidResponse(_))));
    }

    #[test]
    fn test_messages_name_the_numbers() {
        let err = TransferError::IncompleteTransfer {
            confirmed: 4,
            expected: 10,
        };
        assert_eq!(
            err.to_string(),
            "Transfer incomplete: remote confirmed 4 of 10 bytes"
        );
    }
}
