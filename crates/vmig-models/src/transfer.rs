//! Ephemeral transfer session state.

use serde::{Deserialize, Serialize};

/// State of one in-flight chunked upload.
///
/// Never persisted: a fresh session is created for every attempt and the
/// remote offset is always re-queried before bytes are sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferSession {
    /// Remote-assigned upload endpoint
    pub upload_endpoint: String,
    /// Declared size in bytes
    pub total_size: u64,
    /// Bytes confirmed by the remote (non-decreasing)
    pub current_offset: u64,
    /// Final location of the uploaded entity
    pub resource_uri: String,
}

impl TransferSession {
    pub fn new(
        upload_endpoint: impl Into<String>,
        resource_uri: impl Into<String>,
        total_size: u64,
    ) -> Self {
        Self {
            upload_endpoint: upload_endpoint.into(),
            total_size,
            current_offset: 0,
            resource_uri: resource_uri.into(),
        }
    }

    pub fn remaining(&self) -> u64 {
        self.total_size.saturating_sub(self.current_offset)
    }

    pub fn is_complete(&self) -> bool {
        self.current_offset >= self.total_size
    }

    /// Percentage confirmed, 100 for an empty file.
    pub fn percent(&self) -> f64 {
        if self.total_size == 0 {
            return 100.0;
        }
        ((self.current_offset as f64 / self.total_size as f64) * 100.0).min(100.0)
    }
}
