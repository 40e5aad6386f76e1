//! Chunked, resumable transfer over the tus append protocol.
//!
//! The remote is the source of truth for progress: the offset is probed
//! before the first chunk and after the last, and every chunk starts at the
//! last offset the remote confirmed. Nothing about a session is persisted;
//! a retried job creates a fresh session and starts from whatever the remote
//! reports.

use std::io::SeekFrom;
use std::path::Path;
use std::sync::Arc;

use metrics::counter;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, info, warn};

use vmig_host::{CreateSessionRequest, HostingApi};
use vmig_models::{TransferSession, UploadApproach};

use crate::error::{TransferError, TransferResult};

/// 5 MiB.
pub const DEFAULT_CHUNK_SIZE: u64 = 5 * 1024 * 1024;

/// Transfer tuning.
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Maximum bytes per append; the last chunk may be shorter.
    pub chunk_size: u64,
    /// Treat a missing offset acknowledgement as an error instead of
    /// assuming the whole chunk landed.
    pub strict_acks: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            strict_acks: false,
        }
    }
}

/// Resumable upload client.
pub struct TransferClient<A> {
    api: Arc<A>,
    config: TransferConfig,
}

impl<A> Clone for TransferClient<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            config: self.config.clone(),
        }
    }
}

impl<A: HostingApi> TransferClient<A> {
    pub fn new(api: Arc<A>, config: TransferConfig) -> TransferResult<Self> {
        if config.chunk_size == 0 {
            return Err(TransferError::InvalidConfig(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        Ok(Self { api, config })
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Ask the remote for a new resumable upload session.
    ///
    /// Only the tus approach is accepted; anything else fails closed.
    pub async fn create_session(
        &self,
        file_size_bytes: u64,
        display_name: &str,
        placement_hint: Option<&str>,
    ) -> TransferResult<TransferSession> {
        let request = CreateSessionRequest {
            size_bytes: file_size_bytes,
            name: display_name.to_string(),
            placement_hint: placement_hint.map(str::to_string),
        };

        let grant = self
            .api
            .create_upload_session(&request)
            .await
            .map_err(TransferError::SessionCreation)?;

        let upload_endpoint = match (&grant.approach, grant.upload_endpoint) {
            (UploadApproach::Tus, Some(endpoint)) => endpoint,
            (UploadApproach::Tus, None) => {
                return Err(TransferError::protocol_mismatch(
                    "tus session granted without an upload endpoint",
                ))
            }
            (UploadApproach::Unsupported(other), _) => {
                return Err(TransferError::protocol_mismatch(format!(
                    "remote offered upload approach {:?}, only tus is supported",
                    other
                )))
            }
        };

        debug!(
            name = %display_name,
            size = file_size_bytes,
            resource_uri = %grant.resource_uri,
            "Created upload session"
        );

        Ok(TransferSession::new(
            upload_endpoint,
            grant.resource_uri,
            file_size_bytes,
        ))
    }

    /// Bytes the remote currently holds for `upload_endpoint`.
    pub async fn query_offset(&self, upload_endpoint: &str) -> TransferResult<u64> {
        Ok(self.api.probe_offset(upload_endpoint).await?)
    }

    /// Append `bytes` at `offset`; returns the offset the remote confirmed.
    pub async fn send_chunk(
        &self,
        upload_endpoint: &str,
        offset: u64,
        bytes: Vec<u8>,
    ) -> TransferResult<u64> {
        let len = bytes.len() as u64;
        let end = offset + len;

        let ack = self
            .api
            .append_bytes(upload_endpoint, offset, bytes)
            .await
            .map_err(|e| TransferError::chunk_upload(offset, e))?;

        let confirmed = match ack {
            Some(confirmed) => confirmed,
            None if self.config.strict_acks => {
                return Err(TransferError::protocol_mismatch(format!(
                    "append at offset {} was not acknowledged with an offset",
                    offset
                )))
            }
            None => {
                warn!(
                    offset,
                    len, "Append response carried no offset, assuming the whole chunk landed"
                );
                end
            }
        };

        if confirmed < offset || confirmed > end || (len > 0 && confirmed == offset) {
            return Err(TransferError::protocol_mismatch(format!(
                "append of {} bytes at offset {} acknowledged offset {}",
                len, offset, confirmed
            )));
        }

        counter!("transfer_chunks_total").increment(1);
        Ok(confirmed)
    }

    /// Upload `local_path` through `session`, resuming from the remote offset.
    ///
    /// Returns the resource URI once the remote confirms every byte.
    pub async fn upload(
        &self,
        local_path: &Path,
        session: &mut TransferSession,
    ) -> TransferResult<String> {
        let size = tokio::fs::metadata(local_path).await?.len();
        if size != session.total_size {
            return Err(TransferError::SizeMismatch {
                declared: session.total_size,
                actual: size,
            });
        }

        let start = self.query_offset(&session.upload_endpoint).await?;
        if start > size {
            return Err(TransferError::protocol_mismatch(format!(
                "remote reports offset {} for a {} byte file",
                start, size
            )));
        }
        if start > 0 {
            info!(offset = start, size, "Resuming partial transfer");
            counter!("transfer_resumed_total").increment(1);
        }
        session.current_offset = start;

        let mut file = File::open(local_path).await?;

        while session.current_offset < size {
            let offset = session.current_offset;
            let want = self.config.chunk_size.min(size - offset) as usize;

            // The chunk is moved into the request body, so each one is read
            // into its own buffer.
            let mut chunk = vec![0u8; want];
            file.seek(SeekFrom::Start(offset)).await?;
            file.read_exact(&mut chunk).await?;

            let confirmed = self
                .send_chunk(&session.upload_endpoint, offset, chunk)
                .await?;
            session.current_offset = confirmed;

            debug!(
                offset = confirmed,
                size,
                percent = session.percent(),
                "Chunk confirmed"
            );
        }

        let confirmed = self.query_offset(&session.upload_endpoint).await?;
        if confirmed < size {
            return Err(TransferError::IncompleteTransfer {
                confirmed,
                expected: size,
            });
        }

        Ok(session.resource_uri.clone())
    }
}
