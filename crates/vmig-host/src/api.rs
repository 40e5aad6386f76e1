//! The hosting capability consumed by the transfer engine.

use std::path::Path;

use async_trait::async_trait;

use vmig_models::{ResourceStatus, UploadApproach};

use crate::error::HostResult;

/// Parameters of an upload session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSessionRequest {
    pub size_bytes: u64,
    pub name: String,
    /// Folder the resource should be placed in
    pub placement_hint: Option<String>,
}

/// What the remote granted when a session was created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionGrant {
    /// Append endpoint; absent when the remote chose a non-resumable approach
    pub upload_endpoint: Option<String>,
    pub resource_uri: String,
    pub approach: UploadApproach,
}

/// Remote hosting operations.
///
/// Implementations must be safe to call sequentially from one flow; the
/// engine never issues two calls concurrently.
#[async_trait]
pub trait HostingApi: Send + Sync {
    /// Create the remote resource and its upload session.
    async fn create_upload_session(&self, request: &CreateSessionRequest)
        -> HostResult<SessionGrant>;

    /// Bytes the remote durably holds for `upload_endpoint`.
    async fn probe_offset(&self, upload_endpoint: &str) -> HostResult<u64>;

    /// Append `payload` at `offset`; returns the new offset when reported.
    async fn append_bytes(
        &self,
        upload_endpoint: &str,
        offset: u64,
        payload: Vec<u8>,
    ) -> HostResult<Option<u64>>;

    /// Post-transfer processing state of the resource.
    async fn resource_status(&self, resource_uri: &str) -> HostResult<ResourceStatus>;

    /// Upload `asset_path` as the resource's active picture.
    async fn attach_side_asset(&self, resource_uri: &str, asset_path: &Path) -> HostResult<()>;

    /// Find a folder by name, creating it when missing; returns its URI.
    async fn resolve_folder(&self, name: &str) -> HostResult<String>;
}
