//! Request and response bodies of the hosting REST API.

use serde::{Deserialize, Serialize};

/// `POST /me/videos` body.
#[derive(Debug, Clone, Serialize)]
pub struct CreateVideoRequest {
    pub upload: UploadRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_uri: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadRequest {
    pub approach: String,
    pub size: u64,
}

/// Video resource as returned by the API (only the fields we read).
#[derive(Debug, Clone, Deserialize)]
pub struct VideoResponse {
    pub uri: String,
    #[serde(default)]
    pub upload: Option<UploadInfo>,
    #[serde(default)]
    pub transcode: Option<TranscodeInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadInfo {
    #[serde(default)]
    pub approach: Option<String>,
    #[serde(default)]
    pub upload_link: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscodeInfo {
    #[serde(default)]
    pub status: Option<String>,
}

/// Picture resource created under a video.
#[derive(Debug, Clone, Deserialize)]
pub struct PictureResponse {
    pub uri: String,
    #[serde(default)]
    pub link: Option<String>,
}

/// Folder (project) resource.
#[derive(Debug, Clone, Deserialize)]
pub struct Folder {
    pub uri: String,
    pub name: String,
}

/// One page of `GET /me/projects`.
#[derive(Debug, Clone, Deserialize)]
pub struct FolderPage {
    #[serde(default)]
    pub data: Vec<Folder>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub next: Option<String>,
}
