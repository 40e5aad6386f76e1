//! Hosting REST API client.
//!
//! Production-grade client with:
//! - HTTP client tuning (pooling, timeouts), built once and shared
//! - tus 1.0.0 offset probes and appends against pre-authorized upload links
//! - Exponential backoff with jitter for idempotent calls
//! - Observability (tracing spans, metrics)

use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, info_span, Instrument};

use vmig_models::{ResourceStatus, UploadApproach};

use crate::api::{CreateSessionRequest, HostingApi, SessionGrant};
use crate::error::{HostError, HostResult};
use crate::metrics::{count_uploaded_bytes, observe_request, status_label};
use crate::retry::{with_retry, RetryConfig};
use crate::tus::{
    parse_upload_offset, OFFSET_OCTET_STREAM, TUS_RESUMABLE, TUS_VERSION, UPLOAD_OFFSET,
};
use crate::types::{
    CreateVideoRequest, Folder, FolderPage, PictureResponse, UploadRequest, VideoResponse,
};

/// Versioned media type the API expects.
const API_ACCEPT: &str = "application/vnd.vimeo.*+json;version=3.4";

/// Default API origin.
pub const DEFAULT_API_BASE: &str = "https://api.vimeo.com";

/// Folders fetched per page while resolving a folder by name.
const FOLDER_PAGE_SIZE: u32 = 100;

// =============================================================================
// Configuration
// =============================================================================

/// Hosting client configuration.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// API origin, e.g. `https://api.vimeo.com`
    pub api_base: String,
    /// Personal access token (bearer)
    pub access_token: String,
    /// Request timeout; must cover one chunk append
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Retry configuration
    pub retry: RetryConfig,
}

impl HostConfig {
    pub fn new(api_base: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            access_token: access_token.into(),
            timeout: Duration::from_secs(300),
            connect_timeout: Duration::from_secs(10),
            retry: RetryConfig::default(),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> HostResult<Self> {
        let access_token = std::env::var("VIMEO_ACCESS_TOKEN")
            .map_err(|_| HostError::config("VIMEO_ACCESS_TOKEN must be set"))?;

        if access_token.trim().is_empty() {
            return Err(HostError::config("VIMEO_ACCESS_TOKEN cannot be empty"));
        }

        let timeout_secs: u64 = std::env::var("HOST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(300);

        let connect_timeout_secs: u64 = std::env::var("HOST_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        Ok(Self {
            api_base: std::env::var("VIMEO_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            access_token,
            timeout: Duration::from_secs(timeout_secs),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            retry: RetryConfig::from_env(),
        })
    }
}

// =============================================================================
// Client
// =============================================================================

/// Hosting REST API client.
#[derive(Clone)]
pub struct HostClient {
    http: Client,
    config: HostConfig,
    base_url: String,
}

impl HostClient {
    /// Create a new client.
    pub fn new(config: HostConfig) -> HostResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(4)
            .user_agent(concat!("vmig-host/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(HostError::Network)?;

        let base_url = config.api_base.trim_end_matches('/').to_string();

        Ok(Self {
            http,
            config,
            base_url,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> HostResult<Self> {
        Self::new(HostConfig::from_env()?)
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Absolute URL for an API path or resource URI.
    fn api_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Authenticated API request.
    fn api_request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.api_url(path))
            .bearer_auth(&self.config.access_token)
            .header(ACCEPT, API_ACCEPT)
    }

    /// tus request against a pre-authorized upload link.
    fn tus_request(&self, method: reqwest::Method, upload_endpoint: &str) -> RequestBuilder {
        self.http
            .request(method, upload_endpoint)
            .header(TUS_RESUMABLE, TUS_VERSION)
            .header(ACCEPT, API_ACCEPT)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> HostResult<T> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Self::handle_error_response(status, what, response).await);
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            HostError::invalid_response(format!(
                "{}: {} (body prefix: {})",
                what,
                e,
                body_prefix(&body, 200)
            ))
        })
    }

    // =========================================================================
    // Folders
    // =========================================================================

    async fn find_folder(&self, name: &str) -> HostResult<Option<Folder>> {
        let mut next = Some(format!("/me/projects?per_page={}", FOLDER_PAGE_SIZE));

        while let Some(page_path) = next.take() {
            let page: FolderPage = with_retry(&self.config.retry, "list_folders", || {
                self.send_json(
                    self.api_request(reqwest::Method::GET, &page_path),
                    "list folders",
                )
            })
            .await?;

            if let Some(folder) = page.data.into_iter().find(|f| f.name == name) {
                return Ok(Some(folder));
            }
            next = page.paging.and_then(|p| p.next);
        }

        Ok(None)
    }

    async fn create_folder(&self, name: &str) -> HostResult<Folder> {
        let request = self
            .api_request(reqwest::Method::POST, "/me/projects")
            .json(&serde_json::json!({ "name": name }));
        self.send_json(request, "create folder").await
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    /// Execute a request with tracing and metrics.
    async fn execute_request<T, F>(&self, operation: &str, target: &str, fut: F) -> HostResult<T>
    where
        F: std::future::Future<Output = HostResult<T>>,
    {
        let span = info_span!("host_request", operation = %operation, target = %target);

        let start = Instant::now();
        let result = fut.instrument(span).await;
        observe_request(operation, status_label(&result), start.elapsed());

        result
    }

    async fn handle_error_response(status: StatusCode, what: &str, response: Response) -> HostError {
        let retry_after_ms = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(|secs| secs.saturating_mul(1000));

        let body = response.text().await.unwrap_or_default();
        let err = HostError::from_http_status(
            status.as_u16(),
            format!("{} failed: {}", what, body_prefix(&body, 500)),
        );

        match (err, retry_after_ms) {
            (HostError::RateLimited(_), Some(ms)) => HostError::RateLimited(ms),
            (err, _) => err,
        }
    }
}

#[async_trait]
impl HostingApi for HostClient {
    async fn create_upload_session(
        &self,
        request: &CreateSessionRequest,
    ) -> HostResult<SessionGrant> {
        let body = CreateVideoRequest {
            upload: UploadRequest {
                approach: UploadApproach::TUS.to_string(),
                size: request.size_bytes,
            },
            name: Some(request.name.clone()),
            folder_uri: request.placement_hint.clone(),
        };

        self.execute_request("create_upload_session", "/me/videos", async {
            let video: VideoResponse = self
                .send_json(
                    self.api_request(reqwest::Method::POST, "/me/videos").json(&body),
                    "create upload session",
                )
                .await?;

            let upload = video.upload.ok_or_else(|| {
                HostError::invalid_response("create upload session: response has no upload section")
            })?;

            let approach = UploadApproach::from_wire(upload.approach.as_deref().unwrap_or(""));
            debug!(
                resource_uri = %video.uri,
                approach = %approach,
                "Upload session created"
            );

            Ok(SessionGrant {
                upload_endpoint: upload.upload_link,
                resource_uri: video.uri,
                approach,
            })
        })
        .await
    }

    async fn probe_offset(&self, upload_endpoint: &str) -> HostResult<u64> {
        self.execute_request("probe_offset", upload_endpoint, async {
            with_retry(&self.config.retry, "probe_offset", || async move {
                let response = self
                    .tus_request(reqwest::Method::HEAD, upload_endpoint)
                    .send()
                    .await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(Self::handle_error_response(status, "offset probe", response).await);
                }
                parse_upload_offset(response.headers())?.ok_or_else(|| {
                    HostError::invalid_response("offset probe: response has no Upload-Offset")
                })
            })
            .await
        })
        .await
    }

    async fn append_bytes(
        &self,
        upload_endpoint: &str,
        offset: u64,
        payload: Vec<u8>,
    ) -> HostResult<Option<u64>> {
        let len = payload.len() as u64;

        self.execute_request("append_bytes", upload_endpoint, async {
            let response = self
                .tus_request(reqwest::Method::PATCH, upload_endpoint)
                .header(UPLOAD_OFFSET, offset.to_string())
                .header(CONTENT_TYPE, OFFSET_OCTET_STREAM)
                .body(payload)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(Self::handle_error_response(status, "chunk append", response).await);
            }

            let new_offset = parse_upload_offset(response.headers())?;
            count_uploaded_bytes(new_offset.map(|o| o.saturating_sub(offset)).unwrap_or(len));
            Ok(new_offset)
        })
        .await
    }

    async fn resource_status(&self, resource_uri: &str) -> HostResult<ResourceStatus> {
        let path = format!("{}?fields=uri,transcode.status", resource_uri);

        self.execute_request("resource_status", resource_uri, async {
            let video: VideoResponse = with_retry(&self.config.retry, "resource_status", || {
                self.send_json(self.api_request(reqwest::Method::GET, &path), "status poll")
            })
            .await?;

            let status = video
                .transcode
                .and_then(|t| t.status)
                .map(|s| ResourceStatus::from_transcode(&s))
                .unwrap_or_else(|| ResourceStatus::Unknown("missing".to_string()));
            Ok(status)
        })
        .await
    }

    async fn attach_side_asset(&self, resource_uri: &str, asset_path: &Path) -> HostResult<()> {
        let bytes = tokio::fs::read(asset_path).await?;
        let content_type = image_content_type(asset_path);

        self.execute_request("attach_side_asset", resource_uri, async {
            let picture: PictureResponse = self
                .send_json(
                    self.api_request(reqwest::Method::POST, &format!("{}/pictures", resource_uri)),
                    "create picture",
                )
                .await?;

            let link = picture.link.as_deref().ok_or_else(|| {
                HostError::invalid_response("create picture: response has no upload link")
            })?;

            let response = self
                .http
                .put(link)
                .header(CONTENT_TYPE, content_type)
                .body(bytes)
                .send()
                .await?;
            let status = response.status();
            if !status.is_success() {
                return Err(Self::handle_error_response(status, "picture upload", response).await);
            }

            let response = self
                .api_request(reqwest::Method::PATCH, &picture.uri)
                .json(&serde_json::json!({ "active": true }))
                .send()
                .await?;
            let status = response.status();
            if !status.is_success() {
                return Err(Self::handle_error_response(status, "picture activation", response).await);
            }

            info!(
                resource_uri = %resource_uri,
                picture_uri = %picture.uri,
                "Attached picture"
            );
            Ok(())
        })
        .await
    }

    async fn resolve_folder(&self, name: &str) -> HostResult<String> {
        self.execute_request("resolve_folder", name, async {
            if let Some(folder) = self.find_folder(name).await? {
                debug!(folder = %name, uri = %folder.uri, "Using existing folder");
                return Ok(folder.uri);
            }

            let folder = self.create_folder(name).await?;
            info!(folder = %name, uri = %folder.uri, "Created folder");
            Ok(folder.uri)
        })
        .await
    }
}

fn body_prefix(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}

/// Content type for a picture, from its extension.
fn image_content_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_config_from_env_requires_token() {
        std::env::remove_var("VIMEO_ACCESS_TOKEN");
        assert!(matches!(HostConfig::from_env(), Err(HostError::Config(_))));
    }

    #[test]
    #[serial]
    fn test_config_rejects_empty_token() {
        std::env::set_var("VIMEO_ACCESS_TOKEN", "  ");
        assert!(HostConfig::from_env().is_err());
        std::env::remove_var("VIMEO_ACCESS_TOKEN");
    }

    #[test]
    #[serial]
    fn test_config_default_values() {
        std::env::set_var("VIMEO_ACCESS_TOKEN", "token");
        std::env::remove_var("VIMEO_API_BASE");
        std::env::remove_var("HOST_CONNECT_TIMEOUT_SECS");
        std::env::set_var("HOST_TIMEOUT_SECS", "not-a-number");
        let config = HostConfig::from_env().unwrap();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.timeout, Duration::from_secs(300));
        std::env::remove_var("HOST_TIMEOUT_SECS");
        std::env::remove_var("VIMEO_ACCESS_TOKEN");
    }

    #[test]
    fn test_api_url_joins_paths() {
        let client = HostClient::new(HostConfig::new("https://api.example.com/", "t")).unwrap();
        assert_eq!(client.api_url("/videos/1"), "https://api.example.com/videos/1");
        assert_eq!(client.api_url("me/videos"), "https://api.example.com/me/videos");
        assert_eq!(
            client.api_url("https://files.example.com/p/1"),
            "https://files.example.com/p/1"
        );
    }

    #[test]
    fn test_image_content_type() {
        assert_eq!(image_content_type(Path::new("a.PNG")), "image/png");
        assert_eq!(image_content_type(Path::new("a.jpg")), "image/jpeg");
        assert_eq!(image_content_type(Path::new("a")), "image/jpeg");
    }
}
