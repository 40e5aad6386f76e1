//! Tests for the hosting client against a mock HTTP server.

use std::io::Write;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vmig_models::{ResourceStatus, UploadApproach};

use crate::api::{CreateSessionRequest, HostingApi};
use crate::client::{HostClient, HostConfig};
use crate::error::HostError;
use crate::retry::RetryConfig;

// =============================================================================
// Test Helpers
// =============================================================================

fn test_config(api_base: &str) -> HostConfig {
    HostConfig {
        api_base: api_base.to_string(),
        access_token: "test-token".to_string(),
        timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(2),
        retry: RetryConfig {
            max_retries: 3,
            base_delay_ms: 1,
            max_delay_ms: 5,
        },
    }
}

fn test_client(server: &MockServer) -> HostClient {
    HostClient::new(test_config(&server.uri())).unwrap()
}

// =============================================================================
// Session Creation
// =============================================================================

#[tokio::test]
async fn test_create_upload_session_tus() {
    let server = MockServer::start().await;
    let upload_link = format!("{}/files/abc", server.uri());

    Mock::given(method("POST"))
        .and(path("/me/videos"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "uri": "/videos/42",
            "name": "talk.mp4",
            "upload": { "approach": "tus", "upload_link": upload_link, "status": "in_progress" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let grant = client
        .create_upload_session(&CreateSessionRequest {
            size_bytes: 11,
            name: "talk.mp4".to_string(),
            placement_hint: Some("/me/projects/9".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(grant.approach, UploadApproach::Tus);
    assert_eq!(grant.resource_uri, "/videos/42");
    assert_eq!(grant.upload_endpoint.as_deref(), Some(upload_link.as_str()));

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["upload"]["approach"], "tus");
    assert_eq!(body["upload"]["size"], 11);
    assert_eq!(body["name"], "talk.mp4");
    assert_eq!(body["folder_uri"], "/me/projects/9");
}

#[tokio::test]
async fn test_create_upload_session_reports_other_approach() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/me/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uri": "/videos/43",
            "upload": { "approach": "post" }
        })))
        .mount(&server)
        .await;

    let grant = test_client(&server)
        .create_upload_session(&CreateSessionRequest {
            size_bytes: 5,
            name: "clip.mov".to_string(),
            placement_hint: None,
        })
        .await
        .unwrap();

    assert_eq!(grant.approach, UploadApproach::Unsupported("post".to_string()));
    assert!(grant.upload_endpoint.is_none());
}

#[tokio::test]
async fn test_create_upload_session_auth_failure_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/me/videos"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
        .expect(1)
        .mount(&server)
        .await;

    let result = test_client(&server)
        .create_upload_session(&CreateSessionRequest {
            size_bytes: 5,
            name: "clip.mov".to_string(),
            placement_hint: None,
        })
        .await;

    assert!(matches!(result, Err(HostError::AuthError(_))));
}

// =============================================================================
// tus Offset Probe / Append
// =============================================================================

#[tokio::test]
async fn test_probe_offset_reads_header() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/files/abc"))
        .and(header("Tus-Resumable", "1.0.0"))
        .respond_with(ResponseTemplate::new(200).insert_header("Upload-Offset", "4096"))
        .mount(&server)
        .await;

    let offset = test_client(&server)
        .probe_offset(&format!("{}/files/abc", server.uri()))
        .await
        .unwrap();

    assert_eq!(offset, 4096);
}

#[tokio::test]
async fn test_probe_offset_retries_server_errors() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/files/abc"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/files/abc"))
        .respond_with(ResponseTemplate::new(200).insert_header("Upload-Offset", "10"))
        .expect(1)
        .mount(&server)
        .await;

    let offset = test_client(&server)
        .probe_offset(&format!("{}/files/abc", server.uri()))
        .await
        .unwrap();

    assert_eq!(offset, 10);
}

#[tokio::test]
async fn test_probe_offset_without_header_is_invalid() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/files/abc"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let result = test_client(&server)
        .probe_offset(&format!("{}/files/abc", server.uri()))
        .await;

    assert!(matches!(result, Err(HostError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_append_bytes_sends_offset_and_returns_ack() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/files/abc"))
        .and(header("Tus-Resumable", "1.0.0"))
        .and(header("Upload-Offset", "6"))
        .and(header("Content-Type", "application/offset+octet-stream"))
        .respond_with(ResponseTemplate::new(204).insert_header("Upload-Offset", "11"))
        .expect(1)
        .mount(&server)
        .await;

    let ack = test_client(&server)
        .append_bytes(&format!("{}/files/abc", server.uri()), 6, b"world".to_vec())
        .await
        .unwrap();

    assert_eq!(ack, Some(11));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].body, b"world".to_vec());
}

#[tokio::test]
async fn test_append_bytes_without_ack_header() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/files/abc"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let ack = test_client(&server)
        .append_bytes(&format!("{}/files/abc", server.uri()), 0, b"hello".to_vec())
        .await
        .unwrap();

    assert_eq!(ack, None);
}

#[tokio::test]
async fn test_append_bytes_conflict_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/files/abc"))
        .respond_with(ResponseTemplate::new(409).set_body_string("offset mismatch"))
        .expect(1)
        .mount(&server)
        .await;

    let result = test_client(&server)
        .append_bytes(&format!("{}/files/abc", server.uri()), 3, b"xyz".to_vec())
        .await;

    assert!(matches!(result, Err(HostError::Conflict(_))));
}

// =============================================================================
// Status
// =============================================================================

#[tokio::test]
async fn test_resource_status_maps_transcode_state() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/videos/42"))
        .and(query_param("fields", "uri,transcode.status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uri": "/videos/42",
            "transcode": { "status": "in_progress" }
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/videos/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uri": "/videos/42",
            "transcode": { "status": "complete" }
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    assert_eq!(
        client.resource_status("/videos/42").await.unwrap(),
        ResourceStatus::Processing
    );
    assert_eq!(
        client.resource_status("/videos/42").await.unwrap(),
        ResourceStatus::Ready
    );
}

#[tokio::test]
async fn test_resource_status_missing_transcode_is_unknown() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/videos/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "uri": "/videos/42" })))
        .mount(&server)
        .await;

    let status = test_client(&server).resource_status("/videos/42").await.unwrap();
    assert!(matches!(status, ResourceStatus::Unknown(_)));
}

#[tokio::test]
async fn test_rate_limit_honors_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/videos/42"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "2"))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri());
    config.retry = RetryConfig::none();
    let client = HostClient::new(config).unwrap();

    let result = client.resource_status("/videos/42").await;
    assert!(matches!(result, Err(HostError::RateLimited(2000))));
}

// =============================================================================
// Side Asset
// =============================================================================

#[tokio::test]
async fn test_attach_side_asset_uploads_and_activates() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let picture_path = dir.path().join("talk.jpg");
    std::fs::File::create(&picture_path)
        .unwrap()
        .write_all(b"\xFF\xD8jpeg")
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/videos/42/pictures"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "uri": "/videos/42/pictures/7",
            "link": format!("{}/upload/pic7", server.uri()),
            "active": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/upload/pic7"))
        .and(header("Content-Type", "image/jpeg"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/videos/42/pictures/7"))
        .and(body_json(json!({ "active": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uri": "/videos/42/pictures/7",
            "active": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    tokio_test::assert_ok!(
        test_client(&server)
            .attach_side_asset("/videos/42", &picture_path)
            .await
    );

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[1].body, b"\xFF\xD8jpeg".to_vec());
}

#[tokio::test]
async fn test_attach_side_asset_missing_file() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    let result = test_client(&server)
        .attach_side_asset("/videos/42", &dir.path().join("absent.jpg"))
        .await;

    assert!(matches!(result, Err(HostError::Io(_))));
    assert!(server.received_requests().await.unwrap().is_empty());
}

// =============================================================================
// Folders
// =============================================================================

#[tokio::test]
async fn test_resolve_folder_follows_pagination() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/projects"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [ { "uri": "/users/1/projects/77", "name": "Archive" } ],
            "paging": { "next": null }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/me/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [ { "uri": "/users/1/projects/5", "name": "Archive 2019" } ],
            "paging": { "next": "/me/projects?page=2&per_page=100" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/me/projects"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let uri = test_client(&server).resolve_folder("Archive").await.unwrap();
    assert_eq!(uri, "/users/1/projects/77");
}

#[tokio::test]
async fn test_resolve_folder_creates_when_missing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/me/projects"))
        .and(body_json(json!({ "name": "Archive" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "uri": "/users/1/projects/88",
            "name": "Archive"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let uri = test_client(&server).resolve_folder("Archive").await.unwrap();
    assert_eq!(uri, "/users/1/projects/88");
}
