//! In-memory [`HostingApi`] for tests.
//!
//! Keeps every upload in memory and records each call so tests can assert on
//! exactly which byte ranges were sent and how often status was polled.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use vmig_models::{ResourceStatus, UploadApproach};

use crate::api::{CreateSessionRequest, HostingApi, SessionGrant};
use crate::error::{HostError, HostResult};

/// How the fake acknowledges an append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckMode {
    /// Report the real new offset.
    Exact,
    /// Omit the offset from the response.
    Missing,
    /// Accept the bytes but report the old offset.
    Stalled,
    /// Report one byte more than was sent.
    Overshoot,
    /// Keep only the first half of each payload, rounded up, and report
    /// that offset.
    Partial,
}

/// One recorded append call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendCall {
    pub upload_endpoint: String,
    pub offset: u64,
    pub len: usize,
}

#[derive(Debug)]
struct FakeState {
    approach: UploadApproach,
    ack_mode: AckMode,
    next_id: u64,
    /// endpoint -> display name of the session
    sessions: HashMap<String, String>,
    /// endpoint -> bytes held by the remote
    received: HashMap<String, Vec<u8>>,
    appends: Vec<AppendCall>,
    failing_names: HashSet<String>,
    session_failure: Option<u16>,
    probe_override: Option<u64>,
    statuses: VecDeque<ResourceStatus>,
    status_polls: u32,
    attached: Vec<(String, PathBuf)>,
    attach_failure: bool,
    folder: Option<String>,
    folder_lookups: u32,
    placements: Vec<Option<String>>,
}

/// In-memory hosting service.
#[derive(Debug)]
pub struct FakeHost {
    state: Mutex<FakeState>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                approach: UploadApproach::Tus,
                ack_mode: AckMode::Exact,
                next_id: 1,
                sessions: HashMap::new(),
                received: HashMap::new(),
                appends: Vec::new(),
                failing_names: HashSet::new(),
                session_failure: None,
                probe_override: None,
                statuses: VecDeque::new(),
                status_polls: 0,
                attached: Vec::new(),
                attach_failure: false,
                folder: None,
                folder_lookups: 0,
                placements: Vec::new(),
            }),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Offer `approach` on every new session.
    pub fn set_approach(&self, approach: UploadApproach) {
        self.state().approach = approach;
    }

    pub fn set_ack_mode(&self, mode: AckMode) {
        self.state().ack_mode = mode;
    }

    /// Reject session creation with the given HTTP status.
    pub fn fail_sessions_with(&self, status: u16) {
        self.state().session_failure = Some(status);
    }

    /// Every append to a session named `name` fails with a 500.
    pub fn fail_appends_for(&self, name: &str) {
        self.state().failing_names.insert(name.to_string());
    }

    /// Pretend the remote already holds `bytes` for `upload_endpoint`.
    pub fn seed_bytes(&self, upload_endpoint: &str, bytes: &[u8]) {
        self.state()
            .received
            .insert(upload_endpoint.to_string(), bytes.to_vec());
    }

    /// Report `offset` from every probe regardless of what was received.
    pub fn override_probe(&self, offset: u64) {
        self.state().probe_override = Some(offset);
    }

    /// Statuses returned by successive polls; `Ready` once exhausted.
    pub fn queue_statuses(&self, statuses: impl IntoIterator<Item = ResourceStatus>) {
        self.state().statuses.extend(statuses);
    }

    /// Return `status` for the next `polls` polls.
    pub fn repeat_status(&self, status: ResourceStatus, polls: usize) {
        self.state()
            .statuses
            .extend(std::iter::repeat(status).take(polls));
    }

    pub fn fail_attachments(&self) {
        self.state().attach_failure = true;
    }

    /// Folder returned by `resolve_folder`; lookups fail when unset.
    pub fn set_folder(&self, uri: &str) {
        self.state().folder = Some(uri.to_string());
    }

    pub fn appends(&self) -> Vec<AppendCall> {
        self.state().appends.clone()
    }

    pub fn received(&self, upload_endpoint: &str) -> Vec<u8> {
        self.state()
            .received
            .get(upload_endpoint)
            .cloned()
            .unwrap_or_default()
    }

    /// Bytes received for the session with display name `name`.
    pub fn received_for(&self, name: &str) -> Vec<u8> {
        let state = self.state();
        state
            .sessions
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .and_then(|(endpoint, _)| state.received.get(endpoint).cloned())
            .unwrap_or_default()
    }

    pub fn sessions_created(&self) -> usize {
        self.state().sessions.len()
    }

    pub fn status_polls(&self) -> u32 {
        self.state().status_polls
    }

    pub fn attached(&self) -> Vec<(String, PathBuf)> {
        self.state().attached.clone()
    }

    pub fn folder_lookups(&self) -> u32 {
        self.state().folder_lookups
    }

    /// Placement hints passed to each session, in creation order.
    pub fn placements(&self) -> Vec<Option<String>> {
        self.state().placements.clone()
    }
}

#[async_trait]
impl HostingApi for FakeHost {
    async fn create_upload_session(
        &self,
        request: &CreateSessionRequest,
    ) -> HostResult<SessionGrant> {
        let mut state = self.state();
        if let Some(status) = state.session_failure {
            return Err(HostError::from_http_status(status, "session rejected"));
        }

        let id = state.next_id;
        state.next_id += 1;
        state.placements.push(request.placement_hint.clone());

        let upload_endpoint = format!("fake://upload/{}", id);
        state
            .sessions
            .insert(upload_endpoint.clone(), request.name.clone());

        let approach = state.approach.clone();
        Ok(SessionGrant {
            upload_endpoint: approach.is_tus().then_some(upload_endpoint),
            resource_uri: format!("/videos/{}", id),
            approach,
        })
    }

    async fn probe_offset(&self, upload_endpoint: &str) -> HostResult<u64> {
        let state = self.state();
        if let Some(offset) = state.probe_override {
            return Ok(offset);
        }
        Ok(state
            .received
            .get(upload_endpoint)
            .map(|b| b.len() as u64)
            .unwrap_or(0))
    }

    async fn append_bytes(
        &self,
        upload_endpoint: &str,
        offset: u64,
        payload: Vec<u8>,
    ) -> HostResult<Option<u64>> {
        let mut state = self.state();
        state.appends.push(AppendCall {
            upload_endpoint: upload_endpoint.to_string(),
            offset,
            len: payload.len(),
        });

        let failing = state
            .sessions
            .get(upload_endpoint)
            .is_some_and(|name| state.failing_names.contains(name));
        if failing {
            return Err(HostError::from_http_status(500, "append rejected"));
        }

        let ack_mode = state.ack_mode;
        let held = state.received.entry(upload_endpoint.to_string()).or_default();
        if held.len() as u64 != offset {
            return Err(HostError::from_http_status(
                409,
                format!("offset {} does not match {}", offset, held.len()),
            ));
        }
        let kept = match ack_mode {
            AckMode::Partial => payload.len().div_ceil(2),
            _ => payload.len(),
        };
        held.extend_from_slice(&payload[..kept]);
        let new_offset = held.len() as u64;

        Ok(match ack_mode {
            AckMode::Exact | AckMode::Partial => Some(new_offset),
            AckMode::Missing => None,
            AckMode::Stalled => Some(offset),
            AckMode::Overshoot => Some(new_offset + 1),
        })
    }

    async fn resource_status(&self, _resource_uri: &str) -> HostResult<ResourceStatus> {
        let mut state = self.state();
        state.status_polls += 1;
        Ok(state.statuses.pop_front().unwrap_or(ResourceStatus::Ready))
    }

    async fn attach_side_asset(&self, resource_uri: &str, asset_path: &Path) -> HostResult<()> {
        let mut state = self.state();
        if state.attach_failure {
            return Err(HostError::from_http_status(500, "picture rejected"));
        }
        state
            .attached
            .push((resource_uri.to_string(), asset_path.to_path_buf()));
        Ok(())
    }

    async fn resolve_folder(&self, name: &str) -> HostResult<String> {
        let mut state = self.state();
        state.folder_lookups += 1;
        state
            .folder
            .clone()
            .ok_or_else(|| HostError::not_found(format!("folder {}", name)))
    }
}
