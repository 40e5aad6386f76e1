//! Worker configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use vmig_transfer::{TransferConfig, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL};

use crate::error::{WorkerError, WorkerResult};

const DEFAULT_VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "mkv", "avi", "webm"];

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Directory scanned for source videos (non-recursive)
    pub video_dir: PathBuf,
    /// Ledger location, e.g. `sqlite:migration.db`
    pub database_url: String,
    /// Maximum bytes per append
    pub chunk_size: u64,
    /// Fail chunks whose append response carries no offset
    pub strict_acks: bool,
    /// Wait for remote processing before marking a job uploaded
    pub wait_for_ready: bool,
    /// Delay between readiness polls
    pub ready_poll_interval: Duration,
    /// Readiness polls before giving up
    pub ready_max_attempts: u32,
    /// Folder every upload is placed in
    pub folder_name: Option<String>,
    /// Lowercase extensions treated as source videos
    pub video_extensions: Vec<String>,
    /// Extension of the picture uploaded alongside each video
    pub companion_extension: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            video_dir: PathBuf::from("./videos"),
            database_url: "sqlite:migration.db".to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            strict_acks: false,
            wait_for_ready: false,
            ready_poll_interval: DEFAULT_POLL_INTERVAL,
            ready_max_attempts: DEFAULT_MAX_ATTEMPTS,
            folder_name: None,
            video_extensions: DEFAULT_VIDEO_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            companion_extension: "jpg".to_string(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            video_dir: std::env::var("VIDEO_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.video_dir),
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            chunk_size: env_parse("UPLOAD_CHUNK_SIZE").unwrap_or(defaults.chunk_size),
            strict_acks: env_flag("UPLOAD_STRICT_ACKS").unwrap_or(defaults.strict_acks),
            wait_for_ready: env_flag("READY_WAIT").unwrap_or(defaults.wait_for_ready),
            ready_poll_interval: env_parse("READY_POLL_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.ready_poll_interval),
            ready_max_attempts: env_parse("READY_MAX_ATTEMPTS")
                .unwrap_or(defaults.ready_max_attempts),
            folder_name: std::env::var("VIMEO_FOLDER")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            video_extensions: std::env::var("VIDEO_EXTENSIONS")
                .ok()
                .map(|s| parse_extensions(&s))
                .filter(|exts| !exts.is_empty())
                .unwrap_or(defaults.video_extensions),
            companion_extension: std::env::var("COMPANION_EXTENSION")
                .ok()
                .map(|s| s.trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.companion_extension),
        }
    }

    /// Reject settings no run can work with.
    pub fn validate(&self) -> WorkerResult<()> {
        if self.chunk_size == 0 {
            return Err(WorkerError::config_error(
                "UPLOAD_CHUNK_SIZE must be greater than zero",
            ));
        }
        if self.video_extensions.is_empty() {
            return Err(WorkerError::config_error("no video extensions configured"));
        }
        Ok(())
    }

    pub fn transfer_config(&self) -> TransferConfig {
        TransferConfig {
            chunk_size: self.chunk_size,
            strict_acks: self.strict_acks,
        }
    }

    /// Whether `filename` has one of the configured video extensions.
    pub fn is_video(&self, filename: &str) -> bool {
        match filename.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => {
                let ext = ext.to_ascii_lowercase();
                self.video_extensions.iter().any(|e| *e == ext)
            }
            _ => false,
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn env_flag(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|s| match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

/// `"MP4, .mov,,mkv"` -> `["mp4", "mov", "mkv"]`
fn parse_extensions(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}
