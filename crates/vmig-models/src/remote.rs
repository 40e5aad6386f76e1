//! Remote-side states reported by the hosting service.

use std::fmt;

/// Upload approach offered by the remote when a session is created.
///
/// Only the append-based resumable approach is spoken by the transfer client;
/// every other value is kept verbatim so it can be reported and rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UploadApproach {
    /// tus 1.0.0 resumable append
    Tus,
    /// Anything else (`post`, `pull`, `streaming`, ...)
    Unsupported(String),
}

impl UploadApproach {
    /// Wire value the client requests.
    pub const TUS: &'static str = "tus";

    /// Parse the approach string returned by the remote.
    pub fn from_wire(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case(Self::TUS) {
            UploadApproach::Tus
        } else {
            UploadApproach::Unsupported(value.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            UploadApproach::Tus => Self::TUS,
            UploadApproach::Unsupported(mode) => mode,
        }
    }

    pub fn is_tus(&self) -> bool {
        matches!(self, UploadApproach::Tus)
    }
}

impl fmt::Display for UploadApproach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Post-transfer processing state of a remote resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceStatus {
    /// Remote is still processing the uploaded bytes
    Processing,
    /// Resource is usable
    Ready,
    /// Remote processing failed
    Error,
    /// A state this client does not know; treated like `Processing`
    Unknown(String),
}

impl ResourceStatus {
    /// Map a transcode status string (`in_progress`, `complete`, `error`).
    pub fn from_transcode(value: &str) -> Self {
        match value {
            "complete" | "available" | "ready" => ResourceStatus::Ready,
            "in_progress" | "processing" | "uploading" | "transcoding" => ResourceStatus::Processing,
            "error" | "upload_error" | "transcode_starting_error" | "uploading_error" => {
                ResourceStatus::Error
            }
            other => ResourceStatus::Unknown(other.to_string()),
        }
    }

    /// `Ready` and `Error` end a readiness wait.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ResourceStatus::Ready | ResourceStatus::Error)
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceStatus::Processing => write!(f, "processing"),
            ResourceStatus::Ready => write!(f, "ready"),
            ResourceStatus::Error => write!(f, "error"),
            ResourceStatus::Unknown(s) => write!(f, "unknown({})", s),
        }
    }
}
