//! Ledger job definitions.
//!
//! A [`Job`] is one source-file-to-remote-upload unit of work together with
//! its persisted outcome. The ledger assigns the numeric id on first insert.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ledger-assigned job identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub i64);

impl JobId {
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for JobId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Migration status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Discovered, not yet attempted (or reset manually)
    #[default]
    Pending,
    /// Transfer completed and recorded
    Uploaded,
    /// Last attempt failed; eligible for retry on the next run
    Failed,
}

impl JobStatus {
    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Uploaded => "uploaded",
            JobStatus::Failed => "failed",
        }
    }

    /// `uploaded` never transitions again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Uploaded)
    }

    /// Whether a run should pick this job up.
    pub fn is_retryable(&self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a stored status string is not a known [`JobStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown job status: {0}")]
pub struct ParseJobStatusError(pub String);

impl FromStr for JobStatus {
    type Err = ParseJobStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "uploaded" => Ok(JobStatus::Uploaded),
            "failed" => Ok(JobStatus::Failed),
            other => Err(ParseJobStatusError(other.to_string())),
        }
    }
}

/// One row of the job ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Ledger-assigned id
    pub id: JobId,

    /// Local file this job uploads (unique across the ledger)
    pub source_filename: String,

    /// Companion image associated by naming convention
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side_asset_filename: Option<String>,

    /// Remote identifier, set only once uploaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,

    /// Remote resource URI, set only once uploaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_uri: Option<String>,

    /// Migration status
    #[serde(default)]
    pub status: JobStatus,

    /// Error message of the last failed attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Discovery timestamp
    pub created_at: DateTime<Utc>,

    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Check the remote-identity invariant: identifiers are present iff uploaded.
    pub fn is_consistent(&self) -> bool {
        let has_remote = self.remote_id.is_some() && self.remote_uri.is_some();
        let has_none = self.remote_id.is_none() && self.remote_uri.is_none();
        match self.status {
            JobStatus::Uploaded => has_remote,
            JobStatus::Pending | JobStatus::Failed => has_none,
        }
    }
}

/// Per-status job counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub pending: u64,
    pub uploaded: u64,
    pub failed: u64,
}

impl LedgerSummary {
    pub fn total(&self) -> u64 {
        self.pending + self.uploaded + self.failed
    }

    /// Add `count` jobs in `status` to the summary.
    pub fn add(&mut self, status: JobStatus, count: u64) {
        match status {
            JobStatus::Pending => self.pending += count,
            JobStatus::Uploaded => self.uploaded += count,
            JobStatus::Failed => self.failed += count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(status: JobStatus) -> Job {
        let now = Utc::now();
        Job {
            id: JobId(1),
            source_filename: "clip.mp4".into(),
            side_asset_filename: None,
            remote_id: None,
            remote_uri: None,
            status,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [JobStatus::Pending, JobStatus::Uploaded, JobStatus::Failed] {
            assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
        }
        assert!("processing".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&JobStatus::Uploaded).unwrap();
        assert_eq!(json, "\"uploaded\"");
    }

    #[test]
    fn test_retry_eligibility() {
        assert!(JobStatus::Pending.is_retryable());
        assert!(JobStatus::Failed.is_retryable());
        assert!(!JobStatus::Uploaded.is_retryable());
        assert!(JobStatus::Uploaded.is_terminal());
    }

    #[test]
    fn test_remote_identity_invariant() {
        let mut j = job(JobStatus::Pending);
        assert!(j.is_consistent());

        j.status = JobStatus::Uploaded;
        assert!(!j.is_consistent());

        j.remote_id = Some("123".into());
        j.remote_uri = Some("/videos/123".into());
        assert!(j.is_consistent());

        j.status = JobStatus::Failed;
        assert!(!j.is_consistent());
    }

    #[test]
    fn test_summary_total() {
        let mut summary = LedgerSummary::default();
        summary.add(JobStatus::Pending, 2);
        summary.add(JobStatus::Failed, 1);
        summary.add(JobStatus::Uploaded, 4);
        assert_eq!(summary.total(), 7);
        assert_eq!(summary.uploaded, 4);
    }
}
