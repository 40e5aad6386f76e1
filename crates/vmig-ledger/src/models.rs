//! Row mapping between the `jobs` table and [`vmig_models::Job`].

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use vmig_models::{Job, JobId, JobStatus};

use crate::error::{LedgerError, LedgerResult};

/// Raw `jobs` row.
#[derive(Debug, Clone, FromRow)]
pub struct JobRow {
    pub id: i64,
    pub source_filename: String,
    pub side_asset_filename: Option<String>,
    pub remote_id: Option<String>,
    pub remote_uri: Option<String>,
    /// pending | uploaded | failed
    pub status: String,
    pub error_message: Option<String>,
    /// UTC milliseconds
    pub created_at: i64,
    /// UTC milliseconds
    pub updated_at: i64,
}

impl TryFrom<JobRow> for Job {
    type Error = LedgerError;

    fn try_from(row: JobRow) -> LedgerResult<Self> {
        let status: JobStatus = row.status.parse()?;
        Ok(Job {
            id: JobId(row.id),
            source_filename: row.source_filename,
            side_asset_filename: row.side_asset_filename,
            remote_id: row.remote_id,
            remote_uri: row.remote_uri,
            status,
            error_message: row.error_message,
            created_at: from_millis(row.created_at)?,
            updated_at: from_millis(row.updated_at)?,
        })
    }
}

/// Current time as stored in the ledger.
pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn from_millis(ms: i64) -> LedgerResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| LedgerError::corrupt(format!("timestamp out of range: {}", ms)))
}
