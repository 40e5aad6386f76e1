//! Job ledger contract and its SQLite implementation.

use async_trait::async_trait;
use metrics::counter;
use tracing::{debug, info};

use vmig_models::{Job, JobId, JobStatus, LedgerSummary};

use crate::error::{LedgerError, LedgerResult};
use crate::models::{now_millis, JobRow};
use crate::pool::{init_pool, LedgerPool};

/// Durable record of each source file's migration status.
///
/// Only the orchestrator writes; every mutation is a single statement.
#[async_trait]
pub trait JobLedger: Send + Sync {
    /// Insert a `pending` job unless one already exists for `filename`.
    ///
    /// Existing rows are never touched, whatever their status. Returns
    /// whether a row was inserted.
    async fn upsert_new(
        &self,
        filename: &str,
        side_asset_filename: Option<&str>,
    ) -> LedgerResult<bool>;

    async fn exists(&self, filename: &str) -> LedgerResult<bool>;

    async fn get(&self, filename: &str) -> LedgerResult<Option<Job>>;

    /// Jobs in `pending` or `failed`, oldest first.
    async fn list_retryable(&self) -> LedgerResult<Vec<Job>>;

    async fn mark_succeeded(&self, id: JobId, remote_id: &str, remote_uri: &str)
        -> LedgerResult<()>;

    async fn mark_failed(&self, id: JobId, error_message: &str) -> LedgerResult<()>;

    async fn summary(&self) -> LedgerResult<LedgerSummary>;
}

/// SQLx implementation of [`JobLedger`].
#[derive(Clone)]
pub struct SqliteJobLedger {
    pool: LedgerPool,
}

impl SqliteJobLedger {
    /// Wrap an already-migrated pool.
    pub fn new(pool: LedgerPool) -> Self {
        Self { pool }
    }

    /// Open the ledger at `database_url`, creating and migrating it if needed.
    pub async fn connect(database_url: &str) -> LedgerResult<Self> {
        let pool = init_pool(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Private in-memory ledger, mostly for tests.
    pub async fn in_memory() -> LedgerResult<Self> {
        Self::connect("sqlite::memory:").await
    }

    pub fn pool(&self) -> &LedgerPool {
        &self.pool
    }

    async fn get_by_id(&self, id: JobId) -> LedgerResult<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = ?")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Job::try_from).transpose()
    }

    /// Explain why a guarded update touched no row.
    async fn rejected_transition(&self, id: JobId, to: JobStatus) -> LedgerError {
        match self.get_by_id(id).await {
            Ok(Some(job)) => LedgerError::InvalidTransition {
                id: id.as_i64(),
                from: job.status.to_string(),
                to: to.to_string(),
            },
            Ok(None) => LedgerError::NotFound(id.as_i64()),
            Err(e) => e,
        }
    }
}

#[async_trait]
impl JobLedger for SqliteJobLedger {
    async fn upsert_new(
        &self,
        filename: &str,
        side_asset_filename: Option<&str>,
    ) -> LedgerResult<bool> {
        let now = now_millis();
        let result = sqlx::query(
            r#"
            INSERT INTO jobs (source_filename, side_asset_filename, status, created_at, updated_at)
            VALUES (?, ?, 'pending', ?, ?)
            ON CONFLICT(source_filename) DO NOTHING
            "#,
        )
        .bind(filename)
        .bind(side_asset_filename)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let inserted = result.rows_affected() > 0;
        if inserted {
            counter!("ledger_jobs_registered_total").increment(1);
            debug!(filename = %filename, "Registered new job");
        }
        Ok(inserted)
    }

    async fn exists(&self, filename: &str) -> LedgerResult<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT id FROM jobs WHERE source_filename = ?")
                .bind(filename)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }

    async fn get(&self, filename: &str) -> LedgerResult<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE source_filename = ?")
            .bind(filename)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Job::try_from).transpose()
    }

    async fn list_retryable(&self) -> LedgerResult<Vec<Job>> {
        let rows = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT * FROM jobs
            WHERE status IN ('pending', 'failed')
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Job::try_from).collect()
    }

    async fn mark_succeeded(
        &self,
        id: JobId,
        remote_id: &str,
        remote_uri: &str,
    ) -> LedgerResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE jobs SET
                status = 'uploaded',
                remote_id = ?,
                remote_uri = ?,
                error_message = NULL,
                updated_at = MAX(?, updated_at + 1)
            WHERE id = ? AND status IN ('pending', 'failed')
            "#,
        )
        .bind(remote_id)
        .bind(remote_uri)
        .bind(now_millis())
        .bind(id.as_i64())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.rejected_transition(id, JobStatus::Uploaded).await);
        }

        info!(job_id = %id, remote_uri = %remote_uri, "Ledger: job uploaded");
        Ok(())
    }

    async fn mark_failed(&self, id: JobId, error_message: &str) -> LedgerResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE jobs SET
                status = 'failed',
                remote_id = NULL,
                remote_uri = NULL,
                error_message = ?,
                updated_at = MAX(?, updated_at + 1)
            WHERE id = ? AND status IN ('pending', 'failed')
            "#,
        )
        .bind(error_message)
        .bind(now_millis())
        .bind(id.as_i64())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.rejected_transition(id, JobStatus::Failed).await);
        }

        info!(job_id = %id, "Ledger: job failed");
        Ok(())
    }

    async fn summary(&self) -> LedgerResult<LedgerSummary> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM jobs GROUP BY status")
                .fetch_all(&self.pool)
                .await?;

        let mut summary = LedgerSummary::default();
        for (status, count) in rows {
            let status: JobStatus = status.parse()?;
            summary.add(status, count.max(0) as u64);
        }
        Ok(summary)
    }
}
