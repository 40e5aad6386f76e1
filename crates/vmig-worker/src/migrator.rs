//! Migration orchestrator.
//!
//! Drives each retryable job through one transfer attempt and records the
//! outcome in the ledger:
//!
//! ```text
//! pending ──success──> uploaded   (terminal)
//! pending ──failure──> failed
//! failed  ──success──> uploaded
//! failed  ──failure──> failed     (message replaced)
//! ```
//!
//! Jobs run one at a time in ledger order. A job-local failure is recorded
//! and the batch moves on; a ledger failure ends the run.

use std::sync::Arc;

use metrics::counter;
use tracing::{info, warn, Instrument};

use vmig_host::HostingApi;
use vmig_ledger::JobLedger;
use vmig_models::{remote_id_from_uri, Job};
use vmig_transfer::{ReadinessWaiter, TransferClient, TransferError};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;

/// Per-run state resolved once before the first job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunContext {
    /// Folder URI uploads are placed in
    pub folder_uri: Option<String>,
}

/// Counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub attempted: usize,
    pub uploaded: usize,
    pub failed: usize,
}

/// Remote identity of a finished upload.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Uploaded {
    remote_id: String,
    remote_uri: String,
}

/// Orchestrates one migration run.
pub struct Migrator<A, L: ?Sized> {
    api: Arc<A>,
    ledger: Arc<L>,
    transfer: TransferClient<A>,
    readiness: ReadinessWaiter<A>,
    config: WorkerConfig,
}

impl<A, L> Migrator<A, L>
where
    A: HostingApi,
    L: JobLedger + ?Sized,
{
    pub fn new(api: Arc<A>, ledger: Arc<L>, config: WorkerConfig) -> WorkerResult<Self> {
        let transfer = TransferClient::new(Arc::clone(&api), config.transfer_config())?;
        let readiness = ReadinessWaiter::new(Arc::clone(&api));

        Ok(Self {
            api,
            ledger,
            transfer,
            readiness,
            config,
        })
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Resolve the placement folder. Failure only costs placement.
    pub async fn resolve_context(&self) -> RunContext {
        let Some(name) = self.config.folder_name.as_deref() else {
            return RunContext::default();
        };

        match self.api.resolve_folder(name).await {
            Ok(uri) => {
                info!(folder = %name, uri = %uri, "Uploads will be placed in folder");
                RunContext {
                    folder_uri: Some(uri),
                }
            }
            Err(e) => {
                warn!(folder = %name, "Could not resolve folder, uploading without placement: {}", e);
                RunContext::default()
            }
        }
    }

    /// Attempt every `pending` and `failed` job once, oldest first.
    pub async fn run(&self) -> WorkerResult<RunReport> {
        let ctx = self.resolve_context().await;
        let jobs = self.ledger.list_retryable().await?;
        info!(jobs = jobs.len(), "Starting migration run");

        let mut report = RunReport::default();
        for job in &jobs {
            report.attempted += 1;
            if self.process_job(job, &ctx).await? {
                report.uploaded += 1;
            } else {
                report.failed += 1;
            }
        }

        info!(
            attempted = report.attempted,
            uploaded = report.uploaded,
            failed = report.failed,
            "Migration run finished"
        );
        Ok(report)
    }

    /// Run one attempt for `job` and record its outcome.
    ///
    /// Returns whether the job ended `uploaded`. Only ledger errors escape.
    pub async fn process_job(&self, job: &Job, ctx: &RunContext) -> WorkerResult<bool> {
        let logger = JobLogger::new(job.id, &job.source_filename, "migrate");
        logger.log_start(&format!("attempting {} (status {})", job.source_filename, job.status));

        let outcome = self
            .attempt(job, ctx, &logger)
            .instrument(logger.create_span())
            .await;

        match outcome {
            Ok(uploaded) => {
                self.ledger
                    .mark_succeeded(job.id, &uploaded.remote_id, &uploaded.remote_uri)
                    .await?;
                counter!("migration_jobs_total", "outcome" => "uploaded").increment(1);
                logger.log_completion(&format!("uploaded as {}", uploaded.remote_uri));
                Ok(true)
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                let message = e.to_string();
                self.ledger.mark_failed(job.id, &message).await?;
                counter!("migration_jobs_total", "outcome" => "failed").increment(1);
                logger.log_error(&message);
                Ok(false)
            }
        }
    }

    async fn attempt(
        &self,
        job: &Job,
        ctx: &RunContext,
        logger: &JobLogger,
    ) -> WorkerResult<Uploaded> {
        let path = self.config.video_dir.join(&job.source_filename);
        let size = match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => meta.len(),
            Ok(_) => return Err(WorkerError::MissingFile(path)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(WorkerError::MissingFile(path))
            }
            Err(e) => return Err(e.into()),
        };

        let mut session = self
            .transfer
            .create_session(size, &job.source_filename, ctx.folder_uri.as_deref())
            .await?;
        let remote_uri = self.transfer.upload(&path, &mut session).await?;
        logger.log_progress(&format!("transferred {} bytes", size));

        let remote_id = remote_id_from_uri(&remote_uri).ok_or_else(|| {
            TransferError::protocol_mismatch(format!(
                "resource URI {:?} has no id segment",
                remote_uri
            ))
        })?;

        if self.config.wait_for_ready {
            self.readiness
                .wait_until_ready(
                    &remote_uri,
                    self.config.ready_poll_interval,
                    self.config.ready_max_attempts,
                )
                .await?;
            logger.log_progress("remote processing complete");
        }

        if let Some(side) = job.side_asset_filename.as_deref() {
            self.attach_side_asset(&remote_uri, side, logger).await;
        }

        Ok(Uploaded {
            remote_id,
            remote_uri,
        })
    }

    /// Best effort: a missing or rejected picture never fails the job.
    async fn attach_side_asset(&self, remote_uri: &str, side: &str, logger: &JobLogger) {
        let path = self.config.video_dir.join(side);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            logger.log_warning(&format!("companion {} not found, skipping", side));
            return;
        }

        match self.api.attach_side_asset(remote_uri, &path).await {
            Ok(()) => logger.log_progress(&format!("attached {}", side)),
            Err(e) => logger.log_warning(&format!("could not attach {}: {}", side, e)),
        }
    }
}
