//! Structured job logging utilities.
//!
//! Every migration attempt logs through a [`JobLogger`] so that lines from
//! one job can be filtered by `job_id` or `source` regardless of format.

use tracing::{error, info, warn, Span};
use vmig_models::JobId;

/// Job logger stamping ledger id, source file and operation on every event.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: i64,
    source: String,
    operation: &'static str,
}

impl JobLogger {
    /// # Arguments
    /// * `job_id` - Ledger id of the job
    /// * `source` - Source filename, relative to the video directory
    /// * `operation` - e.g. `"migrate"`
    pub fn new(job_id: JobId, source: &str, operation: &'static str) -> Self {
        Self {
            job_id: job_id.as_i64(),
            source: source.to_string(),
            operation,
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            job_id = self.job_id,
            source = %self.source,
            operation = self.operation,
            "Job started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            job_id = self.job_id,
            source = %self.source,
            operation = self.operation,
            "Job progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            job_id = self.job_id,
            source = %self.source,
            operation = self.operation,
            "Job warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            job_id = self.job_id,
            source = %self.source,
            operation = self.operation,
            "Job error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            job_id = self.job_id,
            source = %self.source,
            operation = self.operation,
            "Job completed: {}", message
        );
    }

    pub fn job_id(&self) -> i64 {
        self.job_id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Span that transfer and host events of this job nest under.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            job_id = self.job_id,
            source = %self.source,
            operation = self.operation
        )
    }
}
