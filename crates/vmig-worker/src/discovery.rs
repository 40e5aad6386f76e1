//! Source discovery and ledger registration.

use std::path::Path;

use tracing::{debug, info, warn};

use vmig_ledger::JobLedger;
use vmig_models::companion_filename;

use crate::config::WorkerConfig;
use crate::error::WorkerResult;

/// A source video found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub source_filename: String,
    /// Companion picture present next to the video
    pub side_asset_filename: Option<String>,
}

/// Outcome of one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Videos found on disk
    pub discovered: usize,
    /// Videos that were new to the ledger
    pub registered: usize,
}

/// List source videos in `config.video_dir`, sorted by filename.
///
/// Only regular files directly inside the directory are considered.
pub async fn discover(config: &WorkerConfig) -> WorkerResult<Vec<Candidate>> {
    let mut entries = tokio::fs::read_dir(&config.video_dir).await?;
    let mut names = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) if config.is_video(&name) => names.push(name),
            Ok(_) => {}
            Err(raw) => warn!(file = ?raw, "Skipping file with a non UTF-8 name"),
        }
    }
    names.sort();

    let mut candidates = Vec::with_capacity(names.len());
    for name in names {
        let side = companion_filename(&name, &config.companion_extension);
        let side_asset_filename = is_file(&config.video_dir.join(&side)).await.then_some(side);
        candidates.push(Candidate {
            source_filename: name,
            side_asset_filename,
        });
    }

    Ok(candidates)
}

/// Register every discovered video as a `pending` job.
///
/// Files already in the ledger keep their row untouched, so running a scan
/// twice registers nothing the second time.
pub async fn scan_and_register<L>(ledger: &L, config: &WorkerConfig) -> WorkerResult<ScanReport>
where
    L: JobLedger + ?Sized,
{
    let candidates = discover(config).await?;
    let mut report = ScanReport {
        discovered: candidates.len(),
        registered: 0,
    };

    for candidate in &candidates {
        let inserted = ledger
            .upsert_new(
                &candidate.source_filename,
                candidate.side_asset_filename.as_deref(),
            )
            .await?;
        if inserted {
            report.registered += 1;
            debug!(source = %candidate.source_filename, "Registered new job");
        }
    }

    info!(
        video_dir = %config.video_dir.display(),
        discovered = report.discovered,
        registered = report.registered,
        "Scan complete"
    );

    Ok(report)
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}
