use std::path::Path;

use vmig_host::HostConfig;
use vmig_ledger::{JobLedger, SqliteJobLedger};
use vmig_worker::{discover, WorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = WorkerConfig::from_env();

    println!(
        "vmig-selfcheck: starting with video_dir={} database_url={}",
        config.video_dir.display(),
        config.database_url
    );
    ensure_video_dir(&config.video_dir).await?;
    ensure_ledger(&config.database_url).await?;
    config.validate()?;
    HostConfig::from_env().map_err(|e| anyhow::anyhow!("hosting config invalid: {}", e))?;

    let candidates = discover(&config).await?;
    println!("vmig-selfcheck: {} source videos found", candidates.len());

    println!("vmig-selfcheck: ok");
    Ok(())
}

async fn ensure_video_dir(path: &Path) -> anyhow::Result<()> {
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|e| anyhow::anyhow!("video dir {} not readable: {}", path.display(), e))?;
    if !meta.is_dir() {
        return Err(anyhow::anyhow!("{} is not a directory", path.display()));
    }
    Ok(())
}

async fn ensure_ledger(database_url: &str) -> anyhow::Result<()> {
    let ledger = SqliteJobLedger::connect(database_url).await?;
    let summary = ledger.summary().await?;
    println!(
        "vmig-selfcheck: ledger has {} jobs ({} pending, {} failed)",
        summary.total(),
        summary.pending,
        summary.failed
    );
    Ok(())
}
