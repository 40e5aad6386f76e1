//! Video migration binary.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vmig_host::HostClient;
use vmig_ledger::{JobLedger, SqliteJobLedger};
use vmig_worker::{scan_and_register, Migrator, WorkerConfig, WorkerError, WorkerResult};

/// Exit code after Ctrl-C, as a shell reports SIGINT.
const EXIT_INTERRUPTED: i32 = 130;

#[derive(Parser)]
#[command(author, version, about = "Resumable migration of local videos to a hosting service", long_about = None)]
struct Cli {
    /// Directory holding the source videos (overrides VIDEO_DIR)
    #[arg(long, global = true)]
    video_dir: Option<PathBuf>,

    /// Ledger database URL (overrides DATABASE_URL)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register new videos in the ledger without uploading
    Scan,
    /// Upload every pending or failed video
    Migrate {
        /// Skip the discovery pass and only work the existing ledger
        #[arg(long)]
        no_scan: bool,
    },
    /// Print ledger counts by status
    Status,
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("rustls crypto provider already installed");
    }

    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let mut config = WorkerConfig::from_env();
    if let Some(dir) = cli.video_dir {
        config.video_dir = dir;
    }
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }

    let code = match run_command(cli.command, config).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            1
        }
    };
    std::process::exit(code);
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

async fn run_command(command: Commands, config: WorkerConfig) -> WorkerResult<i32> {
    config.validate()?;
    let ledger = SqliteJobLedger::connect(&config.database_url).await?;

    match command {
        Commands::Scan => {
            let report = scan_and_register(&ledger, &config).await?;
            println!(
                "discovered {} videos, registered {} new",
                report.discovered, report.registered
            );
            Ok(0)
        }
        Commands::Migrate { no_scan } => {
            if !no_scan {
                scan_and_register(&ledger, &config).await?;
            }

            let host = HostClient::from_env()?;
            info!(
                video_dir = %config.video_dir.display(),
                chunk_size = config.chunk_size,
                wait_for_ready = config.wait_for_ready,
                "Starting vmig"
            );
            let migrator = Migrator::new(Arc::new(host), Arc::new(ledger), config)?;

            // Dropping the run future abandons the in-flight request. The remote
            // keeps every confirmed byte and the next run resumes from there.
            tokio::select! {
                result = migrator.run() => {
                    let report = result?;
                    println!(
                        "attempted {}, uploaded {}, failed {}",
                        report.attempted, report.uploaded, report.failed
                    );
                    Ok(0)
                }
                signal = tokio::signal::ctrl_c() => {
                    signal.map_err(WorkerError::Io)?;
                    warn!("Interrupted; unfinished jobs will resume on the next run");
                    Ok(EXIT_INTERRUPTED)
                }
            }
        }
        Commands::Status => {
            let summary = ledger.summary().await?;
            println!("pending:  {}", summary.pending);
            println!("uploaded: {}", summary.uploaded);
            println!("failed:   {}", summary.failed);
            println!("total:    {}", summary.total());
            Ok(0)
        }
    }
}
