//! SQLite pool construction.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use tracing::info;

use crate::error::LedgerResult;

/// Ledger connection pool type alias.
pub type LedgerPool = Pool<Sqlite>;

/// Default busy timeout in milliseconds.
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 30_000;

/// The orchestrator is the only writer; a small pool is enough.
const DEFAULT_MAX_CONNECTIONS: u32 = 4;

/// Open (creating if missing) the ledger database and run migrations.
///
/// # Arguments
/// * `database_url` - SQLite URL, e.g. `sqlite:migration.db` or `sqlite::memory:`
pub async fn init_pool(database_url: &str) -> LedgerResult<LedgerPool> {
    // Each in-memory connection is its own database, so pin to one.
    let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
    let max_connections = if in_memory { 1 } else { DEFAULT_MAX_CONNECTIONS };

    let connect_options = SqliteConnectOptions::from_str(database_url)?
        .journal_mode(if in_memory {
            SqliteJournalMode::Memory
        } else {
            SqliteJournalMode::Wal
        })
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        // Keep the in-memory database alive for the lifetime of the pool.
        .min_connections(if in_memory { 1 } else { 0 })
        .idle_timeout(if in_memory { None } else { Some(Duration::from_secs(600)) })
        .max_lifetime(if in_memory { None } else { Some(Duration::from_secs(1800)) })
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(connect_options)
        .await?;

    run_migrations(&pool).await?;

    info!(
        "Ledger pool initialized ({}, {} max connections)",
        if in_memory { "in-memory" } else { "wal" },
        max_connections
    );

    Ok(pool)
}

/// Apply the embedded schema migrations.
pub async fn run_migrations(pool: &LedgerPool) -> LedgerResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
