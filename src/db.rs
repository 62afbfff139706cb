//! SQLite database connection management.
//!
//! Provides a connection pool to the SQLite database with WAL mode
//! enabled for concurrent read/write. Foreign keys are switched on for
//! every connection so deleting a source cascades to its entries.
//!
//! The path `:memory:` opens a private in-memory database. Such a database
//! lives inside a single connection, so the pool is pinned to exactly one
//! connection that is never recycled.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::config::Config;
use crate::error::Result;

pub const MEMORY_PATH: &str = ":memory:";

/// Create a connection pool to the configured SQLite database.
pub async fn connect(config: &Config) -> Result<SqlitePool> {
    connect_path(&config.db.path).await
}

/// Create a connection pool for the database file at `db_path`.
///
/// Creates the file and its parent directories if they don't exist.
pub async fn connect_path(db_path: &Path) -> Result<SqlitePool> {
    if db_path.as_os_str() == MEMORY_PATH {
        return connect_memory().await;
    }

    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Open a private in-memory database.
pub async fn connect_memory() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(1)
        .idle_timeout(None::<Duration>)
        .max_lifetime(None::<Duration>)
        .connect_with(options)
        .await?;

    Ok(pool)
}
