use sqlx::SqlitePool;
use tracing::debug;

use crate::error::Result;

/// Create the schema. Safe to run on every start.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    // Exactly one of file / url identifies a source
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sources (
            id TEXT PRIMARY KEY,
            file TEXT UNIQUE,
            url TEXT UNIQUE,
            created_at INTEGER NOT NULL,
            CHECK ((file IS NULL) <> (url IS NULL))
        )
        "#,
    )
    .execute(pool)
    .await?;

    // A NULL source_id marks a local entry
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS entries (
            id TEXT PRIMARY KEY,
            at_id TEXT NOT NULL UNIQUE,
            at_type TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            data TEXT NOT NULL DEFAULT '{}',
            source_id TEXT REFERENCES sources(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    for statement in [
        "CREATE INDEX IF NOT EXISTS idx_entries_type ON entries(at_type)",
        "CREATE INDEX IF NOT EXISTS idx_entries_type_id ON entries(at_type, at_id)",
        "CREATE INDEX IF NOT EXISTS idx_entries_type_name ON entries(at_type, name)",
        "CREATE INDEX IF NOT EXISTS idx_entries_type_description ON entries(at_type, description)",
        "CREATE INDEX IF NOT EXISTS idx_entries_source_id ON entries(source_id)",
    ] {
        sqlx::query(statement).execute(pool).await?;
    }

    debug!("schema up to date");
    Ok(())
}
