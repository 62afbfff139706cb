//! Store statistics.
//!
//! A quick summary of what is stored: entry counts split into loaded and
//! local, source and type counts. Used by `dps stats` to check that loads
//! and edits landed where expected.

use crate::database::Database;
use crate::db::MEMORY_PATH;
use crate::error::Result;

pub async fn run_stats(db: &Database) -> Result<()> {
    let stats = db.stats().await?;
    let db_path = &db.config().db.path;

    println!("Data Pack Store Stats");
    println!("=====================");
    println!();
    println!("  Database:    {}", db_path.display());
    if db_path.as_os_str() != MEMORY_PATH {
        let size = std::fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);
        println!("  Size:        {}", format_bytes(size));
    }
    println!();
    println!("  Entries:     {}", stats.entries);
    println!("    loaded:    {}", stats.loaded);
    println!("    local:     {}", stats.local);
    println!("  Sources:     {}", stats.sources);
    println!("  Types:       {}", stats.types);
    println!();

    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
