use tracing::info;

use crate::database::Database;
use crate::error::Result;
use crate::models::{SourceLocator, SourceSummary};
use crate::store::Store;

pub async fn list_sources<S: Store + ?Sized>(store: &S) -> Result<Vec<SourceSummary>> {
    store.list_sources().await
}

/// Delete a source and all of its entries. Returns the number of entries
/// removed; an unknown source removes nothing.
pub async fn unload<S: Store + ?Sized>(store: &S, locator: &SourceLocator) -> Result<u64> {
    let removed = store.delete_source(locator).await?;
    match removed {
        Some(n) => info!(source = %locator, entries = n, "unloaded source"),
        None => info!(source = %locator, "no such source"),
    }
    Ok(removed.unwrap_or(0))
}

pub async fn run_sources(db: &Database) -> Result<()> {
    let sources = db.list_sources().await?;
    if sources.is_empty() {
        println!("No sources loaded.");
        return Ok(());
    }

    println!("{:<6} {:>8}   {:<17} LOCATION", "KIND", "ENTRIES", "LOADED");
    for s in &sources {
        let loaded = chrono::DateTime::from_timestamp(s.source.created_at, 0)
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| s.source.created_at.to_string());
        println!(
            "{:<6} {:>8}   {:<17} {}",
            s.source.locator.column(),
            s.entry_count,
            loaded,
            s.source.locator.value()
        );
    }
    Ok(())
}
