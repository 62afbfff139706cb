//! Output for the `dps` entry-level commands.
//!
//! Listings print one line per entry for people; `--json` switches to a
//! JSON document on stdout for scripts.

use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::database::Database;
use crate::error::Result;
use crate::ingest;
use crate::local::{CleanupPolicy, LocalListing};
use crate::models::SourceLocator;
use crate::query::EntryQuery;

pub async fn run_load(
    db: &Database,
    file: Option<PathBuf>,
    url: Option<String>,
    chunk_size: Option<usize>,
    keep: bool,
) -> Result<()> {
    let mut request = db.load_request(file, url);
    if let Some(size) = chunk_size {
        request.chunk_size = size;
    }
    if keep {
        request.delete_on_reload = false;
    }

    let report = db.load(&request).await?;
    println!("load {}", report.source.locator);
    println!("  entries: {}", report.entries);
    println!("  chunks: {}", report.chunks);
    if let Some(n) = report.replaced {
        println!("  replaced: {}", n);
    }
    println!("ok");
    Ok(())
}

pub async fn run_query(db: &Database, query: &EntryQuery, json: bool) -> Result<()> {
    let results = db.query(query).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }
    for (i, r) in results.iter().enumerate() {
        println!("{}. {} [{}] {}", i + 1, r.name, r.at_type, r.at_id);
    }
    Ok(())
}

pub async fn run_get(db: &Database, at_id: &str) -> Result<()> {
    let data = db.get(at_id).await?;
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

pub async fn run_types(db: &Database) -> Result<()> {
    for t in db.get_types().await? {
        println!("{}", t);
    }
    Ok(())
}

pub async fn run_put(db: &Database, file: &Path) -> Result<()> {
    let data: Value = ingest::read_data_pack(file).await?;
    let report = db.put(&data).await?;
    println!("put {}", file.display());
    println!("  created: {}", report.created);
    println!("  updated: {}", report.updated);
    println!("ok");
    Ok(())
}

pub async fn run_remove(db: &Database, at_id: &str) -> Result<()> {
    let removed = db.remove(at_id).await?;
    println!("removed: {}", removed);
    Ok(())
}

pub async fn run_list_local(db: &Database, listing: &LocalListing) -> Result<()> {
    let page = db.list_local_items(listing).await?;
    println!("{}", serde_json::to_string_pretty(&page)?);
    Ok(())
}

pub async fn run_cleanup(
    db: &Database,
    prefix: Option<String>,
    keep_empty_sources: bool,
) -> Result<()> {
    let mut policy = CleanupPolicy::from(&db.config().cleanup);
    if prefix.is_some() {
        policy.blank_node_prefix = prefix;
    }
    if keep_empty_sources {
        policy.drop_empty_sources = false;
    }

    let report = db.cleanup_with(&policy).await?;
    println!("cleanup");
    println!("  entries removed: {}", report.entries_removed);
    println!("  sources removed: {}", report.sources_removed);
    Ok(())
}

pub async fn run_unload(db: &Database, locator: &SourceLocator) -> Result<()> {
    let removed = db.unload(locator).await?;
    println!("unload {}", locator);
    println!("  entries removed: {}", removed);
    Ok(())
}
