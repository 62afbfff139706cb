//! Local-item manager: entries added or edited by hand.
//!
//! Local entries have no source, so reloading or unloading a data pack
//! never touches them. `put` is an upsert by `@id`: putting an entry that
//! already exists (local or loaded) rewrites it in place and leaves its
//! source attribution alone.

use serde_json::Value;
use tracing::info;

use crate::error::{Result, StoreError};
use crate::models::SortOrder;
use crate::store::{LocalPage, PutReport, Store};
use crate::validate::verify_input_data;

/// Reserved `@id` prefix of blank nodes.
pub const BLANK_NODE_PREFIX: &str = "_:";

/// Validate a data pack and upsert every entry.
pub async fn put<S: Store + ?Sized>(store: &S, data: &Value) -> Result<PutReport> {
    let entries = verify_input_data(data)?;
    let report = store.put_entries(&entries).await?;
    info!(created = report.created, updated = report.updated, "put local entries");
    Ok(report)
}

/// Delete the entry with this `@id`. Unknown ids are not an error.
pub async fn remove<S: Store + ?Sized>(store: &S, at_id: &str) -> Result<u64> {
    store.remove_entry(at_id).await
}

#[derive(Debug, Clone)]
pub struct LocalListing {
    /// Exact `@type` to keep.
    pub at_type: Option<String>,
    pub offset: i64,
    pub limit: i64,
    pub order: SortOrder,
}

impl Default for LocalListing {
    fn default() -> Self {
        Self {
            at_type: None,
            offset: 0,
            limit: 10,
            order: SortOrder::Asc,
        }
    }
}

/// One page of local payloads plus the total before pagination.
pub async fn list_local_items<S: Store + ?Sized>(
    store: &S,
    listing: &LocalListing,
) -> Result<LocalPage> {
    if listing.offset < 0 || listing.limit < 0 {
        return Err(StoreError::validation("offset and limit must not be negative"));
    }
    store
        .list_local(
            listing.at_type.as_deref(),
            listing.offset,
            listing.limit,
            listing.order,
        )
        .await
}

/// What [`cleanup`] removes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupPolicy {
    /// Local entries whose `@id` starts with this are deleted. `None` or an
    /// empty prefix disables the rule.
    pub blank_node_prefix: Option<String>,
    /// Delete sources left without entries.
    pub drop_empty_sources: bool,
}

impl Default for CleanupPolicy {
    fn default() -> Self {
        Self {
            blank_node_prefix: Some(BLANK_NODE_PREFIX.to_string()),
            drop_empty_sources: true,
        }
    }
}

impl From<&crate::config::CleanupConfig> for CleanupPolicy {
    fn from(config: &crate::config::CleanupConfig) -> Self {
        Self {
            blank_node_prefix: Some(config.blank_node_prefix.clone()).filter(|p| !p.is_empty()),
            drop_empty_sources: config.drop_empty_sources,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CleanupReport {
    pub entries_removed: u64,
    pub sources_removed: u64,
}

pub async fn cleanup<S: Store + ?Sized>(store: &S, policy: &CleanupPolicy) -> Result<CleanupReport> {
    let mut report = CleanupReport::default();

    if let Some(prefix) = policy.blank_node_prefix.as_deref().filter(|p| !p.is_empty()) {
        report.entries_removed = store.remove_local_with_prefix(prefix).await?;
    }
    if policy.drop_empty_sources {
        report.sources_removed = store.remove_empty_sources().await?;
    }

    info!(
        entries = report.entries_removed,
        sources = report.sources_removed,
        "cleanup finished"
    );
    Ok(report)
}
