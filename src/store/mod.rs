//! Storage abstraction.
//!
//! The [`Store`] trait is the relational contract the engine consumes:
//! unique `@id`, upsert-on-conflict, cascade delete from a source to its
//! entries, and substring predicates built by [`Predicate`]. Two backends
//! implement it:
//!
//! | Backend | Module | Used for |
//! |---------|--------|----------|
//! | [`SqliteStore`] | [`sqlite`] | the `dps` binary and any on-disk store |
//! | [`InMemoryStore`] | [`memory`] | tests and embedding without a database file |
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::models::{
    Entry, EntrySummary, NewEntry, SortOrder, Source, SourceLocator, SourceSummary, StoreStats,
};
use crate::query::Predicate;

/// What a batch load did to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    /// The source row now owning the batch.
    pub source: Source,
    /// Entries held by the previous incarnation of the source, when it was
    /// deleted before the batch was written.
    pub replaced: Option<u64>,
    /// Entries written (inserted or updated).
    pub written: u64,
}

/// Counts of a local upsert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct PutReport {
    pub created: u64,
    pub updated: u64,
}

/// One page of local entries.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct LocalPage {
    /// Matching local entries before pagination.
    pub total: i64,
    /// Full payloads of the page.
    pub items: Vec<Value>,
}

/// Abstract storage backend.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`load_batch`](Store::load_batch) | Atomically (re)place a source and upsert its chunks |
/// | [`put_entries`](Store::put_entries) | Upsert local entries by `@id` |
/// | [`remove_entry`](Store::remove_entry) | Delete one entry by `@id` |
/// | [`find_entries`](Store::find_entries) | Predicate lookup, ordered by name |
/// | [`get_entry`](Store::get_entry) | Full row by `@id` |
/// | [`list_local`](Store::list_local) | Paginated local payloads |
#[async_trait]
pub trait Store: Send + Sync {
    /// Write a validated batch for `locator` as one atomic unit.
    ///
    /// If the source exists and `delete_on_reload` is set, it is deleted
    /// first together with its entries; otherwise it is reused. Each chunk
    /// is written as one bulk upsert keyed on `@id`. Written rows are
    /// attributed to the source, except rows that were already local: they
    /// take the new fields but stay local.
    async fn load_batch(
        &self,
        locator: &SourceLocator,
        chunks: &[&[NewEntry]],
        delete_on_reload: bool,
    ) -> Result<BatchOutcome>;

    /// Upsert entries by `@id`. New rows are local; existing rows keep
    /// their source.
    async fn put_entries(&self, entries: &[NewEntry]) -> Result<PutReport>;

    /// Delete the entry with this `@id`, returning rows removed (0 or 1).
    async fn remove_entry(&self, at_id: &str) -> Result<u64>;

    async fn find_entries(&self, predicate: &Predicate, limit: i64) -> Result<Vec<EntrySummary>>;

    async fn get_entry(&self, at_id: &str) -> Result<Option<Entry>>;

    /// Distinct `@type` values; order is not guaranteed.
    async fn distinct_types(&self) -> Result<Vec<String>>;

    /// Local entries, optionally of exactly `at_type`, ordered by name.
    async fn list_local(
        &self,
        at_type: Option<&str>,
        offset: i64,
        limit: i64,
        order: SortOrder,
    ) -> Result<LocalPage>;

    /// Delete local entries whose `@id` starts with `prefix`.
    async fn remove_local_with_prefix(&self, prefix: &str) -> Result<u64>;

    /// Delete sources that own no entries.
    async fn remove_empty_sources(&self) -> Result<u64>;

    async fn find_source(&self, locator: &SourceLocator) -> Result<Option<Source>>;

    async fn list_sources(&self) -> Result<Vec<SourceSummary>>;

    /// Delete a source and its entries. `None` when the source is unknown.
    async fn delete_source(&self, locator: &SourceLocator) -> Result<Option<u64>>;

    async fn stats(&self) -> Result<StoreStats>;

    /// Release backend resources. The default does nothing.
    async fn close(&self) {}
}
