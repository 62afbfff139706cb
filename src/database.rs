//! The store handle.
//!
//! A [`Database`] is built once at startup and owns the storage backend,
//! the HTTP client for URL loads, and the configuration defaults. Every
//! engine operation borrows its store from here; there is no global state.

use serde_json::Value;
use std::path::PathBuf;

use crate::config::Config;
use crate::db;
use crate::error::Result;
use crate::ingest::{self, LoadReport, LoadRequest};
use crate::local::{self, CleanupPolicy, CleanupReport, LocalListing};
use crate::models::{EntrySummary, SourceLocator, SourceSummary, StoreStats};
use crate::query::{self, EntryQuery};
use crate::sources;
use crate::store::{InMemoryStore, LocalPage, PutReport, SqliteStore, Store};

pub struct Database {
    store: Box<dyn Store>,
    http: reqwest::Client,
    config: Config,
}

impl Database {
    /// Open (and migrate) the SQLite database named by `config.db.path`.
    pub async fn open(config: Config) -> Result<Self> {
        let pool = db::connect(&config).await?;
        let store = SqliteStore::migrated(pool).await?;
        Self::with_store(store, config)
    }

    /// A database backed by [`InMemoryStore`].
    pub fn in_memory(config: Config) -> Result<Self> {
        Self::with_store(InMemoryStore::new(), config)
    }

    pub fn with_store(store: impl Store + 'static, config: Config) -> Result<Self> {
        let http = ingest::build_http_client(&config.http)?;
        Ok(Self {
            store: Box::new(store),
            http,
            config,
        })
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// A load request carrying the configured chunk size and reload policy.
    pub fn load_request(&self, file: Option<PathBuf>, url: Option<String>) -> LoadRequest {
        LoadRequest {
            file,
            url,
            chunk_size: self.config.ingest.chunk_size,
            delete_on_reload: self.config.ingest.delete_on_reload,
        }
    }

    pub async fn load(&self, request: &LoadRequest) -> Result<LoadReport> {
        ingest::load(self.store(), &self.http, request).await
    }

    pub async fn query(&self, q: &EntryQuery) -> Result<Vec<EntrySummary>> {
        query::query(self.store(), q, self.config.query.default_limit).await
    }

    pub async fn get(&self, at_id: &str) -> Result<Value> {
        query::get(self.store(), at_id).await
    }

    pub async fn get_types(&self) -> Result<Vec<String>> {
        query::get_types(self.store()).await
    }

    pub async fn put(&self, data: &Value) -> Result<PutReport> {
        local::put(self.store(), data).await
    }

    pub async fn remove(&self, at_id: &str) -> Result<u64> {
        local::remove(self.store(), at_id).await
    }

    pub async fn list_local_items(&self, listing: &LocalListing) -> Result<LocalPage> {
        local::list_local_items(self.store(), listing).await
    }

    /// Clean up with the configured policy.
    pub async fn cleanup(&self) -> Result<CleanupReport> {
        self.cleanup_with(&CleanupPolicy::from(&self.config.cleanup))
            .await
    }

    pub async fn cleanup_with(&self, policy: &CleanupPolicy) -> Result<CleanupReport> {
        local::cleanup(self.store(), policy).await
    }

    pub async fn list_sources(&self) -> Result<Vec<SourceSummary>> {
        sources::list_sources(self.store()).await
    }

    pub async fn unload(&self, locator: &SourceLocator) -> Result<u64> {
        sources::unload(self.store(), locator).await
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        self.store.stats().await
    }

    pub async fn close(&self) {
        self.store.close().await;
    }
}
