//! Ingestion engine: data pack → validation → chunked bulk upsert.
//!
//! A load resolves its input (an existing file first, then the URL),
//! validates the whole pack before touching the store, and hands the
//! chunked entries to [`Store::load_batch`], which replaces the previous
//! incarnation of the source and writes every chunk in one atomic unit.
//! Loading the same file twice therefore leaves one row per `@id`.

use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::StatusCode;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::HttpConfig;
use crate::error::{Result, StoreError};
use crate::models::{NewEntry, Source, SourceLocator};
use crate::store::Store;
use crate::validate::verify_input_data;

pub const DEFAULT_CHUNK_SIZE: usize = 10;

/// Upper bound on chunk size; one chunk is one statement and SQLite caps
/// bound parameters per statement at 32766 (7 per entry).
pub const MAX_CHUNK_SIZE: usize = 4096;

/// Where to load from and how.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    /// Used when it exists; otherwise the load falls back to `url`.
    pub file: Option<PathBuf>,
    pub url: Option<String>,
    pub chunk_size: usize,
    pub delete_on_reload: bool,
}

impl Default for LoadRequest {
    fn default() -> Self {
        Self {
            file: None,
            url: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            delete_on_reload: true,
        }
    }
}

impl LoadRequest {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            file: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn delete_on_reload(mut self, delete_on_reload: bool) -> Self {
        self.delete_on_reload = delete_on_reload;
        self
    }
}

/// Outcome of a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub source: Source,
    /// Entries in the data pack, repeated `@id`s included.
    pub entries: usize,
    /// Bulk statements issued.
    pub chunks: usize,
    /// Entries dropped with the previous incarnation of the source.
    pub replaced: Option<u64>,
}

/// Build the HTTP client used for URL loads.
pub fn build_http_client(config: &HttpConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(config.user_agent.clone())
        .build()?;
    Ok(client)
}

/// Load a data pack into the store.
pub async fn load<S: Store + ?Sized>(
    store: &S,
    client: &reqwest::Client,
    request: &LoadRequest,
) -> Result<LoadReport> {
    if request.chunk_size == 0 || request.chunk_size > MAX_CHUNK_SIZE {
        return Err(StoreError::validation(format!(
            "chunk size must be between 1 and {}",
            MAX_CHUNK_SIZE
        )));
    }

    let (locator, data) = resolve_input(client, request).await?;
    let entries = verify_input_data(&data)?;
    let chunks: Vec<&[NewEntry]> = entries.chunks(request.chunk_size).collect();

    info!(source = %locator, entries = entries.len(), chunks = chunks.len(), "loading data pack");
    let outcome = store
        .load_batch(&locator, &chunks, request.delete_on_reload)
        .await?;
    if let Some(n) = outcome.replaced {
        debug!(source = %locator, replaced = n, "replaced previous source");
    }

    Ok(LoadReport {
        source: outcome.source,
        entries: entries.len(),
        chunks: chunks.len(),
        replaced: outcome.replaced,
    })
}

/// Pick the input and read it: an existing file wins, then the URL.
async fn resolve_input(
    client: &reqwest::Client,
    request: &LoadRequest,
) -> Result<(SourceLocator, Value)> {
    if let Some(file) = &request.file {
        if tokio::fs::try_exists(file).await? {
            let data = read_data_pack(file).await?;
            return Ok((SourceLocator::file(file.display().to_string()), data));
        }
        debug!(file = %file.display(), "data pack file not found");
    }

    match (&request.url, &request.file) {
        (Some(url), _) => {
            let data = fetch_data_pack(client, url).await?;
            Ok((SourceLocator::url(url.clone()), data))
        }
        (None, Some(file)) => Err(StoreError::MissingInput(file.clone())),
        (None, None) => Err(StoreError::validation("load requires a file or a url")),
    }
}

pub async fn read_data_pack(path: &Path) -> Result<Value> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

/// GET a data pack, bypassing caches. Anything but `200 OK` is an error.
pub async fn fetch_data_pack(client: &reqwest::Client, url: &str) -> Result<Value> {
    let response = client
        .get(url)
        .header(CACHE_CONTROL, "no-cache")
        .header(PRAGMA, "no-cache")
        .send()
        .await?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(StoreError::Fetch {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    Ok(response.json::<Value>().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn write_pack(dir: &TempDir, name: &str, data: &Value) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, data.to_string()).unwrap();
        path
    }

    fn pack(n: usize) -> Value {
        Value::Array(
            (0..n)
                .map(|i| json!({"@id": format!("e{}", i), "@type": "Thing", "name": format!("n{}", i)}))
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_load_chunks_entries() {
        let dir = TempDir::new().unwrap();
        let path = write_pack(&dir, "pack.json", &pack(25));
        let store = InMemoryStore::new();

        let report = load(&store, &reqwest::Client::new(), &LoadRequest::file(&path))
            .await
            .unwrap();
        assert_eq!(report.entries, 25);
        assert_eq!(report.chunks, 3);
        assert_eq!(report.replaced, None);
        assert_eq!(store.stats().await.unwrap().loaded, 25);
    }

    #[tokio::test]
    async fn test_reload_reports_replaced() {
        let dir = TempDir::new().unwrap();
        let path = write_pack(&dir, "pack.json", &pack(4));
        let store = InMemoryStore::new();
        let client = reqwest::Client::new();

        load(&store, &client, &LoadRequest::file(&path)).await.unwrap();
        let again = load(&store, &client, &LoadRequest::file(&path)).await.unwrap();
        assert_eq!(again.replaced, Some(4));
        assert_eq!(store.stats().await.unwrap().entries, 4);
    }

    #[tokio::test]
    async fn test_zero_chunk_size_rejected() {
        let store = InMemoryStore::new();
        let err = load(
            &store,
            &reqwest::Client::new(),
            &LoadRequest::file("unused.json").chunk_size(0),
        )
        .await
        .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_missing_file_without_url() {
        let store = InMemoryStore::new();
        let err = load(
            &store,
            &reqwest::Client::new(),
            &LoadRequest::file("/nonexistent/pack.json"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StoreError::MissingInput(_)));
    }

    #[tokio::test]
    async fn test_invalid_pack_leaves_store_untouched() {
        let dir = TempDir::new().unwrap();
        let path = write_pack(&dir, "bad.json", &json!([{"@id": "1", "@type": "T"}]));
        let store = InMemoryStore::new();

        let err = load(&store, &reqwest::Client::new(), &LoadRequest::file(&path))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(store.stats().await.unwrap(), Default::default());
    }

    #[tokio::test]
    async fn test_malformed_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "[{").unwrap();
        let store = InMemoryStore::new();

        let err = load(&store, &reqwest::Client::new(), &LoadRequest::file(&path))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Json(_)));
    }
}
