//! TOML configuration parsing and validation.
//!
//! ```toml
//! [db]
//! path = "./data/dps.sqlite"
//!
//! [ingest]
//! chunk_size = 10
//! delete_on_reload = true
//!
//! [query]
//! default_limit = 10
//!
//! [cleanup]
//! blank_node_prefix = "_:"
//! drop_empty_sources = true
//!
//! [http]
//! timeout_secs = 30
//! ```
//!
//! Every section except `[db]` is optional. Set `blank_node_prefix = ""`
//! to keep blank-node local entries on cleanup.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::ingest::MAX_CHUNK_SIZE;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub cleanup: CleanupConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_true")]
    pub delete_on_reload: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            delete_on_reload: true,
        }
    }
}

fn default_chunk_size() -> usize {
    10
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct QueryConfig {
    #[serde(default = "default_limit")]
    pub default_limit: i64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
        }
    }
}

fn default_limit() -> i64 {
    crate::query::DEFAULT_LIMIT
}

#[derive(Debug, Deserialize, Clone)]
pub struct CleanupConfig {
    /// An empty string disables blank-node removal.
    #[serde(default = "default_blank_node_prefix")]
    pub blank_node_prefix: String,
    #[serde(default = "default_true")]
    pub drop_empty_sources: bool,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            blank_node_prefix: default_blank_node_prefix(),
            drop_empty_sources: true,
        }
    }
}

fn default_blank_node_prefix() -> String {
    crate::local::BLANK_NODE_PREFIX.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    format!("dps/{}", env!("CARGO_PKG_VERSION"))
}

impl Config {
    /// Defaults for running without a config file.
    pub fn minimal() -> Self {
        Self::with_db_path("./data/dps.sqlite")
    }

    pub fn with_db_path(path: impl Into<PathBuf>) -> Self {
        Self {
            db: DbConfig { path: path.into() },
            ingest: IngestConfig::default(),
            query: QueryConfig::default(),
            cleanup: CleanupConfig::default(),
            http: HttpConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.ingest.chunk_size == 0 || self.ingest.chunk_size > MAX_CHUNK_SIZE {
            anyhow::bail!("ingest.chunk_size must be between 1 and {}", MAX_CHUNK_SIZE);
        }

        if self.query.default_limit < 1 {
            anyhow::bail!("query.default_limit must be >= 1");
        }

        if self.http.timeout_secs == 0 {
            anyhow::bail!("http.timeout_secs must be > 0");
        }

        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<Config> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn test_defaults_apply() {
        let config = parse("[db]\npath = \"x.sqlite\"\n").unwrap();
        assert_eq!(config.ingest.chunk_size, 10);
        assert!(config.ingest.delete_on_reload);
        assert_eq!(config.query.default_limit, 10);
        assert_eq!(config.cleanup.blank_node_prefix, "_:");
        assert!(config.cleanup.drop_empty_sources);
        assert_eq!(config.http.timeout_secs, 30);
    }

    #[test]
    fn test_overrides() {
        let config = parse(
            r#"
            [db]
            path = "x.sqlite"

            [ingest]
            chunk_size = 250
            delete_on_reload = false

            [cleanup]
            blank_node_prefix = "urn:blank:"
            "#,
        )
        .unwrap();
        assert_eq!(config.ingest.chunk_size, 250);
        assert!(!config.ingest.delete_on_reload);
        assert_eq!(config.cleanup.blank_node_prefix, "urn:blank:");
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let err = parse("[db]\npath = \"x\"\n[ingest]\nchunk_size = 0\n").unwrap_err();
        assert!(err.to_string().contains("chunk_size"));
    }

    #[test]
    fn test_zero_limit_rejected() {
        assert!(parse("[db]\npath = \"x\"\n[query]\ndefault_limit = 0\n").is_err());
    }

    #[test]
    fn test_missing_db_rejected() {
        assert!(parse("[ingest]\nchunk_size = 5\n").is_err());
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Path::new("/nonexistent/dps.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
