//! Error types for the store, ingestion, and query layers.
//!
//! Validation failures are kept apart from operational failures so callers
//! can tell a malformed data pack from a broken database or network.

use std::path::PathBuf;

/// A data pack or request that violates the input contract.
///
/// Raised before any mutation; the message names the failing field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("fetch of {url} failed with HTTP status {status}")]
    Fetch { url: String, status: u16 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no entry with @id '{0}'")]
    NotFound(String),

    #[error("data pack file not found and no URL given: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Shorthand for a [`StoreError::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation(ValidationError::new(message))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
