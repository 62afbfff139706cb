//! Core data models used throughout the store.
//!
//! These types represent the entries and sources that flow through the
//! ingestion, local-edit, and query paths.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// An entry projected from a validated payload, ready to be written.
///
/// The indexed columns are copies of the payload's own properties, so
/// `data["@id"] == at_id` and `data["@type"] == at_type` hold by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub at_id: String,
    pub at_type: String,
    pub name: String,
    pub description: Option<String>,
    pub data: Map<String, Value>,
}

impl NewEntry {
    /// The payload serialized for the `data` column.
    pub fn data_json(&self) -> String {
        Value::Object(self.data.clone()).to_string()
    }
}

/// An entry row as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub id: String,
    pub at_id: String,
    pub at_type: String,
    pub name: String,
    pub description: Option<String>,
    pub data: Value,
    /// `None` for local entries.
    pub source_id: Option<String>,
}

impl Entry {
    pub fn is_local(&self) -> bool {
        self.source_id.is_none()
    }

    pub fn summary(&self) -> EntrySummary {
        EntrySummary {
            id: self.id.clone(),
            at_id: self.at_id.clone(),
            at_type: self.at_type.clone(),
            name: self.name.clone(),
        }
    }
}

/// Compact projection returned by queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntrySummary {
    pub id: String,
    #[serde(rename = "@id")]
    pub at_id: String,
    #[serde(rename = "@type")]
    pub at_type: String,
    pub name: String,
}

/// Where a batch of loaded entries came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceLocator {
    File(String),
    Url(String),
}

impl SourceLocator {
    pub fn file(path: impl Into<String>) -> Self {
        SourceLocator::File(path.into())
    }

    pub fn url(url: impl Into<String>) -> Self {
        SourceLocator::Url(url.into())
    }

    /// Column of the `sources` table this locator is keyed on.
    pub fn column(&self) -> &'static str {
        match self {
            SourceLocator::File(_) => "file",
            SourceLocator::Url(_) => "url",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            SourceLocator::File(v) | SourceLocator::Url(v) => v,
        }
    }
}

impl fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.column(), self.value())
    }
}

/// A provenance record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub id: String,
    pub locator: SourceLocator,
    pub created_at: i64,
}

/// A source together with the number of entries it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSummary {
    pub source: Source,
    pub entry_count: i64,
}

/// Sort direction on `name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown order '{}'. Use asc or desc.", other)),
        }
    }
}

/// Counts over the whole store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub entries: i64,
    pub loaded: i64,
    pub local: i64,
    pub sources: i64,
    pub types: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_display() {
        assert_eq!(SourceLocator::file("a.json").to_string(), "file:a.json");
        assert_eq!(
            SourceLocator::url("https://x/y").to_string(),
            "url:https://x/y"
        );
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("ASC".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("sideways".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_summary_serializes_jsonld_keys() {
        let s = EntrySummary {
            id: "u1".into(),
            at_id: "1".into(),
            at_type: "Product".into(),
            name: "describo".into(),
        };
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["@id"], "1");
        assert_eq!(v["@type"], "Product");
        assert_eq!(v["id"], "u1");
    }
}
