//! Query engine: substring lookup scoped by `@type`.
//!
//! Every query names a `@type`; optional `@id`, `name` and `description`
//! filters narrow it. Matching is case-sensitive substring containment on
//! every backend (`instr()` in SQLite, `str::contains` in memory), so a
//! needle such as `"50%"` is matched literally.
//!
//! | Mode | Result |
//! |------|--------|
//! | `or` (default) | `@type` matches AND any supplied filter matches |
//! | `and` | `@type` matches AND every supplied filter matches |
//!
//! With no optional filters both modes reduce to the `@type` match.
//! Results are ordered by `name` ascending and returned as
//! [`EntrySummary`] projections, never full payloads.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, StoreError, ValidationError};
use crate::models::{Entry, EntrySummary};
use crate::store::Store;

/// Default number of results when a query names no limit.
pub const DEFAULT_LIMIT: i64 = 10;

/// How optional field filters combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    #[default]
    Or,
    And,
}

impl std::str::FromStr for QueryMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "or" => Ok(QueryMode::Or),
            "and" => Ok(QueryMode::And),
            other => Err(format!("unknown query mode '{}'. Use and or or.", other)),
        }
    }
}

/// A lookup request, deserializable from the JSON shape callers send
/// (`{"@type": "Product", "name": "esc"}`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryQuery {
    #[serde(default, rename = "queryType", alias = "query_type")]
    pub query_type: QueryMode,
    #[serde(default, rename = "@type")]
    pub at_type: Option<String>,
    /// Numbers are accepted and matched by their decimal text.
    #[serde(default, rename = "@id", deserialize_with = "string_or_number")]
    pub at_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
}

impl EntryQuery {
    pub fn of_type(at_type: impl Into<String>) -> Self {
        Self {
            at_type: Some(at_type.into()),
            ..Self::default()
        }
    }

    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn mode(mut self, mode: QueryMode) -> Self {
        self.query_type = mode;
        self
    }

    pub fn id(mut self, at_id: impl Into<String>) -> Self {
        self.at_id = Some(at_id.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "@id must be a string or number, got {}",
            other
        ))),
    }
}

/// A filterable column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Id,
    Name,
    Description,
}

impl Field {
    pub fn column(&self) -> &'static str {
        match self {
            Field::Id => "at_id",
            Field::Name => "name",
            Field::Description => "description",
        }
    }

    fn value<'a>(&self, entry: &'a Entry) -> Option<&'a str> {
        match self {
            Field::Id => Some(&entry.at_id),
            Field::Name => Some(&entry.name),
            Field::Description => entry.description.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub field: Field,
    pub needle: String,
}

/// A validated query in backend-neutral form.
///
/// Stores either evaluate it directly ([`Predicate::matches`]) or render it
/// to a parameterized SQL condition ([`Predicate::to_sql`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub type_contains: String,
    pub filters: Vec<FieldFilter>,
    pub mode: QueryMode,
}

impl Predicate {
    /// Build the predicate, rejecting queries without a `@type`.
    ///
    /// Empty filter strings count as absent.
    pub fn from_query(query: &EntryQuery) -> std::result::Result<Self, ValidationError> {
        let type_contains = match query.at_type.as_deref() {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => {
                return Err(ValidationError::new(
                    "@type must be defined for all queries.",
                ))
            }
        };

        let filters = [
            (Field::Id, &query.at_id),
            (Field::Name, &query.name),
            (Field::Description, &query.description),
        ]
        .into_iter()
        .filter_map(|(field, value)| match value.as_deref() {
            Some(needle) if !needle.is_empty() => Some(FieldFilter {
                field,
                needle: needle.to_string(),
            }),
            _ => None,
        })
        .collect();

        Ok(Self {
            type_contains,
            filters,
            mode: query.query_type,
        })
    }

    pub fn matches(&self, entry: &Entry) -> bool {
        if !entry.at_type.contains(&self.type_contains) {
            return false;
        }
        if self.filters.is_empty() {
            return true;
        }
        let hit = |f: &FieldFilter| f.field.value(entry).is_some_and(|v| v.contains(&f.needle));
        match self.mode {
            QueryMode::Or => self.filters.iter().any(hit),
            QueryMode::And => self.filters.iter().all(hit),
        }
    }

    /// Render as a SQL condition with `?` placeholders and the values to
    /// bind, in order.
    pub fn to_sql(&self) -> (String, Vec<&str>) {
        let mut sql = String::from("instr(at_type, ?) > 0");
        let mut binds = vec![self.type_contains.as_str()];

        if !self.filters.is_empty() {
            let joiner = match self.mode {
                QueryMode::Or => " OR ",
                QueryMode::And => " AND ",
            };
            let parts: Vec<String> = self
                .filters
                .iter()
                .map(|f| format!("instr({}, ?) > 0", f.field.column()))
                .collect();
            sql.push_str(&format!(" AND ({})", parts.join(joiner)));
            binds.extend(self.filters.iter().map(|f| f.needle.as_str()));
        }

        (sql, binds)
    }
}

/// Run a lookup and return compact summaries ordered by name.
pub async fn query<S: Store + ?Sized>(
    store: &S,
    query: &EntryQuery,
    default_limit: i64,
) -> Result<Vec<EntrySummary>> {
    let predicate = Predicate::from_query(query)?;
    let limit = query.limit.unwrap_or(default_limit);
    if limit < 0 {
        return Err(StoreError::validation("limit must not be negative"));
    }

    debug!(?predicate, limit, "running entry query");
    store.find_entries(&predicate, limit).await
}

/// Full payload of the entry with this `@id`.
///
/// A missing entry is an error; check existence with [`query`] first.
pub async fn get<S: Store + ?Sized>(store: &S, at_id: &str) -> Result<Value> {
    store
        .get_entry(at_id)
        .await?
        .map(|entry| entry.data)
        .ok_or_else(|| StoreError::NotFound(at_id.to_string()))
}

/// Every distinct `@type` in the store, sorted.
pub async fn get_types<S: Store + ?Sized>(store: &S) -> Result<Vec<String>> {
    let mut types = store.distinct_types().await?;
    types.sort();
    types.dedup();
    Ok(types)
}
