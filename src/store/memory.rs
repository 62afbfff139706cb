//! In-memory [`Store`] implementation for tests and embedding.
//!
//! Entries live in a `HashMap` keyed by `@id` (the unique secondary key),
//! sources in a `HashMap` keyed by their UUID. Cascade delete is done by
//! hand. All state sits behind one `tokio::sync::RwLock`, so a batch load
//! holds the write lock for its whole duration and is atomic to readers.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Entry, EntrySummary, NewEntry, SortOrder, Source, SourceLocator, SourceSummary, StoreStats,
};
use crate::query::Predicate;

use super::{BatchOutcome, LocalPage, PutReport, Store};

#[derive(Default)]
struct State {
    entries: HashMap<String, Entry>,
    sources: HashMap<String, Source>,
}

impl State {
    fn source_for(&self, locator: &SourceLocator) -> Option<&Source> {
        self.sources.values().find(|s| &s.locator == locator)
    }

    /// Remove a source and every entry attributed to it.
    fn cascade_delete(&mut self, source_id: &str) -> u64 {
        self.sources.remove(source_id);
        let before = self.entries.len();
        self.entries
            .retain(|_, e| e.source_id.as_deref() != Some(source_id));
        (before - self.entries.len()) as u64
    }

    fn upsert(&mut self, entry: &NewEntry, source_id: Option<&str>, reassign: bool) -> bool {
        let data = Value::Object(entry.data.clone());
        match self.entries.get_mut(&entry.at_id) {
            Some(existing) => {
                existing.at_type = entry.at_type.clone();
                existing.name = entry.name.clone();
                existing.description = entry.description.clone();
                existing.data = data;
                // local entries stay local
                if reassign && existing.source_id.is_some() {
                    existing.source_id = source_id.map(str::to_string);
                }
                false
            }
            None => {
                self.entries.insert(
                    entry.at_id.clone(),
                    Entry {
                        id: Uuid::new_v4().to_string(),
                        at_id: entry.at_id.clone(),
                        at_type: entry.at_type.clone(),
                        name: entry.name.clone(),
                        description: entry.description.clone(),
                        data,
                        source_id: source_id.map(str::to_string),
                    },
                );
                true
            }
        }
    }
}

/// In-memory store.
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn by_name(a: &Entry, b: &Entry) -> std::cmp::Ordering {
    a.name.cmp(&b.name).then_with(|| a.at_id.cmp(&b.at_id))
}

fn clamp(n: i64) -> usize {
    usize::try_from(n.max(0)).unwrap_or(usize::MAX)
}

#[async_trait]
impl Store for InMemoryStore {
    async fn load_batch(
        &self,
        locator: &SourceLocator,
        chunks: &[&[NewEntry]],
        delete_on_reload: bool,
    ) -> Result<BatchOutcome> {
        let mut state = self.state.write().await;

        let mut replaced = None;
        let mut source = state.source_for(locator).cloned();
        if delete_on_reload {
            if let Some(existing) = source.take() {
                replaced = Some(state.cascade_delete(&existing.id));
            }
        }

        let source = match source {
            Some(s) => s,
            None => {
                let created = Source {
                    id: Uuid::new_v4().to_string(),
                    locator: locator.clone(),
                    created_at: chrono::Utc::now().timestamp(),
                };
                state.sources.insert(created.id.clone(), created.clone());
                created
            }
        };

        let mut written = 0u64;
        for chunk in chunks {
            for entry in chunk.iter() {
                state.upsert(entry, Some(source.id.as_str()), true);
                written += 1;
            }
        }

        Ok(BatchOutcome {
            source,
            replaced,
            written,
        })
    }

    async fn put_entries(&self, entries: &[NewEntry]) -> Result<PutReport> {
        let mut state = self.state.write().await;
        let mut report = PutReport::default();
        for entry in entries {
            if state.upsert(entry, None, false) {
                report.created += 1;
            } else {
                report.updated += 1;
            }
        }
        Ok(report)
    }

    async fn remove_entry(&self, at_id: &str) -> Result<u64> {
        let mut state = self.state.write().await;
        Ok(state.entries.remove(at_id).map_or(0, |_| 1))
    }

    async fn find_entries(&self, predicate: &Predicate, limit: i64) -> Result<Vec<EntrySummary>> {
        let state = self.state.read().await;
        let mut hits: Vec<&Entry> = state
            .entries
            .values()
            .filter(|e| predicate.matches(e))
            .collect();
        hits.sort_by(|a, b| by_name(a, b));
        Ok(hits
            .into_iter()
            .take(clamp(limit))
            .map(Entry::summary)
            .collect())
    }

    async fn get_entry(&self, at_id: &str) -> Result<Option<Entry>> {
        let state = self.state.read().await;
        Ok(state.entries.get(at_id).cloned())
    }

    async fn distinct_types(&self) -> Result<Vec<String>> {
        let state = self.state.read().await;
        let mut types: Vec<String> = state.entries.values().map(|e| e.at_type.clone()).collect();
        types.sort();
        types.dedup();
        Ok(types)
    }

    async fn list_local(
        &self,
        at_type: Option<&str>,
        offset: i64,
        limit: i64,
        order: SortOrder,
    ) -> Result<LocalPage> {
        let state = self.state.read().await;
        let mut local: Vec<&Entry> = state
            .entries
            .values()
            .filter(|e| e.is_local())
            .filter(|e| at_type.map_or(true, |t| e.at_type == t))
            .collect();
        local.sort_by(|a, b| match order {
            SortOrder::Asc => by_name(a, b),
            SortOrder::Desc => b.name.cmp(&a.name).then_with(|| a.at_id.cmp(&b.at_id)),
        });

        Ok(LocalPage {
            total: local.len() as i64,
            items: local
                .into_iter()
                .skip(clamp(offset))
                .take(clamp(limit))
                .map(|e| e.data.clone())
                .collect(),
        })
    }

    async fn remove_local_with_prefix(&self, prefix: &str) -> Result<u64> {
        if prefix.is_empty() {
            return Ok(0);
        }
        let mut state = self.state.write().await;
        let before = state.entries.len();
        state
            .entries
            .retain(|_, e| !(e.is_local() && e.at_id.starts_with(prefix)));
        Ok((before - state.entries.len()) as u64)
    }

    async fn remove_empty_sources(&self) -> Result<u64> {
        let mut state = self.state.write().await;
        let State { entries, sources } = &mut *state;
        let before = sources.len();
        sources.retain(|id, _| {
            entries
                .values()
                .any(|e| e.source_id.as_deref() == Some(id.as_str()))
        });
        Ok((before - sources.len()) as u64)
    }

    async fn find_source(&self, locator: &SourceLocator) -> Result<Option<Source>> {
        let state = self.state.read().await;
        Ok(state.source_for(locator).cloned())
    }

    async fn list_sources(&self) -> Result<Vec<SourceSummary>> {
        let state = self.state.read().await;
        let mut summaries: Vec<SourceSummary> = state
            .sources
            .values()
            .map(|source| SourceSummary {
                source: source.clone(),
                entry_count: state
                    .entries
                    .values()
                    .filter(|e| e.source_id.as_deref() == Some(source.id.as_str()))
                    .count() as i64,
            })
            .collect();
        summaries.sort_by(|a, b| a.source.locator.value().cmp(b.source.locator.value()));
        Ok(summaries)
    }

    async fn delete_source(&self, locator: &SourceLocator) -> Result<Option<u64>> {
        let mut state = self.state.write().await;
        let id = match state.source_for(locator) {
            Some(s) => s.id.clone(),
            None => return Ok(None),
        };
        Ok(Some(state.cascade_delete(&id)))
    }

    async fn stats(&self) -> Result<StoreStats> {
        let state = self.state.read().await;
        let local = state.entries.values().filter(|e| e.is_local()).count() as i64;
        let mut types: Vec<&str> = state.entries.values().map(|e| e.at_type.as_str()).collect();
        types.sort_unstable();
        types.dedup();
        Ok(StoreStats {
            entries: state.entries.len() as i64,
            loaded: state.entries.len() as i64 - local,
            local,
            sources: state.sources.len() as i64,
            types: types.len() as i64,
        })
    }
}
