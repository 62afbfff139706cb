//! SQLite-backed [`Store`] implementation.
//!
//! Bulk loads are one multi-row `INSERT ... ON CONFLICT(at_id) DO UPDATE`
//! per chunk, and a whole reload (source replacement plus every chunk)
//! runs inside a single transaction.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::migrate;
use crate::models::{
    Entry, EntrySummary, NewEntry, SortOrder, Source, SourceLocator, SourceSummary, StoreStats,
};
use crate::query::Predicate;

use super::{BatchOutcome, LocalPage, PutReport, Store};

/// SQLite implementation of the [`Store`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Wrap `pool` after bringing its schema up to date.
    pub async fn migrated(pool: SqlitePool) -> Result<Self> {
        migrate::run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }
}

fn source_from_row(row: &SqliteRow) -> Result<Source> {
    let file: Option<String> = row.get("file");
    let url: Option<String> = row.get("url");
    let locator = match (file, url) {
        (Some(f), _) => SourceLocator::File(f),
        (None, Some(u)) => SourceLocator::Url(u),
        (None, None) => {
            return Err(StoreError::Database(sqlx::Error::Decode(
                "source row has neither file nor url".into(),
            )))
        }
    };
    Ok(Source {
        id: row.get("id"),
        locator,
        created_at: row.get("created_at"),
    })
}

fn entry_from_row(row: &SqliteRow) -> Result<Entry> {
    let data: String = row.get("data");
    Ok(Entry {
        id: row.get("id"),
        at_id: row.get("at_id"),
        at_type: row.get("at_type"),
        name: row.get("name"),
        description: row.get("description"),
        data: serde_json::from_str(&data)?,
        source_id: row.get("source_id"),
    })
}

async fn find_source_in(conn: &mut SqliteConnection, locator: &SourceLocator) -> Result<Option<Source>> {
    let sql = format!(
        "SELECT id, file, url, created_at FROM sources WHERE {} = ?",
        locator.column()
    );
    let row = sqlx::query(&sql)
        .bind(locator.value())
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(source_from_row).transpose()
}

/// Delete a source and its entries, returning how many entries it held.
async fn delete_source_in(conn: &mut SqliteConnection, source_id: &str) -> Result<u64> {
    let held: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entries WHERE source_id = ?")
        .bind(source_id)
        .fetch_one(&mut *conn)
        .await?;

    sqlx::query("DELETE FROM sources WHERE id = ?")
        .bind(source_id)
        .execute(&mut *conn)
        .await?;

    Ok(held as u64)
}

#[async_trait]
impl Store for SqliteStore {
    async fn load_batch(
        &self,
        locator: &SourceLocator,
        chunks: &[&[NewEntry]],
        delete_on_reload: bool,
    ) -> Result<BatchOutcome> {
        let mut tx = self.pool.begin().await?;

        let mut replaced = None;
        let mut source = find_source_in(&mut tx, locator).await?;
        if delete_on_reload {
            if let Some(existing) = source.take() {
                replaced = Some(delete_source_in(&mut tx, &existing.id).await?);
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
                let sql = format!(
                    "INSERT INTO sources (id, {}, created_at) VALUES (?, ?, ?)",
                    locator.column()
                );
                sqlx::query(&sql)
                    .bind(&created.id)
                    .bind(locator.value())
                    .bind(created.created_at)
                    .execute(&mut *tx)
                    .await?;
                created
            }
        };

        let mut written = 0u64;
        for chunk in chunks.iter().filter(|c| !c.is_empty()) {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO entries (id, at_id, at_type, name, description, data, source_id) ",
            );
            qb.push_values(chunk.iter(), |mut row, entry| {
                row.push_bind(Uuid::new_v4().to_string())
                    .push_bind(entry.at_id.clone())
                    .push_bind(entry.at_type.clone())
                    .push_bind(entry.name.clone())
                    .push_bind(entry.description.clone())
                    .push_bind(entry.data_json())
                    .push_bind(source.id.clone());
            });
            qb.push(
                " ON CONFLICT(at_id) DO UPDATE SET \
                 at_type = excluded.at_type, \
                 name = excluded.name, \
                 description = excluded.description, \
                 data = excluded.data, \
                 source_id = CASE WHEN entries.source_id IS NULL \
                     THEN NULL ELSE excluded.source_id END",
            );
            qb.build().execute(&mut *tx).await?;
            written += chunk.len() as u64;
        }

        tx.commit().await?;

        Ok(BatchOutcome {
            source,
            replaced,
            written,
        })
    }

    async fn put_entries(&self, entries: &[NewEntry]) -> Result<PutReport> {
        let mut tx = self.pool.begin().await?;
        let mut report = PutReport::default();

        for entry in entries {
            let exists: Option<String> = sqlx::query_scalar("SELECT id FROM entries WHERE at_id = ?")
                .bind(&entry.at_id)
                .fetch_optional(&mut *tx)
                .await?;

            sqlx::query(
                r#"
                INSERT INTO entries (id, at_id, at_type, name, description, data, source_id)
                VALUES (?, ?, ?, ?, ?, ?, NULL)
                ON CONFLICT(at_id) DO UPDATE SET
                    at_type = excluded.at_type,
                    name = excluded.name,
                    description = excluded.description,
                    data = excluded.data
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&entry.at_id)
            .bind(&entry.at_type)
            .bind(&entry.name)
            .bind(&entry.description)
            .bind(entry.data_json())
            .execute(&mut *tx)
            .await?;

            if exists.is_some() {
                report.updated += 1;
            } else {
                report.created += 1;
            }
        }

        tx.commit().await?;
        Ok(report)
    }

    async fn remove_entry(&self, at_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM entries WHERE at_id = ?")
            .bind(at_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn find_entries(&self, predicate: &Predicate, limit: i64) -> Result<Vec<EntrySummary>> {
        let (condition, binds) = predicate.to_sql();
        let sql = format!(
            "SELECT id, at_id, at_type, name FROM entries WHERE {} \
             ORDER BY name ASC, at_id ASC LIMIT ?",
            condition
        );

        let mut q = sqlx::query::<Sqlite>(&sql);
        for value in binds {
            q = q.bind(value);
        }
        let rows = q.bind(limit).fetch_all(&self.pool).await?;

        Ok(rows
            .iter()
            .map(|row| EntrySummary {
                id: row.get("id"),
                at_id: row.get("at_id"),
                at_type: row.get("at_type"),
                name: row.get("name"),
            })
            .collect())
    }

    async fn get_entry(&self, at_id: &str) -> Result<Option<Entry>> {
        let row = sqlx::query(
            "SELECT id, at_id, at_type, name, description, data, source_id FROM entries WHERE at_id = ?",
        )
        .bind(at_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(entry_from_row).transpose()
    }

    async fn distinct_types(&self) -> Result<Vec<String>> {
        let types: Vec<String> = sqlx::query_scalar("SELECT DISTINCT at_type FROM entries")
            .fetch_all(&self.pool)
            .await?;
        Ok(types)
    }

    async fn list_local(
        &self,
        at_type: Option<&str>,
        offset: i64,
        limit: i64,
        order: SortOrder,
    ) -> Result<LocalPage> {
        let filter = if at_type.is_some() {
            "source_id IS NULL AND at_type = ?"
        } else {
            "source_id IS NULL"
        };

        let count_sql = format!("SELECT COUNT(*) FROM entries WHERE {}", filter);
        let mut count = sqlx::query_scalar::<Sqlite, i64>(&count_sql);
        if let Some(t) = at_type {
            count = count.bind(t);
        }
        let total = count.fetch_one(&self.pool).await?;

        let page_sql = format!(
            "SELECT data FROM entries WHERE {} ORDER BY name {}, at_id ASC LIMIT ? OFFSET ?",
            filter,
            order.as_sql()
        );
        let mut page = sqlx::query_scalar::<Sqlite, String>(&page_sql);
        if let Some(t) = at_type {
            page = page.bind(t);
        }
        let rows = page.bind(limit).bind(offset).fetch_all(&self.pool).await?;

        let items = rows
            .iter()
            .map(|data| serde_json::from_str::<Value>(data))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(LocalPage { total, items })
    }

    async fn remove_local_with_prefix(&self, prefix: &str) -> Result<u64> {
        if prefix.is_empty() {
            return Ok(0);
        }
        // substr() instead of LIKE: '_' in "_:" is a LIKE wildcard
        let result = sqlx::query(
            "DELETE FROM entries WHERE source_id IS NULL AND substr(at_id, 1, length(?)) = ?",
        )
        .bind(prefix)
        .bind(prefix)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn remove_empty_sources(&self) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM sources WHERE NOT EXISTS \
             (SELECT 1 FROM entries e WHERE e.source_id = sources.id)",
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn find_source(&self, locator: &SourceLocator) -> Result<Option<Source>> {
        let mut conn = self.pool.acquire().await?;
        find_source_in(&mut conn, locator).await
    }

    async fn list_sources(&self) -> Result<Vec<SourceSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT s.id, s.file, s.url, s.created_at, COUNT(e.id) AS entry_count
            FROM sources s
            LEFT JOIN entries e ON e.source_id = s.id
            GROUP BY s.id
            ORDER BY COALESCE(s.file, s.url)
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(SourceSummary {
                    source: source_from_row(row)?,
                    entry_count: row.get("entry_count"),
                })
            })
            .collect()
    }

    async fn delete_source(&self, locator: &SourceLocator) -> Result<Option<u64>> {
        let mut tx = self.pool.begin().await?;
        let removed = match find_source_in(&mut tx, locator).await? {
            Some(source) => Some(delete_source_in(&mut tx, &source.id).await?),
            None => None,
        };
        tx.commit().await?;
        Ok(removed)
    }

    async fn stats(&self) -> Result<StoreStats> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM entries) AS entries,
                (SELECT COUNT(*) FROM entries WHERE source_id IS NOT NULL) AS loaded,
                (SELECT COUNT(*) FROM entries WHERE source_id IS NULL) AS local,
                (SELECT COUNT(*) FROM sources) AS sources,
                (SELECT COUNT(DISTINCT at_type) FROM entries) AS types
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(StoreStats {
            entries: row.get("entries"),
            loaded: row.get("loaded"),
            local: row.get("local"),
            sources: row.get("sources"),
            types: row.get("types"),
        })
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
