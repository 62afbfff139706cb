//! # Data Pack Store
//!
//! An embedded store for JSON-LD-flavored records: entries with `@id`,
//! `@type`, `name`, an optional `description` and a free-form payload.
//!
//! Entries arrive two ways. **Loaded** entries come from a data pack (a
//! JSON array in a file or behind a URL) and belong to a source row;
//! reloading the pack replaces them. **Local** entries are put by hand and
//! belong to no source, so reloads never touch them.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌─────────────┐   ┌──────────────┐
//! │ data pack  │──▶│   ingest    │──▶│              │
//! │ file / URL │   │chunk+upsert │   │    Store     │
//! └────────────┘   └─────────────┘   │ SQLite / mem │
//!                  ┌─────────────┐   │              │
//!   put / remove ─▶│    local    │──▶│              │
//!                  └─────────────┘   └──────┬───────┘
//!                                           ▼
//!                                      ┌──────────┐
//!                                      │  query   │
//!                                      └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! dps init
//! dps load --file ./packs/products.json
//! dps query --type Product --name esc
//! dps get 1
//! dps put ./my-entries.json
//! dps list-local --type Person
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`models`] | Entries, sources, projections |
//! | [`validate`] | The data pack input contract |
//! | [`store`] | `Store` trait with SQLite and in-memory backends |
//! | [`ingest`] | Loading data packs from files and URLs |
//! | [`query`] | AND/OR substring lookup, `get`, `get_types` |
//! | [`local`] | Local entries: put, remove, list, cleanup |
//! | [`sources`] | Source listing and unload |
//! | [`database`] | The store handle tying the engine together |
//! | [`stats`] | Store statistics |
//! | [`export`] | Local entries as a data pack |
//! | [`db`] | SQLite connection pool with WAL mode |
//! | [`migrate`] | Schema creation (idempotent) |

pub mod commands;
pub mod config;
pub mod database;
pub mod db;
pub mod error;
pub mod export;
pub mod ingest;
pub mod local;
pub mod migrate;
pub mod models;
pub mod query;
pub mod sources;
pub mod stats;
pub mod store;
pub mod validate;

pub use database::Database;
pub use error::{Result, StoreError, ValidationError};
pub use ingest::{LoadReport, LoadRequest};
pub use local::{CleanupPolicy, CleanupReport, LocalListing};
pub use models::{Entry, EntrySummary, SortOrder, SourceLocator};
pub use query::{EntryQuery, QueryMode};
pub use store::{InMemoryStore, SqliteStore, Store};
