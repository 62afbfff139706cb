//! # Data Pack Store CLI (`dps`)
//!
//! ## Usage
//!
//! ```bash
//! dps [--config ./config/dps.toml] [--db ./data/dps.sqlite] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dps init` | Create the SQLite database and schema |
//! | `dps load --file <path> \| --url <url>` | Load (or reload) a data pack |
//! | `dps query --type <t>` | Substring lookup scoped by `@type` |
//! | `dps get <@id>` | Print an entry's full payload |
//! | `dps types` | List distinct `@type` values |
//! | `dps put <file>` | Upsert local entries from a data pack file |
//! | `dps remove <@id>` | Delete an entry |
//! | `dps list-local` | Page through local entries |
//! | `dps cleanup` | Remove blank-node local entries and empty sources |
//! | `dps sources` | List loaded sources |
//! | `dps unload --file <path> \| --url <url>` | Delete a source and its entries |
//! | `dps stats` | Entry, source and type counts |
//! | `dps export` | Write local entries as a data pack |

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use datapack_store::config::{self, Config};
use datapack_store::local::LocalListing;
use datapack_store::{commands, export, sources, stats};
use datapack_store::{Database, EntryQuery, QueryMode, SortOrder, SourceLocator};

const DEFAULT_CONFIG: &str = "./config/dps.toml";

/// Data Pack Store: load JSON-LD data packs into SQLite and look entries up.
#[derive(Parser)]
#[command(
    name = "dps",
    version,
    about = "Data Pack Store: an embedded store for JSON-LD data packs"
)]
struct Cli {
    /// Path to a TOML configuration file.
    ///
    /// Without this flag `./config/dps.toml` is used when it exists, and
    /// built-in defaults otherwise.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the database path from the configuration.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Load a data pack from a file or URL.
    ///
    /// An existing file wins; if it does not exist the URL is fetched.
    /// Reloading the same source replaces its previous entries.
    Load {
        #[arg(long, required_unless_present = "url")]
        file: Option<PathBuf>,

        #[arg(long)]
        url: Option<String>,

        /// Entries per bulk statement (overrides `ingest.chunk_size`).
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Keep the source's existing entries instead of replacing them.
        #[arg(long)]
        keep: bool,
    },

    /// Look entries up by substring.
    Query {
        /// `@type` to match (substring). Required.
        #[arg(long = "type")]
        at_type: String,

        /// `@id` substring.
        #[arg(long = "id")]
        at_id: Option<String>,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// `or`: any field filter matches. `and`: every field filter matches.
        #[arg(long, default_value = "or")]
        mode: QueryMode,

        #[arg(long)]
        limit: Option<i64>,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the full payload of an entry.
    Get {
        /// The entry's `@id`.
        id: String,
    },

    /// List every distinct `@type`.
    Types,

    /// Upsert local entries from a data pack file.
    Put { file: PathBuf },

    /// Delete an entry by `@id`. Unknown ids are ignored.
    Remove { id: String },

    /// Page through local entries.
    ListLocal {
        #[arg(long = "type")]
        at_type: Option<String>,

        #[arg(long, default_value_t = 0)]
        offset: i64,

        #[arg(long, default_value_t = 10)]
        limit: i64,

        /// `asc` or `desc` by name.
        #[arg(long, default_value = "asc")]
        order: SortOrder,
    },

    /// Remove blank-node local entries and sources without entries.
    Cleanup {
        /// Blank-node `@id` prefix (overrides `cleanup.blank_node_prefix`).
        #[arg(long)]
        prefix: Option<String>,

        #[arg(long)]
        keep_empty_sources: bool,
    },

    /// List loaded sources.
    Sources,

    /// Delete a source and every entry loaded from it.
    Unload {
        #[arg(long, conflicts_with = "url", required_unless_present = "url")]
        file: Option<String>,

        #[arg(long)]
        url: Option<String>,
    },

    /// Show entry, source and type counts.
    Stats,

    /// Write local entries as a data pack.
    Export {
        #[arg(long = "type")]
        at_type: Option<String>,

        /// Output file (stdout when omitted).
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut cfg = match &cli.config {
        Some(path) => config::load_config(path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => config::load_config(Path::new(DEFAULT_CONFIG))?,
        None => {
            debug!("no config file, using defaults");
            Config::minimal()
        }
    };
    if let Some(db) = &cli.db {
        cfg.db.path = db.clone();
    }
    Ok(cfg)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cfg = resolve_config(&cli)?;
    let db = Database::open(cfg).await?;

    let outcome = run(&db, cli.command).await;
    db.close().await;
    outcome
}

async fn run(db: &Database, command: Commands) -> Result<()> {
    match command {
        Commands::Init => {
            println!("Database initialized successfully.");
        }
        Commands::Load {
            file,
            url,
            chunk_size,
            keep,
        } => {
            commands::run_load(db, file, url, chunk_size, keep).await?;
        }
        Commands::Query {
            at_type,
            at_id,
            name,
            description,
            mode,
            limit,
            json,
        } => {
            let query = EntryQuery {
                query_type: mode,
                at_type: Some(at_type),
                at_id,
                name,
                description,
                limit,
            };
            commands::run_query(db, &query, json).await?;
        }
        Commands::Get { id } => {
            commands::run_get(db, &id).await?;
        }
        Commands::Types => {
            commands::run_types(db).await?;
        }
        Commands::Put { file } => {
            commands::run_put(db, &file).await?;
        }
        Commands::Remove { id } => {
            commands::run_remove(db, &id).await?;
        }
        Commands::ListLocal {
            at_type,
            offset,
            limit,
            order,
        } => {
            let listing = LocalListing {
                at_type,
                offset,
                limit,
                order,
            };
            commands::run_list_local(db, &listing).await?;
        }
        Commands::Cleanup {
            prefix,
            keep_empty_sources,
        } => {
            commands::run_cleanup(db, prefix, keep_empty_sources).await?;
        }
        Commands::Sources => {
            sources::run_sources(db).await?;
        }
        Commands::Unload { file, url } => {
            let locator = match (file, url) {
                (Some(f), _) => SourceLocator::File(f),
                (None, Some(u)) => SourceLocator::Url(u),
                (None, None) => anyhow::bail!("unload requires --file or --url"),
            };
            commands::run_unload(db, &locator).await?;
        }
        Commands::Stats => {
            stats::run_stats(db).await?;
        }
        Commands::Export { at_type, output } => {
            export::run_export(db, at_type.as_deref(), output.as_deref()).await?;
        }
    }

    Ok(())
}
