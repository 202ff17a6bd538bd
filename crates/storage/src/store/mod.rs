#![forbid(unsafe_code)]

mod browse;
mod error;
mod graph;
mod import;
mod indexing;
mod ingroup;
mod lifecycle;
mod query;
mod taxonomy;
mod traverse;
mod types;

pub use error::StoreError;
pub use types::{
    NodeId, NodeMatch, SearchOptions, SearchResults, StudyHandle, StudyMatch, TreeMatch,
};

use rusqlite::{Connection, OptionalExtension};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use td_core::catalog::PropertyCatalog;

const DB_FILE: &str = "treedex.db";
const SCHEMA_VERSION: i64 = 1;

/// Handle over one logical graph store: a single SQLite connection plus the
/// property classification catalog shared by the indexer and the query
/// engine. Every public mutation runs in exactly one transaction; searches
/// read the connection directly.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    catalog: PropertyCatalog,
    storage_dir: PathBuf,
}

impl SqliteStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let db_path = storage_dir.join(DB_FILE);
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        preflight_gate(&conn)?;
        install_schema(&conn)?;

        Ok(Self {
            conn,
            catalog: PropertyCatalog::standard(),
            storage_dir,
        })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn catalog(&self) -> &PropertyCatalog {
        &self.catalog
    }
}

/// Refuse to open a directory holding a database this crate did not create
/// or cannot read. An empty database is fine; anything else must carry
/// exactly the expected tables at the expected schema version.
fn preflight_gate(conn: &Connection) -> Result<(), StoreError> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
    )?;
    let mut rows = stmt.query([])?;
    let mut tables = BTreeSet::new();
    while let Some(row) = rows.next()? {
        tables.insert(row.get::<_, String>(0)?);
    }

    if tables.is_empty() {
        return Ok(());
    }

    let required: BTreeSet<&str> = [
        "store_state",
        "nodes",
        "node_props",
        "edges",
        "index_entries",
    ]
    .into_iter()
    .collect();

    if tables
        .iter()
        .any(|table| !required.contains(table.as_str()))
    {
        return Err(StoreError::InvalidInput(
            "RESET_REQUIRED: unsupported tables detected",
        ));
    }

    for table in required {
        if !tables.contains(table) {
            return Err(StoreError::InvalidInput(
                "RESET_REQUIRED: required table is missing",
            ));
        }
    }

    let version = conn
        .query_row(
            "SELECT schema_version FROM store_state WHERE singleton=1",
            [],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    if version.is_some_and(|version| version != SCHEMA_VERSION) {
        return Err(StoreError::InvalidInput(
            "RESET_REQUIRED: unsupported schema version",
        ));
    }

    Ok(())
}

fn install_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS store_state (
          singleton INTEGER PRIMARY KEY CHECK(singleton = 1),
          schema_version INTEGER NOT NULL,
          created_at_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS nodes (
          id INTEGER PRIMARY KEY AUTOINCREMENT
        );

        CREATE TABLE IF NOT EXISTS node_props (
          node_id INTEGER NOT NULL,
          key TEXT NOT NULL,
          value_json TEXT NOT NULL,
          PRIMARY KEY (node_id, key)
        );

        CREATE TABLE IF NOT EXISTS edges (
          src INTEGER NOT NULL,
          rel TEXT NOT NULL,
          dst INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_edges_src_rel ON edges(src, rel);
        CREATE INDEX IF NOT EXISTS idx_edges_dst_rel ON edges(dst, rel);

        CREATE TABLE IF NOT EXISTS index_entries (
          domain TEXT NOT NULL,
          mode TEXT NOT NULL,
          node_id INTEGER NOT NULL,
          key TEXT NOT NULL,
          value TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_index_entries_lookup
          ON index_entries(domain, mode, key, value);
        CREATE INDEX IF NOT EXISTS idx_index_entries_node
          ON index_entries(domain, node_id);
        "#,
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO store_state(singleton, schema_version, created_at_ms) \
         VALUES (1, ?1, ?2)",
        rusqlite::params![SCHEMA_VERSION, now_ms()],
    )?;
    Ok(())
}

fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
