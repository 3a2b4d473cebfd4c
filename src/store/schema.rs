use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::util::{ensure_directory, now_utc_string};

pub(crate) const DB_SCHEMA_VERSION: &str = "0.1.0";
pub(crate) const DB_FILE_NAME: &str = "propmine.sqlite";

pub(crate) fn resolve_db_path(cache_root: &Path, db_path: Option<&Path>) -> PathBuf {
    db_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| cache_root.join(DB_FILE_NAME))
}

pub(crate) fn open_store(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        ensure_directory(parent)?;
    }

    let connection = Connection::open(db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;
    Ok(connection)
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

pub(crate) fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS metadata (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS property_metadata (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              name TEXT NOT NULL UNIQUE,
              other_names TEXT NOT NULL DEFAULT '[]',
              units TEXT NOT NULL DEFAULT '[]',
              lower_limit REAL NOT NULL,
              upper_limit REAL NOT NULL
            );

            CREATE TABLE IF NOT EXISTS paper_texts (
              id INTEGER PRIMARY KEY,
              doc_id TEXT NOT NULL,
              section TEXT,
              text TEXT
            );

            CREATE TABLE IF NOT EXISTS extraction_methods (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              name TEXT NOT NULL UNIQUE,
              dataset TEXT NOT NULL DEFAULT '',
              model TEXT NOT NULL DEFAULT '',
              details TEXT NOT NULL DEFAULT 'null',
              date_added TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS extracted_properties (
              id INTEGER PRIMARY KEY,
              method_id INTEGER NOT NULL,
              para_id INTEGER,
              entity_name TEXT,
              numeric_value REAL,
              unit TEXT,
              FOREIGN KEY(method_id) REFERENCES extraction_methods(id)
            );

            CREATE TABLE IF NOT EXISTS filtered_paragraphs (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              para_id INTEGER NOT NULL,
              filter_name TEXT NOT NULL,
              outcome TEXT NOT NULL CHECK (outcome IN ('passed', 'rejected')),
              date_added TEXT NOT NULL,
              UNIQUE(para_id, filter_name)
            );

            CREATE TABLE IF NOT EXISTS filtered_data (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              filter_name TEXT NOT NULL,
              target_table TEXT NOT NULL,
              target_id INTEGER NOT NULL,
              outcome TEXT NOT NULL CHECK (outcome IN ('passed', 'rejected')),
              date_added TEXT NOT NULL,
              UNIQUE(filter_name, target_table, target_id)
            );

            CREATE TABLE IF NOT EXISTS checkpoints (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              name TEXT NOT NULL,
              table_name TEXT NOT NULL,
              row INTEGER NOT NULL,
              comment TEXT NOT NULL DEFAULT '{}',
              date_added TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_paper_texts_doc ON paper_texts(doc_id, id);
            CREATE INDEX IF NOT EXISTS idx_extracted_properties_method ON extracted_properties(method_id, id);
            CREATE INDEX IF NOT EXISTS idx_filtered_paragraphs_filter ON filtered_paragraphs(filter_name, outcome, para_id);
            CREATE INDEX IF NOT EXISTS idx_checkpoints_name_table ON checkpoints(name, table_name, row);
            ",
        )
        .context("failed to initialize schema")?;

    let now = now_utc_string();
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [DB_SCHEMA_VERSION],
    )?;
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_updated_at', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [now],
    )?;

    Ok(())
}

pub(crate) fn count_rows(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection
        .query_row(sql, [], |row| row.get(0))
        .with_context(|| format!("failed to count rows: {sql}"))?;
    Ok(count)
}
