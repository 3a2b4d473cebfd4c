//! Durable "last processed row" cursor per (filter name, table) pair.
//!
//! Checkpoints are append-only: every advance inserts a new row, and the
//! effective cursor is the highest `row` recorded for the pair.

use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use tracing::{debug, info};

use crate::model::Checkpoint;
use crate::util::now_utc_string;

/// Returns the last processed row id, or 0 when the pair has never run.
pub(crate) fn get_last(connection: &Connection, name: &str, table: &str) -> Result<i64> {
    let last: Option<i64> = connection
        .query_row(
            "SELECT MAX(row) FROM checkpoints WHERE name = ?1 AND table_name = ?2",
            params![name, table],
            |row| row.get(0),
        )
        .with_context(|| format!("failed to read checkpoint for {name}/{table}"))?;

    Ok(last.unwrap_or(0))
}

/// Appends a checkpoint when `row` moves the cursor forward. Returns false
/// (and writes nothing) for a row at or below the current cursor.
pub(crate) fn advance(
    connection: &Connection,
    name: &str,
    table: &str,
    row: i64,
    comment: &serde_json::Value,
) -> Result<bool> {
    let last = get_last(connection, name, table)?;
    if row <= last {
        debug!(name, table, row, last, "checkpoint not advanced");
        return Ok(false);
    }

    connection
        .execute(
            "
            INSERT INTO checkpoints(name, table_name, row, comment, date_added)
            VALUES(?1, ?2, ?3, ?4, ?5)
            ",
            params![name, table, row, comment.to_string(), now_utc_string()],
        )
        .with_context(|| format!("failed to write checkpoint for {name}/{table}"))?;

    info!(name, table, row, previous = last, "checkpoint advanced");
    Ok(true)
}

pub(crate) fn history(connection: &Connection, name: &str, table: &str) -> Result<Vec<Checkpoint>> {
    let mut statement = connection.prepare(
        "
        SELECT name, table_name, row, comment, date_added
        FROM checkpoints
        WHERE name = ?1 AND table_name = ?2
        ORDER BY id ASC
        ",
    )?;

    let rows = statement.query_map(params![name, table], map_checkpoint)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Most advanced checkpoint for every (name, table) pair.
pub(crate) fn latest_all(connection: &Connection) -> Result<Vec<Checkpoint>> {
    let mut statement = connection.prepare(
        "
        SELECT c.name, c.table_name, c.row, c.comment, c.date_added
        FROM checkpoints c
        WHERE c.id = (
          SELECT c2.id FROM checkpoints c2
          WHERE c2.name = c.name AND c2.table_name = c.table_name
          ORDER BY c2.row DESC, c2.id DESC
          LIMIT 1
        )
        ORDER BY c.name ASC, c.table_name ASC
        ",
    )?;

    let rows = statement.query_map([], map_checkpoint)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn map_checkpoint(row: &rusqlite::Row<'_>) -> rusqlite::Result<Checkpoint> {
    let raw_comment: String = row.get(3)?;
    Ok(Checkpoint {
        name: row.get(0)?,
        table_name: row.get(1)?,
        row: row.get(2)?,
        comment: parse_comment(raw_comment),
        date_added: row.get(4)?,
    })
}

fn parse_comment(raw: String) -> serde_json::Value {
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(_) => serde_json::Value::String(raw),
    }
}
