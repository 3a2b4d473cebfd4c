//! Decision ledger: one row per (filter, table, target id), tagged with the
//! outcome. The UNIQUE constraints on both ledger tables make a second
//! decision for the same key a no-op rather than a duplicate.

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

use crate::model::Outcome;
use crate::util::now_utc_string;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum LedgerTable {
    /// Paragraph filter chain, keyed by (para_id, filter_name).
    FilteredParagraphs,
    /// Validator chain, keyed by (filter_name, target_table, target_id).
    FilteredData { target_table: &'static str },
}

impl LedgerTable {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::FilteredParagraphs => "filtered_paragraphs",
            Self::FilteredData { .. } => "filtered_data",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct LedgerCount {
    pub(crate) filter_name: String,
    pub(crate) target_table: String,
    pub(crate) outcome: String,
    pub(crate) count: i64,
}

pub(crate) fn is_decided(
    connection: &Connection,
    table: LedgerTable,
    filter_name: &str,
    target_id: i64,
) -> Result<bool> {
    Ok(outcome_of(connection, table, filter_name, target_id)?.is_some())
}

pub(crate) fn outcome_of(
    connection: &Connection,
    table: LedgerTable,
    filter_name: &str,
    target_id: i64,
) -> Result<Option<Outcome>> {
    let raw: Option<String> = match table {
        LedgerTable::FilteredParagraphs => connection
            .query_row(
                "SELECT outcome FROM filtered_paragraphs WHERE para_id = ?1 AND filter_name = ?2",
                params![target_id, filter_name],
                |row| row.get(0),
            )
            .optional(),
        LedgerTable::FilteredData { target_table } => connection
            .query_row(
                "
                SELECT outcome FROM filtered_data
                WHERE filter_name = ?1 AND target_table = ?2 AND target_id = ?3
                ",
                params![filter_name, target_table, target_id],
                |row| row.get(0),
            )
            .optional(),
    }
    .with_context(|| format!("failed to read ledger entry {filter_name}/{target_id}"))?;

    raw.map(|value| {
        Outcome::parse(&value).with_context(|| format!("unknown ledger outcome: {value:?}"))
    })
    .transpose()
}

/// Inserts a decision unless one already exists. Returns true only for a new row.
pub(crate) fn record(
    connection: &Connection,
    table: LedgerTable,
    filter_name: &str,
    target_id: i64,
    outcome: Outcome,
) -> Result<bool> {
    let now = now_utc_string();
    let changed = match table {
        LedgerTable::FilteredParagraphs => connection.execute(
            "
            INSERT INTO filtered_paragraphs(para_id, filter_name, outcome, date_added)
            VALUES(?1, ?2, ?3, ?4)
            ON CONFLICT(para_id, filter_name) DO NOTHING
            ",
            params![target_id, filter_name, outcome.as_str(), now],
        ),
        LedgerTable::FilteredData { target_table } => connection.execute(
            "
            INSERT INTO filtered_data(filter_name, target_table, target_id, outcome, date_added)
            VALUES(?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(filter_name, target_table, target_id) DO NOTHING
            ",
            params![filter_name, target_table, target_id, outcome.as_str(), now],
        ),
    }
    .with_context(|| format!("failed to record ledger entry {filter_name}/{target_id}"))?;

    Ok(changed > 0)
}

pub(crate) fn counts(connection: &Connection, table: LedgerTable) -> Result<Vec<LedgerCount>> {
    let sql = match table {
        LedgerTable::FilteredParagraphs => {
            "
            SELECT filter_name, 'paper_texts', outcome, COUNT(*)
            FROM filtered_paragraphs
            GROUP BY filter_name, outcome
            ORDER BY filter_name, outcome
            "
        }
        LedgerTable::FilteredData { .. } => {
            "
            SELECT filter_name, target_table, outcome, COUNT(*)
            FROM filtered_data
            GROUP BY filter_name, target_table, outcome
            ORDER BY filter_name, target_table, outcome
            "
        }
    };

    let mut statement = connection.prepare(sql)?;
    let rows = statement.query_map([], |row| {
        Ok(LedgerCount {
            filter_name: row.get(0)?,
            target_table: row.get(1)?,
            outcome: row.get(2)?,
            count: row.get(3)?,
        })
    })?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
