use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::store::ledger::{self, LedgerTable};
use crate::store::{self, checkpoint, schema};

const COUNTED_TABLES: [&str; 6] = [
    "property_metadata",
    "extraction_methods",
    "paper_texts",
    "extracted_properties",
    "filtered_paragraphs",
    "filtered_data",
];

pub fn run(args: StatusArgs) -> Result<()> {
    let db_path = store::resolve_db_path(&args.cache_root, args.db_path.as_deref());
    info!(cache_root = %args.cache_root.display(), "status requested");

    if !db_path.exists() {
        warn!(path = %db_path.display(), "database file missing");
        return Ok(());
    }

    let connection = Connection::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    report(&connection)?;
    info!(path = %db_path.display(), "database status complete");

    Ok(())
}

fn report(connection: &Connection) -> Result<()> {
    for table in COUNTED_TABLES {
        let count =
            schema::count_rows(connection, &format!("SELECT COUNT(*) FROM {table}")).unwrap_or(0);
        info!(table, rows = count, "table rows");
    }

    let ledgers = [
        LedgerTable::FilteredParagraphs,
        LedgerTable::FilteredData {
            target_table: "extracted_properties",
        },
    ];
    for table in ledgers {
        for entry in ledger::counts(connection, table)? {
            info!(
                ledger = table.name(),
                filter = %entry.filter_name,
                target_table = %entry.target_table,
                outcome = %entry.outcome,
                count = entry.count,
                "ledger decisions"
            );
        }
    }

    let latest = checkpoint::latest_all(connection)?;
    if latest.is_empty() {
        warn!("no checkpoints recorded");
    }
    for entry in latest {
        let advances = checkpoint::history(connection, &entry.name, &entry.table_name)?.len();
        info!(
            name = %entry.name,
            table = %entry.table_name,
            row = entry.row,
            advances,
            date_added = %entry.date_added,
            comment = %entry.comment,
            "checkpoint"
        );
    }

    Ok(())
}
