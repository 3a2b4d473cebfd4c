//! Checkpointed incremental scan shared by paragraph filters and validators.
//!
//! One run reads the checkpoint, walks candidate rows in ascending id order,
//! records one ledger decision per row, commits every `batch_size` new
//! decisions and advances the checkpoint once, after the final commit. A run
//! that fails leaves the checkpoint untouched; replaying the rows it had
//! already committed is a no-op because the ledger ignores duplicate keys.

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::error::PipelineError;
use crate::model::{Outcome, RunStats};
use crate::store::checkpoint;
use crate::store::ledger::{self, LedgerTable};

pub(crate) const DEFAULT_BATCH_SIZE: usize = 50;
pub(crate) const DEFAULT_PROGRESS_EVERY: usize = 100;

pub(crate) trait ScanRow {
    fn row_id(&self) -> i64;
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ScanOptions {
    /// Stop after this many processed rows; 0 means no limit.
    pub(crate) debug_count: usize,
    pub(crate) batch_size: usize,
    pub(crate) progress_every: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            debug_count: 0,
            batch_size: DEFAULT_BATCH_SIZE,
            progress_every: DEFAULT_PROGRESS_EVERY,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ScanPlan<'a> {
    pub(crate) filter_name: &'a str,
    pub(crate) ledger: LedgerTable,
    /// Checkpoint cursor key; usually the filter name.
    pub(crate) checkpoint_name: &'a str,
    pub(crate) checkpoint_table: &'a str,
    /// Extra fields stored in the checkpoint comment.
    pub(crate) comment: serde_json::Value,
    pub(crate) options: ScanOptions,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ScanReport {
    pub(crate) checkpoint_before: i64,
    pub(crate) checkpoint_after: i64,
    pub(crate) stats: RunStats,
}

pub(crate) fn run_scan<R, Fetch, Decide>(
    connection: &mut Connection,
    plan: &ScanPlan<'_>,
    fetch: Fetch,
    mut decide: Decide,
) -> Result<ScanReport>
where
    R: ScanRow,
    Fetch: FnOnce(&Connection, i64) -> Result<Vec<R>>,
    Decide: FnMut(&R) -> Result<Outcome, PipelineError>,
{
    let filter_name = plan.filter_name;
    let options = plan.options;
    let batch_size = options.batch_size.max(1);

    let checkpoint_before =
        checkpoint::get_last(connection, plan.checkpoint_name, plan.checkpoint_table)?;
    info!(filter = filter_name, last_row = checkpoint_before, "last run row id");

    let rows = fetch(&*connection, checkpoint_before)
        .with_context(|| format!("failed to load candidate rows for {filter_name}"))?;
    let mut stats = RunStats {
        candidates: rows.len(),
        ..RunStats::default()
    };

    if let (Some(first), Some(last)) = (rows.first(), rows.last()) {
        info!(
            filter = filter_name,
            candidates = rows.len(),
            first = first.row_id(),
            last = last.row_id(),
            "found unprocessed rows"
        );
    } else {
        info!(filter = filter_name, "no unprocessed rows");
        return Ok(ScanReport {
            checkpoint_before,
            checkpoint_after: checkpoint_before,
            stats,
        });
    }

    let mut last_row_id = None;
    let mut pending = 0_usize;
    let mut tx = connection.transaction()?;

    for row in &rows {
        if options.debug_count > 0 && stats.processed >= options.debug_count {
            info!(filter = filter_name, limit = options.debug_count, "debug row limit reached");
            break;
        }

        let row_id = row.row_id();
        if row_id <= checkpoint_before {
            continue;
        }

        stats.processed += 1;
        last_row_id = Some(row_id);

        if ledger::is_decided(&tx, plan.ledger, filter_name, row_id)? {
            stats.already_decided += 1;
            trace!(filter = filter_name, row_id, "already decided, skipped");
        } else {
            match decide(row) {
                Ok(outcome) => {
                    stats.count(outcome);
                    if ledger::record(&tx, plan.ledger, filter_name, row_id, outcome)? {
                        stats.recorded += 1;
                        pending += 1;
                        trace!(filter = filter_name, row_id, outcome = outcome.as_str(), "recorded");
                    } else {
                        trace!(filter = filter_name, row_id, "ledger entry exists, skipped");
                    }
                }
                Err(err) if err.is_row_error() => {
                    stats.skipped += 1;
                    warn!(filter = filter_name, row_id, error = %err, "row skipped");
                }
                Err(err) => {
                    return Err(err)
                        .with_context(|| format!("{filter_name} failed on row {row_id}"));
                }
            }
        }

        if pending >= batch_size {
            tx.commit()
                .with_context(|| format!("failed to commit {filter_name} batch"))?;
            stats.commits += 1;
            pending = 0;
            debug!(filter = filter_name, row_id, "batch committed");
            tx = connection.transaction()?;
        }

        if options.progress_every > 0 && stats.processed % options.progress_every == 0 {
            log_progress(filter_name, &stats);
        }
    }

    tx.commit()
        .with_context(|| format!("failed to commit {filter_name} batch"))?;
    if pending > 0 {
        stats.commits += 1;
    }
    log_progress(filter_name, &stats);

    let mut checkpoint_after = checkpoint_before;
    if let Some(last_row_id) = last_row_id {
        let comment = checkpoint_comment(plan, &stats);
        if checkpoint::advance(
            connection,
            plan.checkpoint_name,
            plan.checkpoint_table,
            last_row_id,
            &comment,
        )? {
            checkpoint_after = last_row_id;
        }
        info!(filter = filter_name, last_row = last_row_id, "last processed row id");
    }

    Ok(ScanReport {
        checkpoint_before,
        checkpoint_after,
        stats,
    })
}

fn checkpoint_comment(plan: &ScanPlan<'_>, stats: &RunStats) -> serde_json::Value {
    let mut comment = serde_json::json!({
        "filter": plan.filter_name,
        "debug": plan.options.debug_count > 0,
        "processed": stats.processed,
        "passed": stats.passed,
        "rejected": stats.rejected,
        "skipped": stats.skipped,
    });

    if let (Some(target), Some(extra)) = (comment.as_object_mut(), plan.comment.as_object()) {
        for (key, value) in extra {
            target.insert(key.clone(), value.clone());
        }
    }

    comment
}

fn log_progress(filter_name: &str, stats: &RunStats) {
    info!(
        filter = filter_name,
        candidates = stats.candidates,
        processed = stats.processed,
        passed = stats.passed,
        rejected = stats.rejected,
        skipped = stats.skipped,
        already_decided = stats.already_decided,
        "scan progress"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fixtures::memory_store;
    use crate::store::ledger::outcome_of;

    const TABLE: LedgerTable = LedgerTable::FilteredData {
        target_table: "extracted_properties",
    };

    struct TestRow(i64);

    impl ScanRow for TestRow {
        fn row_id(&self) -> i64 {
            self.0
        }
    }

    fn plan(options: ScanOptions) -> ScanPlan<'static> {
        ScanPlan {
            filter_name: "test_filter",
            ledger: TABLE,
            checkpoint_name: "test_filter",
            checkpoint_table: "extracted_properties",
            comment: serde_json::json!({ "property": "glass transition temperature" }),
            options,
        }
    }

    fn rows_up_to(max: i64) -> impl FnOnce(&Connection, i64) -> Result<Vec<TestRow>> {
        move |_, last| Ok((1..=max).filter(|id| *id > last).map(TestRow).collect())
    }

    fn even_passes(row: &TestRow) -> Result<Outcome, PipelineError> {
        Ok(Outcome::from_pass(row.0 % 2 == 0))
    }

    #[test]
    fn scan_records_every_row_and_advances_checkpoint() {
        let mut connection = memory_store();
        let report = run_scan(
            &mut connection,
            &plan(ScanOptions::default()),
            rows_up_to(5),
            even_passes,
        )
        .unwrap();

        assert_eq!(report.checkpoint_before, 0);
        assert_eq!(report.checkpoint_after, 5);
        assert_eq!(report.stats.processed, 5);
        assert_eq!(report.stats.passed, 2);
        assert_eq!(report.stats.rejected, 3);
        assert_eq!(report.stats.recorded, 5);
        assert_eq!(
            outcome_of(&connection, TABLE, "test_filter", 4).unwrap(),
            Some(Outcome::Passed)
        );

        let comment = checkpoint::history(&connection, "test_filter", "extracted_properties")
            .unwrap()
            .remove(0)
            .comment;
        assert_eq!(comment["processed"], 5);
        assert_eq!(comment["property"], "glass transition temperature");
        assert_eq!(comment["debug"], false);
    }

    #[test]
    fn second_run_over_unchanged_rows_is_a_no_op() {
        let mut connection = memory_store();
        run_scan(&mut connection, &plan(ScanOptions::default()), rows_up_to(5), even_passes)
            .unwrap();

        let report = run_scan(
            &mut connection,
            &plan(ScanOptions::default()),
            rows_up_to(5),
            |_: &TestRow| -> Result<Outcome, PipelineError> { panic!("no row should be decided") },
        )
        .unwrap();

        assert_eq!(report.stats.processed, 0);
        assert_eq!(report.checkpoint_after, 5);
        let entries: i64 = connection
            .query_row("SELECT COUNT(*) FROM filtered_data", [], |row| row.get(0))
            .unwrap();
        assert_eq!(entries, 5);
    }

    #[test]
    fn rows_at_or_below_checkpoint_are_never_decided() {
        let mut connection = memory_store();
        checkpoint::advance(&connection, "test_filter", "extracted_properties", 3, &serde_json::json!({}))
            .unwrap();

        let mut seen = Vec::new();
        let report = run_scan(
            &mut connection,
            &plan(ScanOptions::default()),
            |_: &Connection, _| Ok((1..=5).map(TestRow).collect()),
            |row: &TestRow| {
                seen.push(row.0);
                Ok(Outcome::Passed)
            },
        )
        .unwrap();

        assert_eq!(seen, vec![4, 5]);
        assert_eq!(report.checkpoint_before, 3);
        assert_eq!(report.checkpoint_after, 5);
    }

    #[test]
    fn debug_limit_stops_immediately_at_the_boundary() {
        let mut connection = memory_store();
        let options = ScanOptions {
            debug_count: 3,
            ..ScanOptions::default()
        };

        let report = run_scan(&mut connection, &plan(options), rows_up_to(10), even_passes).unwrap();
        assert_eq!(report.stats.processed, 3);
        assert_eq!(report.checkpoint_after, 3);
        assert!(!ledger::is_decided(&connection, TABLE, "test_filter", 4).unwrap());

        let report = run_scan(&mut connection, &plan(options), rows_up_to(10), even_passes).unwrap();
        assert_eq!(report.checkpoint_before, 3);
        assert_eq!(report.checkpoint_after, 6);
    }

    #[test]
    fn commits_are_batched() {
        let mut connection = memory_store();
        let options = ScanOptions {
            batch_size: 2,
            ..ScanOptions::default()
        };

        let report = run_scan(&mut connection, &plan(options), rows_up_to(5), even_passes).unwrap();
        assert_eq!(report.stats.recorded, 5);
        assert_eq!(report.stats.commits, 3);
    }

    #[test]
    fn row_errors_are_skipped_and_counted() {
        let mut connection = memory_store();
        let report = run_scan(
            &mut connection,
            &plan(ScanOptions::default()),
            rows_up_to(3),
            |row: &TestRow| {
                if row.0 == 2 {
                    Err(PipelineError::MissingText(row.0))
                } else {
                    Ok(Outcome::Passed)
                }
            },
        )
        .unwrap();

        assert_eq!(report.stats.processed, 3);
        assert_eq!(report.stats.skipped, 1);
        assert_eq!(report.stats.recorded, 2);
        assert_eq!(report.checkpoint_after, 3);
        assert!(!ledger::is_decided(&connection, TABLE, "test_filter", 2).unwrap());
    }

    #[test]
    fn fatal_error_keeps_committed_batches_and_checkpoint() {
        let mut connection = memory_store();
        let options = ScanOptions {
            batch_size: 2,
            ..ScanOptions::default()
        };

        let result = run_scan(&mut connection, &plan(options), rows_up_to(5), |row: &TestRow| {
            if row.0 == 4 {
                Err(PipelineError::TaggerFailed("tagger exited".to_string()))
            } else {
                Ok(Outcome::Passed)
            }
        });
        assert!(result.is_err());

        assert_eq!(
            checkpoint::get_last(&connection, "test_filter", "extracted_properties").unwrap(),
            0
        );
        assert!(ledger::is_decided(&connection, TABLE, "test_filter", 2).unwrap());
        assert!(!ledger::is_decided(&connection, TABLE, "test_filter", 3).unwrap());

        let report = run_scan(&mut connection, &plan(options), rows_up_to(5), even_passes).unwrap();
        assert_eq!(report.stats.already_decided, 2);
        assert_eq!(report.stats.recorded, 3);
        assert_eq!(report.checkpoint_after, 5);
        assert_eq!(
            outcome_of(&connection, TABLE, "test_filter", 1).unwrap(),
            Some(Outcome::Passed)
        );
    }

    #[test]
    fn empty_candidate_set_leaves_checkpoint_alone() {
        let mut connection = memory_store();
        let report =
            run_scan(&mut connection, &plan(ScanOptions::default()), rows_up_to(0), even_passes)
                .unwrap();
        assert_eq!(report.checkpoint_after, 0);
        assert!(checkpoint::latest_all(&connection).unwrap().is_empty());
    }
}
