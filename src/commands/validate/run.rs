use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;
use tracing::{info, warn};

use super::*;
use crate::cli::{ValidateArgs, ValidatorKind};
use crate::error::PipelineError;
use crate::model::{ExtractedProperty, PropertyMetadata, RunSummaryManifest};
use crate::scan::{ScanOptions, ScanPlan, ScanReport, ScanRow, run_scan};
use crate::store::ledger::LedgerTable;
use crate::store::{self, rows};
use crate::util::{now_utc_string, utc_compact_string, write_json_pretty};

impl ScanRow for ExtractedProperty {
    fn row_id(&self) -> i64 {
        self.id
    }
}

pub fn run(args: ValidateArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("validate-{}", utc_compact_string(started_ts));

    let db_path = store::resolve_db_path(&args.cache_root, args.db_path.as_deref());
    let mut connection = store::open_store(&db_path)?;
    let metadata = rows::load_property_metadata(&connection, &args.property)?
        .ok_or_else(|| PipelineError::MissingProperty(args.property.clone()))?;

    info!(
        run_id = %run_id,
        validator = args.validator.as_str(),
        filter = args.validator.filter_name(),
        method_id = args.method_id,
        property = %metadata.name,
        db = %db_path.display(),
        "starting validator"
    );

    let options = ScanOptions {
        debug_count: args.debug_count,
        batch_size: args.batch_size,
        progress_every: args.progress_every,
    };
    let report = run_validator(
        &mut connection,
        args.validator,
        args.method_id,
        &metadata,
        options,
    )?;

    let manifest = RunSummaryManifest {
        manifest_version: 1,
        run_id,
        kind: format!("{}_validator", args.validator.as_str()),
        filter_name: args.validator.filter_name().to_string(),
        property: metadata.name.clone(),
        started_at,
        finished_at: now_utc_string(),
        checkpoint_before: report.checkpoint_before,
        checkpoint_after: report.checkpoint_after,
        debug_count: args.debug_count,
        documents_with_hits: None,
        stats: report.stats,
    };
    let manifest_path = args.cache_root.join("manifests").join(format!(
        "validate_run_{}.json",
        utc_compact_string(started_ts)
    ));
    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote validator run manifest");

    Ok(())
}

/// Checkpoint key for a validator; cursors are kept per extraction method so
/// that one method's run cannot move another method's rows behind the cursor.
pub(crate) fn checkpoint_name(kind: ValidatorKind, method_id: i64) -> String {
    format!("{}/method-{}", kind.filter_name(), method_id)
}

pub(crate) fn run_validator(
    connection: &mut Connection,
    kind: ValidatorKind,
    method_id: i64,
    metadata: &PropertyMetadata,
    options: ScanOptions,
) -> Result<ScanReport> {
    if !rows::method_exists(connection, method_id)? {
        return Err(PipelineError::MissingMethod(method_id).into());
    }
    if kind == ValidatorKind::Range && metadata.lower_limit > metadata.upper_limit {
        return Err(PipelineError::InvalidLimits {
            name: metadata.name.clone(),
            lower: metadata.lower_limit,
            upper: metadata.upper_limit,
        }
        .into());
    }

    let filter_name = kind.filter_name();
    let cursor = checkpoint_name(kind, method_id);
    let plan = ScanPlan {
        filter_name,
        ledger: LedgerTable::FilteredData {
            target_table: EXTRACTED_PROPERTIES_TABLE,
        },
        checkpoint_name: &cursor,
        checkpoint_table: EXTRACTED_PROPERTIES_TABLE,
        comment: serde_json::json!({
            "validator": kind.as_str(),
            "method_id": method_id,
            "property": metadata.name,
            "metadata_sha256": metadata.fingerprint()?,
        }),
        options,
    };

    let validator = PropertyValidator::new(kind, metadata);
    let flagged = kind.flagged_outcome();
    let mut flagged_rows = 0_usize;

    let report = run_scan(
        connection,
        &plan,
        |connection, last| {
            rows::undecided_properties_after(
                connection,
                method_id,
                last,
                filter_name,
                EXTRACTED_PROPERTIES_TABLE,
            )
        },
        |row: &ExtractedProperty| {
            let outcome = validator.check(row)?;
            if outcome == flagged {
                flagged_rows += 1;
                log_flagged(&validator, row);
            }
            Ok(outcome)
        },
    )?;

    info!(
        filter = filter_name,
        method_id,
        processed = report.stats.processed,
        passed = report.stats.passed,
        rejected = report.stats.rejected,
        skipped = report.stats.skipped,
        flagged = flagged_rows,
        flagged_outcome = flagged.as_str(),
        "validator completed"
    );

    Ok(report)
}

fn log_flagged(validator: &PropertyValidator, row: &ExtractedProperty) {
    let name = row.entity_name.as_deref().unwrap_or_default();
    let unit = row.unit.as_deref().unwrap_or_default();

    match validator.kind() {
        ValidatorKind::Name => warn!(id = row.id, name, "invalid property name"),
        ValidatorKind::Range => {
            warn!(id = row.id, value = ?row.numeric_value, "out of range property value")
        }
        ValidatorKind::Unit => warn!(id = row.id, unit, "invalid property unit"),
        ValidatorKind::NerName => info!(id = row.id, name, "matching property name"),
    }
}
