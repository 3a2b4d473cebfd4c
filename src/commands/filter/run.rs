use std::collections::BTreeSet;

use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;
use tracing::{debug, info};

use super::*;
use crate::cli::FilterArgs;
use crate::error::PipelineError;
use crate::model::{Outcome, ParagraphRecord, PropertyMetadata, RunSummaryManifest};
use crate::scan::{ScanOptions, ScanPlan, ScanReport, ScanRow, run_scan};
use crate::store::ledger::LedgerTable;
use crate::store::{self, rows};
use crate::util::{now_utc_string, utc_compact_string, write_json_pretty};

pub(crate) const FILTERED_PARAGRAPHS_TABLE: &str = "filtered_paragraphs";

impl ScanRow for ParagraphRecord {
    fn row_id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ParagraphRunReport {
    pub(crate) scan: ScanReport,
    pub(crate) documents_with_hits: usize,
}

pub fn run(args: FilterArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("filter-{}", utc_compact_string(started_ts));

    let filter = resolve_filter(&args.filter)?;
    let mut tagger = match filter.stage {
        FilterStage::Keyword => None,
        FilterStage::Ner => {
            let program = args
                .tagger_cmd
                .clone()
                .ok_or_else(|| PipelineError::MissingTagger(filter.name().to_string()))?;
            Some(CommandTagger::new(program, args.tagger_args.clone()))
        }
    };

    let db_path = store::resolve_db_path(&args.cache_root, args.db_path.as_deref());
    let mut connection = store::open_store(&db_path)?;
    let metadata = rows::load_property_metadata(&connection, filter.property())?
        .ok_or_else(|| PipelineError::MissingProperty(filter.property().to_string()))?;

    info!(
        run_id = %run_id,
        filter = filter.name(),
        stage = filter.stage.as_str(),
        upstream = filter.upstream().unwrap_or("paper_texts"),
        property = %metadata.name,
        db = %db_path.display(),
        "starting paragraph filter"
    );
    if args.debug_count > 0 {
        info!(limit = args.debug_count, "debug run, row limit active");
    } else {
        info!("production run, all rows");
    }

    let options = ScanOptions {
        debug_count: args.debug_count,
        batch_size: args.batch_size,
        progress_every: args.progress_every,
    };
    let report = run_paragraph_filter(
        &mut connection,
        &filter,
        &metadata,
        tagger.as_mut().map(|tagger| tagger as &mut dyn EntityTagger),
        args.doc_id.as_deref(),
        options,
    )?;

    let manifest = RunSummaryManifest {
        manifest_version: 1,
        run_id,
        kind: format!("{}_filter", filter.stage.as_str()),
        filter_name: filter.name().to_string(),
        property: metadata.name.clone(),
        started_at,
        finished_at: now_utc_string(),
        checkpoint_before: report.scan.checkpoint_before,
        checkpoint_after: report.scan.checkpoint_after,
        debug_count: args.debug_count,
        documents_with_hits: Some(report.documents_with_hits),
        stats: report.scan.stats.clone(),
    };
    let manifest_path = args.cache_root.join("manifests").join(format!(
        "filter_run_{}.json",
        utc_compact_string(started_ts)
    ));
    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote filter run manifest");

    Ok(())
}

/// Runs one paragraph filter from its stored checkpoint forward.
pub(crate) fn run_paragraph_filter(
    connection: &mut Connection,
    filter: &ResolvedFilter,
    metadata: &PropertyMetadata,
    tagger: Option<&mut dyn EntityTagger>,
    doc_id: Option<&str>,
    options: ScanOptions,
) -> Result<ParagraphRunReport> {
    let report = match (filter.stage, tagger) {
        (FilterStage::Keyword, _) => {
            run_keyword_filter(connection, filter.name(), metadata, doc_id, options)?
        }
        (FilterStage::Ner, Some(tagger)) => run_ner_filter(
            connection,
            filter.name(),
            filter.entry.keyword_filter,
            metadata,
            tagger,
            options,
        )?,
        (FilterStage::Ner, None) => {
            return Err(PipelineError::MissingTagger(filter.name().to_string()).into());
        }
    };

    let stats = &report.scan.stats;
    info!(
        filter = filter.name(),
        property = %metadata.name,
        total_paragraphs = stats.processed,
        passed = stats.passed,
        rejected = stats.rejected,
        skipped = stats.skipped,
        documents_with_hits = report.documents_with_hits,
        last_row = report.scan.checkpoint_after,
        "paragraph filter completed"
    );

    Ok(report)
}

/// Checkpoint key for a paragraph filter. A run limited to one document
/// keeps its own cursor so the unrestricted cursor never jumps over other
/// documents' paragraphs.
pub(crate) fn checkpoint_name(filter_name: &str, doc_id: Option<&str>) -> String {
    match doc_id {
        Some(doc_id) => format!("{filter_name}/doc-{doc_id}"),
        None => filter_name.to_string(),
    }
}

pub(crate) fn run_keyword_filter(
    connection: &mut Connection,
    filter_name: &str,
    metadata: &PropertyMetadata,
    doc_id: Option<&str>,
    options: ScanOptions,
) -> Result<ParagraphRunReport> {
    let cursor = checkpoint_name(filter_name, doc_id);
    let plan = ScanPlan {
        filter_name,
        ledger: LedgerTable::FilteredParagraphs,
        checkpoint_name: &cursor,
        checkpoint_table: FILTERED_PARAGRAPHS_TABLE,
        comment: paragraph_comment(metadata, FilterStage::Keyword, doc_id)?,
        options,
    };

    let aliases = &metadata.other_names;
    let mut documents = BTreeSet::new();

    let scan = run_scan(
        connection,
        &plan,
        |connection, last| rows::paragraphs_after(connection, last, doc_id),
        |paragraph: &ParagraphRecord| {
            let text = paragraph_text(paragraph)?;
            let passed = keyword_filter(aliases, text);
            if passed {
                documents.insert(paragraph.doc_id.clone());
                info!(para_id = paragraph.id, filter = filter_name, "paragraph passed");
            } else {
                debug!(para_id = paragraph.id, filter = filter_name, "paragraph did not pass");
            }
            Ok(Outcome::from_pass(passed))
        },
    )?;

    Ok(ParagraphRunReport {
        scan,
        documents_with_hits: documents.len(),
    })
}

pub(crate) fn run_ner_filter(
    connection: &mut Connection,
    filter_name: &str,
    upstream_filter: &str,
    metadata: &PropertyMetadata,
    tagger: &mut dyn EntityTagger,
    options: ScanOptions,
) -> Result<ParagraphRunReport> {
    let plan = ScanPlan {
        filter_name,
        ledger: LedgerTable::FilteredParagraphs,
        checkpoint_name: filter_name,
        checkpoint_table: FILTERED_PARAGRAPHS_TABLE,
        comment: paragraph_comment(metadata, FilterStage::Ner, None)?,
        options,
    };

    let units = metadata.units_lower();
    let mut documents = BTreeSet::new();

    let scan = run_scan(
        connection,
        &plan,
        |connection, last| rows::passed_paragraphs_after(connection, upstream_filter, last),
        |paragraph: &ParagraphRecord| {
            let text = paragraph_text(paragraph)?;
            let entities = tagger.tag(text)?;
            let passed = ner_filter(&entities, &units);
            if passed {
                documents.insert(paragraph.doc_id.clone());
                info!(para_id = paragraph.id, filter = filter_name, "paragraph passed");
            } else {
                debug!(
                    para_id = paragraph.id,
                    filter = filter_name,
                    entities = entities.len(),
                    "paragraph did not pass"
                );
            }
            Ok(Outcome::from_pass(passed))
        },
    )?;

    Ok(ParagraphRunReport {
        scan,
        documents_with_hits: documents.len(),
    })
}

fn paragraph_text(paragraph: &ParagraphRecord) -> Result<&str, PipelineError> {
    match paragraph.text.as_deref() {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(PipelineError::MissingText(paragraph.id)),
    }
}

fn paragraph_comment(
    metadata: &PropertyMetadata,
    stage: FilterStage,
    doc_id: Option<&str>,
) -> Result<serde_json::Value> {
    Ok(serde_json::json!({
        "stage": stage.as_str(),
        "property": metadata.name,
        "metadata_sha256": metadata.fingerprint()?,
        "doc_id": doc_id,
    }))
}
