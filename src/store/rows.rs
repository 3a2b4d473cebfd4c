use anyhow::{Context, Result};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OptionalExtension, params};

use crate::model::{ExtractedProperty, ExtractionMethod, ParagraphRecord, PropertyMetadata};
use crate::util::now_utc_string;

pub(crate) fn load_property_metadata(
    connection: &Connection,
    name: &str,
) -> Result<Option<PropertyMetadata>> {
    let row = connection
        .query_row(
            "
            SELECT name, other_names, units, lower_limit, upper_limit
            FROM property_metadata
            WHERE name = ?1
            ",
            [name],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, f64>(4)?,
                ))
            },
        )
        .optional()
        .with_context(|| format!("failed to load property metadata for {name:?}"))?;

    let Some((name, other_names, units, lower_limit, upper_limit)) = row else {
        return Ok(None);
    };

    let other_names: Vec<String> = serde_json::from_str(&other_names)
        .with_context(|| format!("invalid other_names list for {name:?}"))?;
    let units: Vec<String> =
        serde_json::from_str(&units).with_context(|| format!("invalid units list for {name:?}"))?;

    Ok(Some(PropertyMetadata {
        name,
        other_names,
        units,
        lower_limit,
        upper_limit,
    }))
}

pub(crate) fn upsert_property_metadata(
    connection: &Connection,
    metadata: &PropertyMetadata,
) -> Result<()> {
    let other_names = serde_json::to_string(&metadata.other_names)?;
    let units = serde_json::to_string(&metadata.units)?;

    connection
        .execute(
            "
            INSERT INTO property_metadata(name, other_names, units, lower_limit, upper_limit)
            VALUES(?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(name) DO UPDATE SET
              other_names=excluded.other_names,
              units=excluded.units,
              lower_limit=excluded.lower_limit,
              upper_limit=excluded.upper_limit
            ",
            params![
                metadata.name,
                other_names,
                units,
                metadata.lower_limit,
                metadata.upper_limit
            ],
        )
        .with_context(|| format!("failed to upsert property metadata {:?}", metadata.name))?;

    Ok(())
}

/// Inserts or refreshes an extraction method and returns its id.
pub(crate) fn upsert_extraction_method(
    connection: &Connection,
    method: &ExtractionMethod,
) -> Result<i64> {
    let id = connection
        .query_row(
            "
            INSERT INTO extraction_methods(name, dataset, model, details, date_added)
            VALUES(?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(name) DO UPDATE SET
              dataset=excluded.dataset,
              model=excluded.model,
              details=excluded.details
            RETURNING id
            ",
            params![
                method.name,
                method.dataset,
                method.model,
                method.details.to_string(),
                now_utc_string()
            ],
            |row| row.get(0),
        )
        .with_context(|| format!("failed to upsert extraction method {:?}", method.name))?;

    Ok(id)
}

pub(crate) fn method_exists(connection: &Connection, method_id: i64) -> Result<bool> {
    let found = connection
        .query_row(
            "SELECT 1 FROM extraction_methods WHERE id = ?1",
            [method_id],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Paragraphs with id beyond `last`, ascending, optionally from one document.
pub(crate) fn paragraphs_after(
    connection: &Connection,
    last: i64,
    doc_id: Option<&str>,
) -> Result<Vec<ParagraphRecord>> {
    let mut statement = connection.prepare(
        "
        SELECT id, doc_id, text
        FROM paper_texts
        WHERE id > ?1
          AND (?2 IS NULL OR doc_id = ?2)
        ORDER BY id ASC
        ",
    )?;

    let rows = statement.query_map(params![last, doc_id], map_paragraph)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Paragraphs that passed `upstream_filter`, with id beyond `last`, ascending.
pub(crate) fn passed_paragraphs_after(
    connection: &Connection,
    upstream_filter: &str,
    last: i64,
) -> Result<Vec<ParagraphRecord>> {
    let mut statement = connection.prepare(
        "
        SELECT pt.id, pt.doc_id, pt.text
        FROM filtered_paragraphs fp
        JOIN paper_texts pt ON fp.para_id = pt.id
        WHERE fp.filter_name = ?1
          AND fp.outcome = 'passed'
          AND fp.para_id > ?2
        ORDER BY fp.para_id ASC
        ",
    )?;

    let rows = statement.query_map(params![upstream_filter, last], map_paragraph)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Extracted properties of one method beyond `last` that `filter_name` has
/// not decided yet.
pub(crate) fn undecided_properties_after(
    connection: &Connection,
    method_id: i64,
    last: i64,
    filter_name: &str,
    target_table: &str,
) -> Result<Vec<ExtractedProperty>> {
    let mut statement = connection.prepare(
        "
        SELECT ep.id, ep.entity_name, ep.numeric_value, ep.unit
        FROM extracted_properties ep
        WHERE ep.method_id = ?1
          AND ep.id > ?2
          AND NOT EXISTS (
            SELECT 1 FROM filtered_data fd
            WHERE fd.filter_name = ?3
              AND fd.target_table = ?4
              AND fd.target_id = ep.id
          )
        ORDER BY ep.id ASC
        ",
    )?;

    let rows = statement.query_map(
        params![method_id, last, filter_name, target_table],
        |row| {
            Ok(ExtractedProperty {
                id: row.get(0)?,
                entity_name: row.get(1)?,
                numeric_value: read_numeric(row.get_ref(2)?),
                unit: row.get(3)?,
            })
        },
    )?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn map_paragraph(row: &rusqlite::Row<'_>) -> rusqlite::Result<ParagraphRecord> {
    Ok(ParagraphRecord {
        id: row.get(0)?,
        doc_id: row.get(1)?,
        text: row.get(2)?,
    })
}

/// Text values that do not parse as a number come back as `None`.
fn read_numeric(value: ValueRef<'_>) -> Option<f64> {
    match value {
        ValueRef::Real(value) => Some(value),
        ValueRef::Integer(value) => Some(value as f64),
        ValueRef::Text(raw) => std::str::from_utf8(raw)
            .ok()
            .and_then(|text| text.trim().parse::<f64>().ok()),
        ValueRef::Null | ValueRef::Blob(_) => None,
    }
}
