use std::path::Path;

use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

use crate::cli::InitArgs;
use crate::error::PipelineError;
use crate::model::{ExtractionMethod, PropertyMetadata};
use crate::store::{self, rows, schema};
use crate::util::read_json;

pub fn run(args: InitArgs) -> Result<()> {
    let db_path = store::resolve_db_path(&args.cache_root, args.db_path.as_deref());
    let mut connection = store::open_store(&db_path)?;
    info!(
        path = %db_path.display(),
        schema_version = schema::DB_SCHEMA_VERSION,
        "store initialized"
    );

    let tx = connection.transaction()?;
    if let Some(path) = args.properties_file.as_deref() {
        let loaded = load_properties(&tx, path)?;
        info!(path = %path.display(), properties = loaded, "property metadata loaded");
    }
    if let Some(path) = args.methods_file.as_deref() {
        let loaded = load_methods(&tx, path)?;
        info!(path = %path.display(), methods = loaded, "extraction methods loaded");
    }
    tx.commit()?;

    Ok(())
}

pub(crate) fn load_properties(connection: &Connection, path: &Path) -> Result<usize> {
    let properties: Vec<PropertyMetadata> = read_json(path)?;
    for metadata in &properties {
        if metadata.lower_limit > metadata.upper_limit {
            return Err(PipelineError::InvalidLimits {
                name: metadata.name.clone(),
                lower: metadata.lower_limit,
                upper: metadata.upper_limit,
            }
            .into());
        }
        rows::upsert_property_metadata(connection, metadata)?;
    }
    Ok(properties.len())
}

pub(crate) fn load_methods(connection: &Connection, path: &Path) -> Result<usize> {
    let methods: Vec<ExtractionMethod> = read_json(path)?;
    for method in &methods {
        let id = rows::upsert_extraction_method(connection, method)?;
        info!(method_id = id, name = %method.name, "extraction method registered");
    }
    Ok(methods.len())
}
