use rusqlite::{Connection, params};

use super::rows::{upsert_extraction_method, upsert_property_metadata};
use super::schema::ensure_schema;
use crate::model::{ExtractionMethod, PropertyMetadata};

pub(crate) fn memory_store() -> Connection {
    let connection = Connection::open_in_memory().expect("in-memory sqlite should open");
    ensure_schema(&connection).expect("schema should initialize");
    connection
}

pub(crate) fn tg_metadata() -> PropertyMetadata {
    PropertyMetadata {
        name: "glass transition temperature".to_string(),
        other_names: vec![
            "glass transition temperature".to_string(),
            "Tg".to_string(),
            "T_g".to_string(),
            "glass transition".to_string(),
        ],
        units: vec!["°C".to_string(), "K".to_string(), "C".to_string()],
        lower_limit: -150.0,
        upper_limit: 500.0,
    }
}

pub(crate) fn seed_metadata(connection: &Connection, metadata: &PropertyMetadata) {
    upsert_property_metadata(connection, metadata).expect("metadata should insert");
}

pub(crate) fn insert_method(connection: &Connection, name: &str) -> i64 {
    upsert_extraction_method(
        connection,
        &ExtractionMethod {
            name: name.to_string(),
            dataset: "tg-test".to_string(),
            model: "test-model".to_string(),
            details: serde_json::json!({ "n_shots": 0 }),
        },
    )
    .expect("method should insert")
}

pub(crate) fn insert_paragraph(connection: &Connection, id: i64, doc_id: &str, text: Option<&str>) {
    connection
        .execute(
            "INSERT INTO paper_texts(id, doc_id, section, text) VALUES(?1, ?2, 'body', ?3)",
            params![id, doc_id, text],
        )
        .expect("paragraph should insert");
}

pub(crate) fn insert_property(
    connection: &Connection,
    id: i64,
    method_id: i64,
    entity_name: Option<&str>,
    numeric_value: Option<f64>,
    unit: Option<&str>,
) {
    connection
        .execute(
            "
            INSERT INTO extracted_properties(id, method_id, para_id, entity_name, numeric_value, unit)
            VALUES(?1, ?2, NULL, ?3, ?4, ?5)
            ",
            params![id, method_id, entity_name, numeric_value, unit],
        )
        .expect("extracted property should insert");
}
