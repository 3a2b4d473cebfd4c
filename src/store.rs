pub(crate) mod checkpoint;
pub(crate) mod ledger;
pub(crate) mod rows;
pub(crate) mod schema;

#[cfg(test)]
pub(crate) mod fixtures;

pub(crate) use schema::{open_store, resolve_db_path};
