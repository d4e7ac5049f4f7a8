use redb::TableDefinition;

use snail_core::{Item, StorageError};

/// Table holding one document collection.
/// Key: document `_id`
/// Value: serialized Item as JSON bytes
pub fn documents_table_name(namespace: &str, collection: &str) -> String {
    format!("{}/documents/{}", namespace, collection)
}

/// Table holding one key-value table.
/// Key: item `itemId`
/// Value: serialized Item as JSON bytes
pub fn items_table_name(namespace: &str, table: &str) -> String {
    format!("{}/tables/{}", namespace, table)
}

/// Definition for a table whose name is only known at runtime.
pub fn definition(name: &str) -> TableDefinition<'_, &'static str, &'static [u8]> {
    TableDefinition::new(name)
}

pub fn encode_item(item: &Item) -> Result<Vec<u8>, StorageError> {
    serde_json::to_vec(item).map_err(db_err)
}

pub fn decode_item(bytes: &[u8]) -> Result<Item, StorageError> {
    serde_json::from_slice(bytes).map_err(db_err)
}

pub(crate) fn db_err(e: impl std::fmt::Display) -> StorageError {
    StorageError::Database(e.to_string())
}
