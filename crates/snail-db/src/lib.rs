//! Snail DB - redb implementation of the store traits.

pub mod document_store;
pub mod table_store;
pub mod tables;

pub use document_store::RedbDocumentStore;
pub use table_store::RedbTableStore;

use std::path::Path;
use std::sync::Arc;

use redb::Database;

use snail_core::StorageError;

/// Open (or create) the database file shared by both stores.
pub fn init_database(path: impl AsRef<Path>) -> Result<Arc<Database>, StorageError> {
    let db = Database::create(path).map_err(|e| StorageError::Database(e.to_string()))?;
    Ok(Arc::new(db))
}
