use std::sync::Arc;

use redb::{Database, ReadableTable, TableError};
use uuid::Uuid;

use snail_core::{Attribute, DocumentStore, Item, StorageError, DOCUMENT_ID};

use crate::tables::{db_err, decode_item, definition, documents_table_name, encode_item};

/// redb implementation of DocumentStore.
///
/// Each collection is its own redb table, created on first insert.
pub struct RedbDocumentStore {
    db: Arc<Database>,
    namespace: String,
}

impl RedbDocumentStore {
    pub fn new(db: Arc<Database>, namespace: impl Into<String>) -> Self {
        Self {
            db,
            namespace: namespace.into(),
        }
    }

    fn table_name(&self, collection: &str) -> String {
        documents_table_name(&self.namespace, collection)
    }

    /// Read documents from a collection, treating a missing table as empty.
    fn read<T>(
        &self,
        collection: &str,
        f: impl FnOnce(&redb::ReadOnlyTable<&'static str, &'static [u8]>) -> Result<T, StorageError>,
        empty: T,
    ) -> Result<T, StorageError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let name = self.table_name(collection);
        match read_txn.open_table(definition(&name)) {
            Ok(table) => f(&table),
            Err(TableError::TableDoesNotExist(_)) => Ok(empty),
            Err(e) => Err(db_err(e)),
        }
    }
}

impl DocumentStore for RedbDocumentStore {
    fn insert_one(&self, collection: &str, mut document: Item) -> Result<String, StorageError> {
        let id = match document.get(DOCUMENT_ID).and_then(Attribute::as_key) {
            Some(id) => id,
            None => Uuid::new_v4().to_string(),
        };
        document.insert(DOCUMENT_ID.to_string(), Attribute::Text(id.clone()));
        let value = encode_item(&document)?;

        let name = self.table_name(collection);
        let write_txn = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = write_txn.open_table(definition(&name)).map_err(db_err)?;

            if table.get(id.as_str()).map_err(db_err)?.is_some() {
                return Err(StorageError::DuplicateKey {
                    collection: collection.to_string(),
                    id,
                });
            }

            table
                .insert(id.as_str(), value.as_slice())
                .map_err(db_err)?;
        }
        write_txn.commit().map_err(db_err)?;

        tracing::debug!(collection, id = %id, "inserted document");
        Ok(id)
    }

    fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Item>, StorageError> {
        self.read(
            collection,
            |table| match table.get(id).map_err(db_err)? {
                Some(value) => Ok(Some(decode_item(value.value())?)),
                None => Ok(None),
            },
            None,
        )
    }

    fn find_first(&self, collection: &str) -> Result<Option<Item>, StorageError> {
        self.read(
            collection,
            |table| match table.first().map_err(db_err)? {
                Some((_, value)) => Ok(Some(decode_item(value.value())?)),
                None => Ok(None),
            },
            None,
        )
    }

    fn find_all(&self, collection: &str) -> Result<Vec<Item>, StorageError> {
        self.read(
            collection,
            |table| {
                let mut documents = Vec::new();
                for entry in table.iter().map_err(db_err)? {
                    let (_, value) = entry.map_err(db_err)?;
                    documents.push(decode_item(value.value())?);
                }
                Ok(documents)
            },
            Vec::new(),
        )
    }

    fn update_one(&self, collection: &str, id: &str, set: Item) -> Result<bool, StorageError> {
        let name = self.table_name(collection);
        let write_txn = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = write_txn.open_table(definition(&name)).map_err(db_err)?;

            let existing = match table.get(id).map_err(db_err)? {
                Some(value) => decode_item(value.value())?,
                None => return Ok(false),
            };

            let mut document = existing;
            document.extend(set);
            let value = encode_item(&document)?;
            table.insert(id, value.as_slice()).map_err(db_err)?;
        }
        write_txn.commit().map_err(db_err)?;

        Ok(true)
    }

    fn delete_one(&self, collection: &str, id: &str) -> Result<bool, StorageError> {
        let name = self.table_name(collection);
        let write_txn = self.db.begin_write().map_err(db_err)?;

        let removed;
        {
            let mut table = write_txn.open_table(definition(&name)).map_err(db_err)?;
            removed = table.remove(id).map_err(db_err)?.is_some();
        }

        write_txn.commit().map_err(db_err)?;

        Ok(removed)
    }
}
