use std::sync::Arc;

use redb::{Database, ReadableTable, TableError};

use snail_core::{project, Filter, Item, StorageError, TableStore};

use crate::tables::{db_err, decode_item, definition, encode_item, items_table_name};

/// redb implementation of TableStore.
///
/// Unlike documents, tables are not created implicitly: a write to a
/// table that was never created fails with `TableNotFound`.
pub struct RedbTableStore {
    db: Arc<Database>,
    namespace: String,
}

impl RedbTableStore {
    pub fn new(db: Arc<Database>, namespace: impl Into<String>) -> Self {
        Self {
            db,
            namespace: namespace.into(),
        }
    }

    fn table_name(&self, table: &str) -> String {
        items_table_name(&self.namespace, table)
    }

    fn not_found(e: TableError, table: &str) -> StorageError {
        match e {
            TableError::TableDoesNotExist(_) => StorageError::TableNotFound(table.to_string()),
            e => db_err(e),
        }
    }

    /// Fail with `TableNotFound` unless the table has been created.
    fn require_table(&self, table: &str) -> Result<(), StorageError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        read_txn
            .open_table(definition(&self.table_name(table)))
            .map_err(|e| Self::not_found(e, table))?;
        Ok(())
    }
}

impl TableStore for RedbTableStore {
    fn create_table(&self, table: &str) -> Result<(), StorageError> {
        let name = self.table_name(table);
        let write_txn = self.db.begin_write().map_err(db_err)?;
        {
            // Create table if it doesn't exist
            let _ = write_txn.open_table(definition(&name)).map_err(db_err)?;
        }
        write_txn.commit().map_err(db_err)?;

        tracing::info!(table, "table ready");
        Ok(())
    }

    fn put_item(&self, table: &str, key: &str, item: Item) -> Result<(), StorageError> {
        self.require_table(table)?;
        let value = encode_item(&item)?;

        let name = self.table_name(table);
        let write_txn = self.db.begin_write().map_err(db_err)?;
        {
            let mut t = write_txn.open_table(definition(&name)).map_err(db_err)?;
            t.insert(key, value.as_slice()).map_err(db_err)?;
        }
        write_txn.commit().map_err(db_err)?;

        Ok(())
    }

    fn get_item(
        &self,
        table: &str,
        key: &str,
        projection: Option<&[&str]>,
    ) -> Result<Option<Item>, StorageError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let t = read_txn
            .open_table(definition(&self.table_name(table)))
            .map_err(|e| Self::not_found(e, table))?;

        let item = match t.get(key).map_err(db_err)? {
            Some(value) => decode_item(value.value())?,
            None => return Ok(None),
        };

        Ok(Some(match projection {
            Some(fields) => project(item, fields),
            None => item,
        }))
    }

    fn scan(&self, table: &str, filter: Option<&Filter>) -> Result<Vec<Item>, StorageError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let t = read_txn
            .open_table(definition(&self.table_name(table)))
            .map_err(|e| Self::not_found(e, table))?;

        let mut items = Vec::new();
        for entry in t.iter().map_err(db_err)? {
            let (_, value) = entry.map_err(db_err)?;
            let item = decode_item(value.value())?;
            if filter.map_or(true, |f| f.matches(&item)) {
                items.push(item);
            }
        }

        Ok(items)
    }

    fn update_existing(&self, table: &str, key: &str, set: Item) -> Result<Item, StorageError> {
        self.require_table(table)?;

        let name = self.table_name(table);
        let write_txn = self.db.begin_write().map_err(db_err)?;
        let updated;
        {
            let mut t = write_txn.open_table(definition(&name)).map_err(db_err)?;

            let mut item = match t.get(key).map_err(db_err)? {
                Some(value) => decode_item(value.value())?,
                None => {
                    return Err(StorageError::ConditionFailed {
                        table: table.to_string(),
                        key: key.to_string(),
                    })
                }
            };

            item.extend(set);
            let value = encode_item(&item)?;
            t.insert(key, value.as_slice()).map_err(db_err)?;
            updated = item;
        }
        write_txn.commit().map_err(db_err)?;

        Ok(updated)
    }

    fn delete_item(&self, table: &str, key: &str) -> Result<(), StorageError> {
        self.require_table(table)?;

        let name = self.table_name(table);
        let write_txn = self.db.begin_write().map_err(db_err)?;
        {
            let mut t = write_txn.open_table(definition(&name)).map_err(db_err)?;
            t.remove(key).map_err(db_err)?;
        }
        write_txn.commit().map_err(db_err)?;

        Ok(())
    }
}
