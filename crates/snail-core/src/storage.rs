use crate::attribute::{Filter, Item};
use crate::error::StorageError;

/// Identity field of documents in a [`DocumentStore`].
pub const DOCUMENT_ID: &str = "_id";

/// Key attribute of items in a [`TableStore`].
pub const TABLE_KEY: &str = "itemId";

/// Client for a document database: named collections of documents keyed by `_id`.
///
/// Collections come into existence on first write. Reading a collection
/// that was never written yields nothing.
pub trait DocumentStore: Send + Sync {
    /// Insert a document, generating an `_id` if it has none.
    /// Returns the id of the inserted document.
    fn insert_one(&self, collection: &str, document: Item) -> Result<String, StorageError>;

    /// Get a document by id.
    fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Item>, StorageError>;

    /// Get any single document from the collection.
    fn find_first(&self, collection: &str) -> Result<Option<Item>, StorageError>;

    /// Get all documents in the collection.
    fn find_all(&self, collection: &str) -> Result<Vec<Item>, StorageError>;

    /// Merge `set` into the document's fields.
    /// Returns true if a document matched.
    fn update_one(&self, collection: &str, id: &str, set: Item) -> Result<bool, StorageError>;

    /// Delete a document. Returns true if one was removed.
    fn delete_one(&self, collection: &str, id: &str) -> Result<bool, StorageError>;
}

/// Client for a key-value table service: tables of items keyed by `itemId`.
///
/// Tables must be created before use; every operation on a missing table
/// fails with [`StorageError::TableNotFound`].
pub trait TableStore: Send + Sync {
    /// Create a table. Creating an existing table is a no-op.
    fn create_table(&self, table: &str) -> Result<(), StorageError>;

    /// Write an item, replacing any item with the same key.
    fn put_item(&self, table: &str, key: &str, item: Item) -> Result<(), StorageError>;

    /// Get an item, optionally keeping only the named fields.
    fn get_item(
        &self,
        table: &str,
        key: &str,
        projection: Option<&[&str]>,
    ) -> Result<Option<Item>, StorageError>;

    /// Read the whole table, optionally keeping only items matching `filter`.
    fn scan(&self, table: &str, filter: Option<&Filter>) -> Result<Vec<Item>, StorageError>;

    /// Merge `set` into an existing item and return the updated item.
    /// Fails with [`StorageError::ConditionFailed`] if the item does not exist.
    fn update_existing(&self, table: &str, key: &str, set: Item) -> Result<Item, StorageError>;

    /// Delete an item. Deleting a missing item is not an error.
    fn delete_item(&self, table: &str, key: &str) -> Result<(), StorageError>;
}

// In-memory implementations for testing
#[cfg(any(test, feature = "test-utils"))]
pub mod memory {
    use super::*;
    use crate::attribute::{project, Attribute};
    use std::collections::{BTreeMap, HashMap};
    use std::sync::RwLock;

    type Collection = BTreeMap<String, Item>;

    /// In-memory document store for testing.
    #[derive(Default)]
    pub struct InMemoryDocumentStore {
        collections: RwLock<HashMap<String, Collection>>,
    }

    impl InMemoryDocumentStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl DocumentStore for InMemoryDocumentStore {
        fn insert_one(&self, collection: &str, mut document: Item) -> Result<String, StorageError> {
            let id = match document.get(DOCUMENT_ID).and_then(Attribute::as_key) {
                Some(id) => id,
                None => uuid::Uuid::new_v4().to_string(),
            };
            document.insert(DOCUMENT_ID.to_string(), Attribute::Text(id.clone()));

            let mut collections = self.collections.write().unwrap();
            let docs = collections.entry(collection.to_string()).or_default();
            if docs.contains_key(&id) {
                return Err(StorageError::DuplicateKey {
                    collection: collection.to_string(),
                    id,
                });
            }
            docs.insert(id.clone(), document);
            Ok(id)
        }

        fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Item>, StorageError> {
            let collections = self.collections.read().unwrap();
            Ok(collections.get(collection).and_then(|c| c.get(id)).cloned())
        }

        fn find_first(&self, collection: &str) -> Result<Option<Item>, StorageError> {
            let collections = self.collections.read().unwrap();
            Ok(collections
                .get(collection)
                .and_then(|c| c.values().next())
                .cloned())
        }

        fn find_all(&self, collection: &str) -> Result<Vec<Item>, StorageError> {
            let collections = self.collections.read().unwrap();
            Ok(collections
                .get(collection)
                .map(|c| c.values().cloned().collect())
                .unwrap_or_default())
        }

        fn update_one(&self, collection: &str, id: &str, set: Item) -> Result<bool, StorageError> {
            let mut collections = self.collections.write().unwrap();
            match collections.get_mut(collection).and_then(|c| c.get_mut(id)) {
                Some(doc) => {
                    doc.extend(set);
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        fn delete_one(&self, collection: &str, id: &str) -> Result<bool, StorageError> {
            let mut collections = self.collections.write().unwrap();
            Ok(collections
                .get_mut(collection)
                .is_some_and(|c| c.remove(id).is_some()))
        }
    }

    /// In-memory table store for testing.
    #[derive(Default)]
    pub struct InMemoryTableStore {
        tables: RwLock<HashMap<String, Collection>>,
    }

    impl InMemoryTableStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a store with the given tables already created.
        pub fn with_tables(tables: &[&str]) -> Self {
            let store = Self::new();
            for table in tables {
                store
                    .tables
                    .write()
                    .unwrap()
                    .insert(table.to_string(), Collection::new());
            }
            store
        }
    }

    fn missing(table: &str) -> StorageError {
        StorageError::TableNotFound(table.to_string())
    }

    impl TableStore for InMemoryTableStore {
        fn create_table(&self, table: &str) -> Result<(), StorageError> {
            self.tables
                .write()
                .unwrap()
                .entry(table.to_string())
                .or_default();
            Ok(())
        }

        fn put_item(&self, table: &str, key: &str, item: Item) -> Result<(), StorageError> {
            let mut tables = self.tables.write().unwrap();
            let items = tables.get_mut(table).ok_or_else(|| missing(table))?;
            items.insert(key.to_string(), item);
            Ok(())
        }

        fn get_item(
            &self,
            table: &str,
            key: &str,
            projection: Option<&[&str]>,
        ) -> Result<Option<Item>, StorageError> {
            let tables = self.tables.read().unwrap();
            let items = tables.get(table).ok_or_else(|| missing(table))?;
            Ok(items.get(key).cloned().map(|item| match projection {
                Some(fields) => project(item, fields),
                None => item,
            }))
        }

        fn scan(&self, table: &str, filter: Option<&Filter>) -> Result<Vec<Item>, StorageError> {
            let tables = self.tables.read().unwrap();
            let items = tables.get(table).ok_or_else(|| missing(table))?;
            Ok(items
                .values()
                .filter(|item| filter.map_or(true, |f| f.matches(item)))
                .cloned()
                .collect())
        }

        fn update_existing(&self, table: &str, key: &str, set: Item) -> Result<Item, StorageError> {
            let mut tables = self.tables.write().unwrap();
            let items = tables.get_mut(table).ok_or_else(|| missing(table))?;
            let item = items
                .get_mut(key)
                .ok_or_else(|| StorageError::ConditionFailed {
                    table: table.to_string(),
                    key: key.to_string(),
                })?;
            item.extend(set);
            Ok(item.clone())
        }

        fn delete_item(&self, table: &str, key: &str) -> Result<(), StorageError> {
            let mut tables = self.tables.write().unwrap();
            let items = tables.get_mut(table).ok_or_else(|| missing(table))?;
            items.remove(key);
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn doc(name: &str) -> Item {
            let mut item = Item::new();
            item.insert("name".to_string(), Attribute::Text(name.to_string()));
            item
        }

        #[test]
        fn test_document_insert_generates_id() {
            let store = InMemoryDocumentStore::new();
            let id = store.insert_one("people", doc("Ada")).unwrap();
            assert!(uuid::Uuid::parse_str(&id).is_ok());

            let stored = store.find_by_id("people", &id).unwrap().unwrap();
            assert_eq!(stored.get(DOCUMENT_ID), Some(&Attribute::Text(id)));
        }

        #[test]
        fn test_document_duplicate_id_rejected() {
            let store = InMemoryDocumentStore::new();
            let mut d = doc("Ada");
            d.insert(DOCUMENT_ID.to_string(), Attribute::Text("a1".to_string()));
            store.insert_one("people", d.clone()).unwrap();

            let err = store.insert_one("people", d).unwrap_err();
            assert!(matches!(err, StorageError::DuplicateKey { .. }));
        }

        #[test]
        fn test_document_unknown_collection_is_empty() {
            let store = InMemoryDocumentStore::new();
            assert!(store.find_all("nothing").unwrap().is_empty());
            assert!(store.find_first("nothing").unwrap().is_none());
            assert!(!store.delete_one("nothing", "x").unwrap());
        }

        #[test]
        fn test_document_update_merges() {
            let store = InMemoryDocumentStore::new();
            let id = store.insert_one("people", doc("Ada")).unwrap();

            let mut set = Item::new();
            set.insert("age".to_string(), Attribute::Int(36));
            assert!(store.update_one("people", &id, set.clone()).unwrap());
            assert!(!store.update_one("people", "missing", set).unwrap());

            let stored = store.find_by_id("people", &id).unwrap().unwrap();
            assert_eq!(stored.get("name"), Some(&Attribute::Text("Ada".to_string())));
            assert_eq!(stored.get("age"), Some(&Attribute::Int(36)));
        }

        #[test]
        fn test_table_requires_creation() {
            let store = InMemoryTableStore::new();
            let err = store.scan("items", None).unwrap_err();
            assert_eq!(err, StorageError::TableNotFound("items".to_string()));

            store.create_table("items").unwrap();
            assert!(store.scan("items", None).unwrap().is_empty());
        }

        #[test]
        fn test_table_conditional_update() {
            let store = InMemoryTableStore::with_tables(&["items"]);
            let err = store.update_existing("items", "k1", doc("x")).unwrap_err();
            assert!(matches!(err, StorageError::ConditionFailed { .. }));

            store.put_item("items", "k1", doc("bolt")).unwrap();
            let updated = store.update_existing("items", "k1", doc("nut")).unwrap();
            assert_eq!(updated.get("name"), Some(&Attribute::Text("nut".to_string())));
        }

        #[test]
        fn test_table_scan_filter_and_projection() {
            let store = InMemoryTableStore::with_tables(&["items"]);
            store.put_item("items", "k1", doc("bolt")).unwrap();
            store.put_item("items", "k2", doc("nut")).unwrap();

            let filter = Filter::eq("name", Attribute::Text("nut".to_string()));
            assert_eq!(store.scan("items", Some(&filter)).unwrap().len(), 1);
            assert_eq!(store.scan("items", None).unwrap().len(), 2);

            let projected = store.get_item("items", "k1", Some(&["other"])).unwrap().unwrap();
            assert!(projected.is_empty());

            store.delete_item("items", "k1").unwrap();
            store.delete_item("items", "k1").unwrap();
            assert!(store.get_item("items", "k1", None).unwrap().is_none());
        }
    }
}
