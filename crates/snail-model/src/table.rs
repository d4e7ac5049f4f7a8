use std::sync::Arc;

use serde_json::{Map, Value};
use uuid::Uuid;

use snail_core::{
    error_response, is_truthy, item_from_json, normalize_item, status, Attribute, Clock,
    CoreError, Envelope, Filter, Item, NumberEncoding, StorageError, SystemClock, TableStore,
    Validator, TABLE_KEY,
};

use crate::lookup::{Change, Lookup};
use crate::record::{key_of, Record, CREATED_AT, UPDATED_AT};
use crate::schema::Schema;

/// Active-record mapper over a [`TableStore`], bound to table `M::COLLECTION`.
///
/// Numbers are written as decimals and read back as floats.
pub struct TableModel<M: Schema> {
    store: Arc<dyn TableStore>,
    clock: Arc<dyn Clock>,
    record: Option<Record<M>>,
    has_record: bool,
    error_response: Option<Envelope>,
}

impl<M: Schema> TableModel<M> {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            record: None,
            has_record: false,
            error_response: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn table(&self) -> &'static str {
        M::COLLECTION
    }

    pub fn is_present(&self) -> bool {
        self.has_record
    }

    pub fn record(&self) -> Option<&Record<M>> {
        self.record.as_ref()
    }

    pub fn error_response(&self) -> Option<&Envelope> {
        self.error_response.as_ref()
    }

    /// Validate, stamp and put a new item, then load it back.
    ///
    /// An `itemId` is generated only when the caller did not supply one.
    pub fn save(&mut self, values: Map<String, Value>) -> Result<Lookup<Record<M>>, CoreError> {
        if let Err(e) = Validator::require_fields(&values, M::REQUIRED_FIELDS) {
            tracing::error!(table = M::COLLECTION, "{}", e);
            let envelope = error_response(status::BAD_REQUEST, &e);
            self.error_response = Some(envelope.clone());
            return Ok(Lookup::Rejected(envelope));
        }
        self.error_response = None;

        let key = values
            .get(TABLE_KEY)
            .filter(|v| is_truthy(v))
            .and_then(key_of)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let timestamp = Value::String(self.clock.now().encode());
        let mut item = Map::new();
        item.insert(CREATED_AT.to_string(), timestamp.clone());
        item.insert(UPDATED_AT.to_string(), timestamp);
        for (k, v) in values {
            if k != CREATED_AT && k != UPDATED_AT {
                item.insert(k, v);
            }
        }
        item.insert(TABLE_KEY.to_string(), Value::String(key.clone()));

        self.store
            .put_item(
                M::COLLECTION,
                &key,
                item_from_json(&item, NumberEncoding::Decimal),
            )
            .map_err(|e| Self::fail("Saving item to", e))?;

        self.has_record = true;
        tracing::debug!(table = M::COLLECTION, key = %key, "saved item");
        self.get(&key)
    }

    /// Load the item with the given key.
    pub fn get(&mut self, id: &str) -> Result<Lookup<Record<M>>, CoreError> {
        let item = self
            .store
            .get_item(M::COLLECTION, id, None)
            .map_err(|e| Self::fail("Getting item from", e))?;

        match item {
            Some(item) => {
                let record = Record::hydrate(TABLE_KEY, &item)?;
                self.has_record = true;
                self.record = Some(record.clone());
                Ok(Lookup::Found(record))
            }
            None => {
                self.has_record = false;
                self.record = None;
                Ok(Lookup::NotFound)
            }
        }
    }

    /// The stored fields of an item as a plain mapping, optionally projected.
    ///
    /// Numbers are normalized, timestamps are left in their stored form, and
    /// the mapper's loaded record is untouched.
    pub fn get_dict(
        &self,
        id: &str,
        fields: Option<&[&str]>,
    ) -> Result<Option<Map<String, Value>>, CoreError> {
        let item = self
            .store
            .get_item(M::COLLECTION, id, fields)
            .map_err(|e| Self::fail("Getting item from", e))?;
        Ok(item.as_ref().map(normalize_item))
    }

    /// Every item in the table. Unpaginated.
    pub fn list(&mut self) -> Result<Vec<Record<M>>, CoreError> {
        self.scan(None)
    }

    /// Every item whose `attribute` equals `value`. Unpaginated full scan.
    pub fn search(&mut self, attribute: &str, value: &Value) -> Result<Vec<Record<M>>, CoreError> {
        self.search_any(attribute, std::slice::from_ref(value))
    }

    /// Every item whose `attribute` equals any of `values`.
    pub fn search_any(
        &mut self,
        attribute: &str,
        values: &[Value],
    ) -> Result<Vec<Record<M>>, CoreError> {
        let filter = Filter::one_of(
            attribute,
            values
                .iter()
                .map(|v| Attribute::from_json(v, NumberEncoding::Decimal))
                .collect(),
        );
        self.scan(Some(&filter))
    }

    fn scan(&mut self, filter: Option<&Filter>) -> Result<Vec<Record<M>>, CoreError> {
        let items = self
            .store
            .scan(M::COLLECTION, filter)
            .map_err(|e| Self::fail("Scanning", e))?;

        let records = items
            .iter()
            .map(|item| Record::hydrate(TABLE_KEY, item))
            .collect::<Result<Vec<_>, _>>()?;

        self.has_record = !records.is_empty();
        Ok(records)
    }

    /// Write only the fields that differ from the stored item.
    ///
    /// `itemId`, `createdAt` and `updatedAt` are never taken from `values`.
    /// When something changed, `updatedAt` is refreshed and the write is
    /// conditional on the item still existing.
    pub fn update(
        &mut self,
        id: &str,
        values: Map<String, Value>,
    ) -> Result<Change<Record<M>>, CoreError> {
        let current = match self
            .store
            .get_item(M::COLLECTION, id, None)
            .map_err(|e| Self::fail("Getting item from", e))?
        {
            Some(item) => item,
            None => {
                self.has_record = false;
                self.record = None;
                return Ok(Change::Missing);
            }
        };
        self.has_record = true;

        let mut changes = Item::new();
        for (key, value) in &values {
            if matches!(key.as_str(), TABLE_KEY | CREATED_AT | UPDATED_AT) {
                continue;
            }
            let proposed = Attribute::from_json(value, NumberEncoding::Decimal);
            if !current.get(key).is_some_and(|v| v.loosely_eq(&proposed)) {
                changes.insert(key.clone(), proposed);
            }
        }

        if changes.is_empty() {
            tracing::info!(table = M::COLLECTION, id, "no changes");
            return Ok(Change::Unchanged);
        }

        changes.insert(
            UPDATED_AT.to_string(),
            Attribute::Text(self.clock.now().encode()),
        );
        let updated = self
            .store
            .update_existing(M::COLLECTION, id, changes)
            .map_err(|e| Self::fail("Updating item in", e))?;

        let record = Record::hydrate(TABLE_KEY, &updated)?;
        self.record = Some(record.clone());
        Ok(Change::Updated(record))
    }

    /// Remove the item unconditionally. Always returns true.
    pub fn delete(&mut self, id: &str) -> Result<bool, CoreError> {
        self.has_record = false;
        self.record = None;
        self.store
            .delete_item(M::COLLECTION, id)
            .map_err(|e| Self::fail("Deleting item from", e))?;
        Ok(true)
    }

    fn fail(action: &str, e: StorageError) -> CoreError {
        tracing::error!("{} {}: {}", action, M::COLLECTION, e);
        e.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use snail_core::{InMemoryTableStore, ManualClock, Stamp};

    struct Part;
    impl Schema for Part {
        const COLLECTION: &'static str = "parts";
        const REQUIRED_FIELDS: &'static [&'static str] = &["name"];
    }

    /// Table store that loses every item between the read and the write.
    struct VanishingStore(InMemoryTableStore);

    impl TableStore for VanishingStore {
        fn create_table(&self, table: &str) -> Result<(), StorageError> {
            self.0.create_table(table)
        }
        fn put_item(&self, table: &str, key: &str, item: Item) -> Result<(), StorageError> {
            self.0.put_item(table, key, item)
        }
        fn get_item(
            &self,
            table: &str,
            key: &str,
            projection: Option<&[&str]>,
        ) -> Result<Option<Item>, StorageError> {
            self.0.get_item(table, key, projection)
        }
        fn scan(&self, table: &str, filter: Option<&Filter>) -> Result<Vec<Item>, StorageError> {
            self.0.scan(table, filter)
        }
        fn update_existing(&self, table: &str, key: &str, set: Item) -> Result<Item, StorageError> {
            self.0.delete_item(table, key)?;
            self.0.update_existing(table, key, set)
        }
        fn delete_item(&self, table: &str, key: &str) -> Result<(), StorageError> {
            self.0.delete_item(table, key)
        }
    }

    fn values(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    fn setup() -> (Arc<InMemoryTableStore>, Arc<ManualClock>, TableModel<Part>) {
        let store = Arc::new(InMemoryTableStore::with_tables(&["parts"]));
        let clock = Arc::new(ManualClock::new(1718000000.0));
        let model = TableModel::<Part>::new(store.clone()).with_clock(clock.clone());
        (store, clock, model)
    }

    fn save(model: &mut TableModel<Part>, v: Value) -> Record<Part> {
        model.save(values(v)).unwrap().found().unwrap()
    }

    #[test]
    fn test_save_generates_key() {
        let (_, _, mut model) = setup();

        let record = save(&mut model, json!({"name": "bolt", "qty": 3}));

        let id = record.id().unwrap();
        assert!(Uuid::parse_str(&id).is_ok());
        assert_eq!(record.get_str(TABLE_KEY), Some(id.as_str()));
        assert_eq!(record.get_str("name"), Some("bolt"));
        // Numbers come back as floats
        assert_eq!(record.get("qty"), Some(&json!(3.0)));
        assert_eq!(record.created_at(), record.updated_at());
        assert!(model.is_present());
    }

    #[test]
    fn test_save_keeps_supplied_key() {
        let (_, _, mut model) = setup();

        let record = save(&mut model, json!({"itemId": "p-1", "name": "bolt"}));
        assert_eq!(record.id(), Some("p-1".to_string()));

        // Saving the same key replaces the item
        save(&mut model, json!({"itemId": "p-1", "name": "nut"}));
        let all = model.list().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].get_str("name"), Some("nut"));
    }

    #[test]
    fn test_save_missing_required_field() {
        let (store, _, mut model) = setup();

        let result = model.save(values(json!({"qty": 1}))).unwrap();
        let Lookup::Rejected(envelope) = result else {
            panic!("expected rejection");
        };
        assert_eq!(envelope.body, json!({"error": "field: name is required!"}));
        assert_eq!(model.error_response(), Some(&envelope));
        assert!(store.scan("parts", None).unwrap().is_empty());
    }

    #[test]
    fn test_list_and_search() {
        let (_, _, mut model) = setup();

        assert!(model.list().unwrap().is_empty());
        assert!(!model.is_present());

        save(&mut model, json!({"name": "bolt", "qty": 3}));
        save(&mut model, json!({"name": "nut", "qty": 3}));
        save(&mut model, json!({"name": "nut", "qty": 10}));

        assert_eq!(model.list().unwrap().len(), 3);
        assert_eq!(model.search("name", &json!("nut")).unwrap().len(), 2);
        assert_eq!(model.search("qty", &json!(3)).unwrap().len(), 2);
        assert_eq!(model.search("qty", &json!(3.0)).unwrap().len(), 2);
        assert!(model.search("name", &json!("washer")).unwrap().is_empty());
        assert!(!model.is_present());
    }

    #[test]
    fn test_search_any_matches_numeric_text() {
        let (_, _, mut model) = setup();

        save(&mut model, json!({"itemId": "42", "name": "123"}));
        save(&mut model, json!({"itemId": "p-2", "name": "nut", "qty": 42}));

        assert!(model.search(TABLE_KEY, &json!(42)).unwrap().is_empty());

        let found = model
            .search_any(TABLE_KEY, &[json!(42), json!("42")])
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), Some("42".to_string()));

        let found = model.search_any("qty", &[json!(42), json!("42")]).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), Some("p-2".to_string()));
    }

    #[test]
    fn test_get_dict() {
        let (_, _, mut model) = setup();
        let id = save(
            &mut model,
            json!({"name": "bolt", "dims": {"len": 2.5, "inner": {"d": 1}}}),
        )
        .id()
        .unwrap();

        let full = model.get_dict(&id, None).unwrap().unwrap();
        assert_eq!(full["createdAt"], json!("1718000000.0"));
        assert_eq!(full["dims"]["len"], json!(2.5));
        assert_eq!(full["dims"]["inner"]["d"], json!(1.0));

        let projected = model.get_dict(&id, Some(&["name"])).unwrap().unwrap();
        assert_eq!(projected.len(), 1);
        assert_eq!(projected["name"], "bolt");

        assert!(model.get_dict("missing", None).unwrap().is_none());
    }

    #[test]
    fn test_update_changed_fields() {
        let (store, clock, mut model) = setup();
        let created = save(&mut model, json!({"name": "bolt", "qty": 3}));
        let id = created.id().unwrap();

        clock.advance(5.0);
        let result = model
            .update(&id, values(json!({"name": "bolt", "qty": 4, "createdAt": "1.0"})))
            .unwrap();
        let Change::Updated(updated) = result else {
            panic!("expected update");
        };

        assert_eq!(updated.get("qty"), Some(&json!(4.0)));
        assert_eq!(updated.created_at(), created.created_at());
        assert_eq!(updated.updated_at(), Some(Stamp::from_secs(1718000005.0)));
        assert!(updated.updated_at() > created.updated_at());

        let stored = store.get_item("parts", &id, None).unwrap().unwrap();
        assert_eq!(stored.get("qty"), Some(&Attribute::Decimal("4".to_string())));
    }

    #[test]
    fn test_update_without_changes() {
        let (_, clock, mut model) = setup();
        let created = save(&mut model, json!({"name": "bolt", "qty": 3}));
        let id = created.id().unwrap();

        clock.advance(5.0);
        let result = model
            .update(&id, values(json!({"name": "bolt", "qty": 3.0, "itemId": "other"})))
            .unwrap();
        assert_eq!(result, Change::Unchanged);
        assert_eq!(result.to_string(), "no changes");

        let reloaded = model.get(&id).unwrap().found().unwrap();
        assert_eq!(reloaded.updated_at(), created.updated_at());
    }

    #[test]
    fn test_update_missing() {
        let (_, _, mut model) = setup();
        assert_eq!(
            model.update("nope", values(json!({"qty": 1}))).unwrap(),
            Change::Missing
        );
        assert!(!model.is_present());
    }

    #[test]
    fn test_update_fails_when_item_vanishes() {
        let store = VanishingStore(InMemoryTableStore::with_tables(&["parts"]));
        let mut model = TableModel::<Part>::new(Arc::new(store));
        let id = save(&mut model, json!({"name": "bolt"})).id().unwrap();

        let err = model
            .update(&id, values(json!({"name": "nut"})))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Storage(StorageError::ConditionFailed { .. })
        ));
    }

    #[test]
    fn test_delete() {
        let (_, _, mut model) = setup();
        let id = save(&mut model, json!({"name": "bolt"})).id().unwrap();

        assert!(model.delete(&id).unwrap());
        assert!(!model.is_present());
        assert_eq!(model.get(&id).unwrap(), Lookup::NotFound);

        // Unconditional: deleting again is fine
        assert!(model.delete(&id).unwrap());
        assert!(!model.is_present());
    }

    #[test]
    fn test_missing_table_propagates() {
        let store = Arc::new(InMemoryTableStore::new());
        let mut model = TableModel::<Part>::new(store);

        assert!(matches!(
            model.list(),
            Err(CoreError::Storage(StorageError::TableNotFound(_)))
        ));
        assert!(model.save(values(json!({"name": "bolt"}))).is_err());
    }
}
