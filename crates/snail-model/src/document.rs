use std::sync::Arc;

use serde_json::{Map, Value};
use uuid::Uuid;

use snail_core::{
    error_response, is_truthy, item_from_json, status, Clock, CoreError, DocumentStore, Envelope,
    Item, NumberEncoding, StorageError, SystemClock, Validator, DOCUMENT_ID,
};

use crate::lookup::Lookup;
use crate::record::{Record, CREATED_AT, OUTPUT_ID_FIELD, UPDATED_AT};
use crate::schema::Schema;

/// Active-record mapper over a [`DocumentStore`], bound to `M::COLLECTION`.
///
/// The mapper remembers the last record it loaded and whether that record
/// is known to exist in the store (see [`DocumentModel::is_present`]).
pub struct DocumentModel<M: Schema> {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    record: Option<Record<M>>,
    has_record: bool,
    error_response: Option<Envelope>,
}

impl<M: Schema> DocumentModel<M> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
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

    pub fn collection(&self) -> &'static str {
        M::COLLECTION
    }

    /// Whether the mapper currently represents a persisted record.
    pub fn is_present(&self) -> bool {
        self.has_record
    }

    /// The record loaded by the last successful read.
    pub fn record(&self) -> Option<&Record<M>> {
        self.record.as_ref()
    }

    /// The bad-request envelope from the last rejected `create`.
    pub fn error_response(&self) -> Option<&Envelope> {
        self.error_response.as_ref()
    }

    /// Validate, stamp and insert a new record, then load it back.
    ///
    /// A caller-supplied `_id` is kept; otherwise a UUID is assigned.
    /// `createdAt` and `updatedAt` are always set by the mapper.
    pub fn create(&mut self, values: Map<String, Value>) -> Result<Lookup<Record<M>>, CoreError> {
        if let Err(e) = Validator::require_fields(&values, M::REQUIRED_FIELDS) {
            tracing::error!(collection = M::COLLECTION, "{}", e);
            let envelope = error_response(status::BAD_REQUEST, &e);
            self.error_response = Some(envelope.clone());
            return Ok(Lookup::Rejected(envelope));
        }
        self.error_response = None;

        let timestamp = Value::String(self.clock.now().encode());
        let mut document = Map::new();
        document.insert(CREATED_AT.to_string(), timestamp.clone());
        document.insert(UPDATED_AT.to_string(), timestamp);

        if !values.get(DOCUMENT_ID).is_some_and(is_truthy) {
            document.insert(
                DOCUMENT_ID.to_string(),
                Value::String(Uuid::new_v4().to_string()),
            );
        }

        for (key, value) in values {
            if key == CREATED_AT || key == UPDATED_AT {
                continue;
            }
            if M::OUTPUT_ID && key == OUTPUT_ID_FIELD {
                continue;
            }
            document.insert(key, value);
        }

        let id = self
            .store
            .insert_one(M::COLLECTION, item_from_json(&document, NumberEncoding::Native))
            .map_err(|e| Self::fail("Creating record in", e))?;
        self.has_record = true;

        tracing::debug!(collection = M::COLLECTION, id = %id, "created record");
        self.get(&id)
    }

    /// Load the record with the given id.
    pub fn get(&mut self, id: &str) -> Result<Lookup<Record<M>>, CoreError> {
        let item = self
            .store
            .find_by_id(M::COLLECTION, id)
            .map_err(|e| Self::fail("Getting specific record from", e))?;
        self.recorded(item)
    }

    /// Load an arbitrary record. No ordering is guaranteed.
    pub fn get_one(&mut self) -> Result<Lookup<Record<M>>, CoreError> {
        let item = self
            .store
            .find_first(M::COLLECTION)
            .map_err(|e| Self::fail("Getting specific record from", e))?;
        self.recorded(item)
    }

    /// Every record in the collection, as new records.
    /// The mapper's loaded record is left untouched.
    pub fn list(&mut self) -> Result<Vec<Record<M>>, CoreError> {
        let items = self
            .store
            .find_all(M::COLLECTION)
            .map_err(|e| Self::fail("Getting records from", e))?;

        let records = items
            .iter()
            .map(|item| Record::hydrate(DOCUMENT_ID, item))
            .collect::<Result<Vec<_>, _>>()?;

        self.has_record = !records.is_empty();
        Ok(records)
    }

    /// Merge `values` into the stored record, then load it back.
    ///
    /// The identity and `createdAt` are never overwritten; `updatedAt` is refreshed.
    pub fn update(
        &mut self,
        id: &str,
        mut values: Map<String, Value>,
    ) -> Result<Lookup<Record<M>>, CoreError> {
        values.remove(DOCUMENT_ID);
        values.remove(CREATED_AT);
        if M::OUTPUT_ID {
            values.remove(OUTPUT_ID_FIELD);
        }
        values.insert(
            UPDATED_AT.to_string(),
            Value::String(self.clock.now().encode()),
        );

        let matched = self
            .store
            .update_one(
                M::COLLECTION,
                id,
                item_from_json(&values, NumberEncoding::Native),
            )
            .map_err(|e| Self::fail("Updating records from", e))?;
        if !matched {
            tracing::debug!(collection = M::COLLECTION, id, "update matched nothing");
        }

        self.get(id)
    }

    /// Remove the record. Returns true whether or not it existed.
    pub fn delete(&mut self, id: &str) -> Result<bool, CoreError> {
        self.store
            .delete_one(M::COLLECTION, id)
            .map_err(|e| Self::fail("Deleting records from", e))?;

        self.has_record = false;
        self.record = None;
        Ok(true)
    }

    fn recorded(&mut self, item: Option<Item>) -> Result<Lookup<Record<M>>, CoreError> {
        match item {
            Some(item) => {
                let record = Record::hydrate(DOCUMENT_ID, &item)?;
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

    fn fail(action: &str, e: StorageError) -> CoreError {
        tracing::error!("{} {}: {}", action, M::COLLECTION, e);
        e.into()
    }
}
