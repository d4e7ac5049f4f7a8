use std::marker::PhantomData;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use snail_core::{normalize_item, CoreError, Item, Stamp, DOCUMENT_ID};

use crate::schema::Schema;

/// Creation time, stored as string-encoded epoch seconds.
pub const CREATED_AT: &str = "createdAt";

/// Last update time, stored as string-encoded epoch seconds.
pub const UPDATED_AT: &str = "updatedAt";

/// Attribute exposing a document's `_id` when [`Schema::OUTPUT_ID`] is set.
pub const OUTPUT_ID_FIELD: &str = "id";

/// A record of schema `M`: a bag of named JSON attributes.
///
/// Assigning `createdAt` or `updatedAt` keeps the typed [`Stamp`] and stores
/// its display string as the attribute. Keys starting with `_` are private:
/// they are not hydrated from the store (except `_id`) and never serialized.
pub struct Record<M> {
    id_field: &'static str,
    attributes: Map<String, Value>,
    created_at: Option<Stamp>,
    updated_at: Option<Stamp>,
    schema: PhantomData<fn() -> M>,
}

impl<M: Schema> Record<M> {
    /// An empty record whose identity lives in `id_field`.
    pub fn new(id_field: &'static str) -> Self {
        Self {
            id_field,
            attributes: Map::new(),
            created_at: None,
            updated_at: None,
            schema: PhantomData,
        }
    }

    /// Build a record from a stored item.
    pub fn hydrate(id_field: &'static str, item: &Item) -> Result<Self, CoreError> {
        let mut record = Self::new(id_field);
        for (key, value) in normalize_item(item) {
            if key.starts_with('_') && key != DOCUMENT_ID {
                continue;
            }
            record.set(&key, value)?;
        }
        Ok(record)
    }

    /// Assign an attribute.
    pub fn set(&mut self, name: &str, value: Value) -> Result<(), CoreError> {
        match name {
            CREATED_AT | UPDATED_AT => {
                let stamp = parse_stamp(&value).ok_or_else(|| CoreError::Timestamp {
                    field: name.to_string(),
                    value: value.to_string(),
                })?;
                if name == CREATED_AT {
                    self.created_at = Some(stamp);
                } else {
                    self.updated_at = Some(stamp);
                }
                self.attributes
                    .insert(name.to_string(), Value::String(stamp.display()));
            }
            DOCUMENT_ID if M::OUTPUT_ID && self.id_field == DOCUMENT_ID => {
                if let Some(id) = key_of(&value) {
                    self.attributes
                        .insert(OUTPUT_ID_FIELD.to_string(), Value::String(id));
                }
                self.attributes.insert(name.to_string(), value);
            }
            _ => {
                self.attributes.insert(name.to_string(), value);
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// The record's identity, if it has one.
    pub fn id(&self) -> Option<String> {
        self.get(self.id_field).and_then(key_of)
    }

    pub fn created_at(&self) -> Option<Stamp> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<Stamp> {
        self.updated_at
    }

    /// Public attributes, i.e. those not starting with `_`.
    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.attributes.iter().filter(|(k, _)| !k.starts_with('_'))
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

impl<M> Clone for Record<M> {
    fn clone(&self) -> Self {
        Self {
            id_field: self.id_field,
            attributes: self.attributes.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            schema: PhantomData,
        }
    }
}

impl<M> std::fmt::Debug for Record<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Record")
            .field("id_field", &self.id_field)
            .field("attributes", &self.attributes)
            .finish()
    }
}

impl<M> PartialEq for Record<M> {
    fn eq(&self, other: &Self) -> bool {
        self.id_field == other.id_field && self.attributes == other.attributes
    }
}

impl<M: Schema> Serialize for Record<M> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.fields())
    }
}

fn parse_stamp(value: &Value) -> Option<Stamp> {
    match value {
        Value::String(s) => Stamp::parse(s),
        Value::Number(n) => n.as_f64().map(Stamp::from_secs),
        _ => None,
    }
}

/// Render an identity value as a string: non-empty strings and numbers only.
pub(crate) fn key_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use snail_core::{Attribute, TABLE_KEY};

    struct Note;
    impl Schema for Note {
        const COLLECTION: &'static str = "notes";
    }

    struct Hidden;
    impl Schema for Hidden {
        const COLLECTION: &'static str = "hidden";
        const OUTPUT_ID: bool = false;
    }

    fn stored() -> Item {
        let mut item = Item::new();
        item.insert(DOCUMENT_ID.to_string(), Attribute::Text("n-1".into()));
        item.insert(CREATED_AT.to_string(), Attribute::Text("1718000000.75".into()));
        item.insert(UPDATED_AT.to_string(), Attribute::Text("1718000100.0".into()));
        item.insert("_secret".to_string(), Attribute::Text("x".into()));
        item.insert("title".to_string(), Attribute::Text("Hello".into()));
        item
    }

    #[test]
    fn test_hydrate() {
        let record = Record::<Note>::hydrate(DOCUMENT_ID, &stored()).unwrap();

        assert_eq!(record.id(), Some("n-1".to_string()));
        assert_eq!(record.get_str(OUTPUT_ID_FIELD), Some("n-1"));
        assert_eq!(record.get_str("title"), Some("Hello"));
        assert_eq!(record.get("_secret"), None);
        assert_eq!(record.get_str(CREATED_AT), Some("Jun 10 2024 06:13:20"));
        assert_eq!(record.created_at(), Some(Stamp::from_secs(1718000000.75)));
        assert_eq!(record.updated_at(), Some(Stamp::from_secs(1718000100.0)));
    }

    #[test]
    fn test_output_id_disabled() {
        let record = Record::<Hidden>::hydrate(DOCUMENT_ID, &stored()).unwrap();
        assert_eq!(record.id(), Some("n-1".to_string()));
        assert_eq!(record.get(OUTPUT_ID_FIELD), None);
    }

    #[test]
    fn test_serialize_hides_private_keys() {
        let record = Record::<Note>::hydrate(DOCUMENT_ID, &stored()).unwrap();
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value, record.to_json());
        assert_eq!(value["id"], "n-1");
        assert_eq!(value["title"], "Hello");
        assert!(value.get("_id").is_none());
        assert!(value.get("_secret").is_none());
    }

    #[test]
    fn test_bad_timestamp() {
        let mut record = Record::<Note>::new(DOCUMENT_ID);
        let err = record.set(CREATED_AT, json!("yesterday")).unwrap_err();
        assert!(matches!(err, CoreError::Timestamp { .. }));

        record.set(UPDATED_AT, json!(0)).unwrap();
        assert_eq!(record.get_str(UPDATED_AT), Some("Jan 01 1970 00:00:00"));
    }

    #[test]
    fn test_table_record_ignores_document_id() {
        let mut item = stored();
        item.insert(TABLE_KEY.to_string(), Attribute::Text("p-1".into()));

        let record = Record::<Note>::hydrate(TABLE_KEY, &item).unwrap();
        assert_eq!(record.id(), Some("p-1".to_string()));
        assert_eq!(record.get(OUTPUT_ID_FIELD), None);
    }

    #[test]
    fn test_numeric_key() {
        let mut record = Record::<Note>::new(TABLE_KEY);
        record.set(TABLE_KEY, json!(42)).unwrap();
        assert_eq!(record.id(), Some("42".to_string()));
    }
}
