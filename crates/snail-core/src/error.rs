use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid timestamp in {field}: {value}")]
    Timestamp { field: String, value: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Message text is part of the API: clients match on it.
    #[error("field: {0} is required!")]
    MissingField(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    #[error("Duplicate key in {collection}: {id}")]
    DuplicateKey { collection: String, id: String },

    #[error("Conditional update failed in {table}: item {key} does not exist")]
    ConditionFailed { table: String, key: String },

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Database error: {0}")]
    Database(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_message() {
        let err = ValidationError::MissingField("name".to_string());
        assert_eq!(err.to_string(), "field: name is required!");
    }

    #[test]
    fn test_core_error_wraps_storage() {
        let err: CoreError = StorageError::TableNotFound("items".to_string()).into();
        assert!(matches!(err, CoreError::Storage(StorageError::TableNotFound(_))));
        assert_eq!(err.to_string(), "Storage error: Table not found: items");
    }
}
