use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::ValidationError;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]+[\._]?[a-z0-9]+[@]\w+([.]\w{2,10})+$").expect("email regex is valid")
});

/// Check an email address against the accepted syntax.
pub fn check_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Whether a value counts as provided.
/// `null`, `false`, zero, empty strings, empty lists and empty objects do not.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Validator for incoming record values.
pub struct Validator;

impl Validator {
    /// Every required field must be present and truthy.
    /// Reports the first missing field in declaration order.
    pub fn require_fields(
        values: &Map<String, Value>,
        required: &[&str],
    ) -> Result<(), ValidationError> {
        for field in required {
            if !values.get(*field).is_some_and(is_truthy) {
                return Err(ValidationError::MissingField(field.to_string()));
            }
        }
        Ok(())
    }
}
