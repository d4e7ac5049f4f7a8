use serde_json::{Map, Value};

use crate::response::status;

/// Settings keys an account needs to reach its Odoo server, in order.
pub const ODOO_LOGIN_KEYS: [&str; 4] = ["odoo_host", "odoo_db", "odoo_login", "odoo_password"];

/// Anything carrying a `user_settings` mapping.
pub trait UserSettings {
    fn user_settings(&self) -> Option<&Map<String, Value>>;
}

impl UserSettings for Map<String, Value> {
    fn user_settings(&self) -> Option<&Map<String, Value>> {
        self.get("user_settings").and_then(Value::as_object)
    }
}

/// Result of checking the primary account's Odoo login details.
#[derive(Debug, Clone, PartialEq)]
pub struct OdooConnection {
    pub status: u16,
    pub fail_message: String,
    /// Values of [`ODOO_LOGIN_KEYS`], in order. Empty unless the check passed.
    pub login_details: Vec<Value>,
}

impl OdooConnection {
    /// Check the first user's settings for the four login keys.
    pub fn new<U: UserSettings>(users: &[U]) -> Self {
        let Some(primary) = users.first() else {
            return Self::failed("No primary account found");
        };

        let settings = primary.user_settings();
        let complete = ODOO_LOGIN_KEYS
            .iter()
            .all(|key| settings.is_some_and(|s| s.contains_key(*key)));
        let Some(settings) = settings.filter(|_| complete) else {
            return Self::failed("Login details are required");
        };

        Self {
            status: status::OK,
            fail_message: String::new(),
            login_details: ODOO_LOGIN_KEYS
                .iter()
                .map(|key| settings.get(*key).cloned().unwrap_or(Value::Null))
                .collect(),
        }
    }

    fn failed(message: &str) -> Self {
        Self {
            status: status::FORBIDDEN,
            fail_message: message.to_string(),
            login_details: Vec::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == status::OK
    }
}
