use serde_json::{Map, Value};

use snail_core::UserSettings;

use crate::record::Record;
use crate::schema::Schema;

/// An account, stored in the `users` document collection.
pub struct User;

impl Schema for User {
    const COLLECTION: &'static str = "users";
    const REQUIRED_FIELDS: &'static [&'static str] = &["email"];
}

impl Record<User> {
    pub fn email(&self) -> Option<&str> {
        self.get_str("email")
    }

    /// Per-user configuration, e.g. Odoo login details.
    pub fn user_settings(&self) -> Option<&Map<String, Value>> {
        self.get("user_settings").and_then(Value::as_object)
    }
}

impl UserSettings for Record<User> {
    fn user_settings(&self) -> Option<&Map<String, Value>> {
        Record::<User>::user_settings(self)
    }
}

/// A catalogue entry, stored in the `products` key-value table.
pub struct Product;

impl Schema for Product {
    const COLLECTION: &'static str = "products";
    const REQUIRED_FIELDS: &'static [&'static str] = &["name"];
}

impl Record<Product> {
    pub fn name(&self) -> Option<&str> {
        self.get_str("name")
    }

    pub fn price(&self) -> Option<f64> {
        self.get("price").and_then(Value::as_f64)
    }
}
