//! Snail Core - Stored values, store traits, validation and response helpers.
//!
//! This crate holds everything the record mappers and the HTTP layer share.
//! It has no dependencies on other Snail crates.

pub mod attribute;
pub mod credentials;
pub mod error;
pub mod event_log;
pub mod response;
pub mod stamp;
pub mod storage;
pub mod validation;

// Re-exports for convenience
pub use attribute::{item_from_json, normalize_item, project, Attribute, Filter, Item, NumberEncoding};
pub use credentials::{OdooConnection, UserSettings, ODOO_LOGIN_KEYS};
pub use error::{CoreError, StorageError, ValidationError};
pub use event_log::{log_event, log_event_body};
pub use response::{error_response, response, status, CorsHeaders, Envelope};
pub use stamp::{Clock, Stamp, SystemClock, DISPLAY_FORMAT};
pub use storage::{DocumentStore, TableStore, DOCUMENT_ID, TABLE_KEY};
pub use validation::{check_email, is_truthy, Validator};

#[cfg(any(test, feature = "test-utils"))]
pub use stamp::ManualClock;
#[cfg(any(test, feature = "test-utils"))]
pub use storage::memory::{InMemoryDocumentStore, InMemoryTableStore};
