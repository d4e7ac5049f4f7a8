//! Snail Model - Active-record mappers over the document and table stores.
//!
//! A record type declares its collection and required fields through
//! [`Schema`]; [`DocumentModel`] and [`TableModel`] then create, read,
//! update and delete [`Record`]s of that type through an injected store.

pub mod document;
pub mod entities;
pub mod lookup;
pub mod record;
pub mod schema;
pub mod table;

// Re-exports for convenience
pub use document::DocumentModel;
pub use entities::{Product, User};
pub use lookup::{Change, Lookup};
pub use record::{Record, CREATED_AT, OUTPUT_ID_FIELD, UPDATED_AT};
pub use schema::Schema;
pub use table::TableModel;
