//! SQLite storage backend.
//!
//! Provides:
//! - Schema creation and the upsert/select SQL
//! - Dedicated writer thread owning the connection and prepared statement
//! - The `SqliteSettingsStore` settings manager

pub mod schema;
pub mod store;
pub mod writer;

pub use store::{hydrate, SqliteSettingsStore, SqliteStoreConfig};
