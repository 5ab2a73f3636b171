//! nsettings: namespaced settings persisted to SQLite.
//!
//! Settings are grouped by namespace. Each namespace holds a JSON object that
//! lives in an in-memory [`SettingsCache`] for reads and is written back to a
//! single-table SQLite database on demand.
//!
//! # Lifecycle
//!
//! 1. Construct a store with a database path (no I/O happens yet).
//! 2. Await [`SettingsManager::init`]: open, ensure the table, prepare the
//!    upsert, hydrate the cache.
//! 3. Read and mutate [`SettingsManager::settings`] freely.
//! 4. Call [`SettingsManager::update`] to persist a namespace.
//!
//! # Modules
//!
//! - [`config`]: CLI and environment configuration
//! - [`error`]: Error types
//! - [`manager`]: The backend-agnostic settings manager contract
//! - [`observability`]: Tracing setup and diagnostic sinks
//! - [`storage`]: SQLite persistence layer

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions,    // storage::store::SqliteSettingsStore is fine
    clippy::must_use_candidate,         // Not all functions need #[must_use]
    clippy::missing_errors_doc,         // Error docs can be verbose
    clippy::needless_raw_string_hashes  // r#""# is fine for SQL
)]

pub mod config;
pub mod error;
pub mod manager;
pub mod observability;
pub mod storage;

pub use error::StoreError;
pub use manager::{MemorySettingsManager, PendingWrite, Settings, SettingsCache, SettingsManager};
pub use storage::{SqliteSettingsStore, SqliteStoreConfig};

use std::path::{Path, PathBuf};

/// File suffix used for settings databases.
pub const SETTINGS_EXTENSION: &str = ".sqlite3";

/// Default database path for a settings file named `stem` inside `dir`.
///
/// # Example
///
/// ```
/// let path = nsettings::default_database_path("/var/lib/bot", "settings");
/// assert!(path.ends_with("settings.sqlite3"));
/// ```
pub fn default_database_path(dir: impl AsRef<Path>, stem: &str) -> PathBuf {
    dir.as_ref().join(format!("{stem}{SETTINGS_EXTENSION}"))
}
