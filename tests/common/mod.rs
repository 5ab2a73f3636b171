//! Test utilities for settings store tests.
//!
//! Provides:
//! - Temporary database fixtures
//! - A diagnostic sink that records what a store reported

#![allow(dead_code)]

use nsettings::observability::tracing::init_test_tracing;
use nsettings::observability::{Diagnostic, DiagnosticSink, SharedSink};
use nsettings::Settings;
use rusqlite::Connection;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Test fixture that manages a temporary database directory.
///
/// The directory is automatically cleaned up when the fixture is dropped.
pub struct TestFixture {
    /// Temporary directory for test database
    pub temp_dir: TempDir,
    /// Path to the database file
    pub db_path: PathBuf,
}

impl TestFixture {
    /// Create a new test fixture with a temporary database directory.
    pub fn new() -> Self {
        init_test_tracing();
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let db_path = temp_dir.path().join("settings.sqlite3");
        Self { temp_dir, db_path }
    }

    /// Open a raw connection to the fixture database.
    pub fn connect(&self) -> Connection {
        Connection::open(&self.db_path).expect("failed to open fixture database")
    }

    /// All `(namespace, settings)` rows, ordered by namespace.
    ///
    /// Reads the key column by its stored name, `subreddit`.
    pub fn rows(&self) -> Vec<(String, Option<String>)> {
        let conn = self.connect();
        let mut stmt = conn
            .prepare("SELECT subreddit, settings FROM settings ORDER BY subreddit")
            .expect("failed to prepare select");
        stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .expect("failed to query rows")
            .collect::<Result<Vec<_>, _>>()
            .expect("failed to read rows")
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Diagnostic sink that keeps every event in memory.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Diagnostic>>,
}

impl RecordingSink {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Diagnostic> {
        self.events.lock().unwrap().clone()
    }

    /// Namespaces reported as undecodable.
    pub fn decode_failures(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|d| match d {
                Diagnostic::RowDecodeFailed { namespace, .. } => Some(namespace),
                _ => None,
            })
            .collect()
    }
}

impl DiagnosticSink for RecordingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        self.events.lock().unwrap().push(diagnostic);
    }
}

/// Upcast a recording sink for `with_sink`.
pub fn as_sink(sink: &Arc<RecordingSink>) -> SharedSink {
    Arc::clone(sink) as SharedSink
}

/// Convert a `json!` object literal into a settings object.
pub fn settings(value: Value) -> Settings {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.temp_dir.path().exists());
        assert!(fixture.db_path.ends_with("settings.sqlite3"));
    }
}
