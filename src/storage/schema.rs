//! Settings table schema and the SQL the store runs against it.
//!
//! The key column keeps its historical name, `subreddit`, so databases
//! written by earlier deployments open unchanged. Code refers to it as the
//! namespace everywhere else.

use rusqlite::Connection;

/// Table creation. Never alters or drops existing data.
pub const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS settings (
    subreddit VARCHAR(20) PRIMARY KEY,
    settings TEXT
)
"#;

/// Insert-or-replace by primary key. Positional, so it does not depend on
/// column names.
pub const UPSERT_SQL: &str = "INSERT OR REPLACE INTO settings VALUES (?1, ?2)";

/// Every stored row. The cast keeps numeric-looking keys as text.
pub const SELECT_ALL_SQL: &str =
    "SELECT CAST(subreddit AS TEXT) AS namespace, settings FROM settings";

/// One persisted `(namespace, blob)` pair. The blob may be NULL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRow {
    pub namespace: String,
    pub blob: Option<String>,
}

/// Apply connection pragmas.
///
/// WAL is only requested for file databases; in-memory databases report
/// `memory` and ignore it.
pub fn apply_pragmas(conn: &Connection, busy_timeout_ms: u64) -> rusqlite::Result<()> {
    conn.busy_timeout(std::time::Duration::from_millis(busy_timeout_ms))?;
    let _mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.execute_batch("PRAGMA synchronous = FULL;")?;
    Ok(())
}

/// Ensure the settings table exists.
pub fn create_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(CREATE_TABLE_SQL)
}

/// Fetch every stored row.
pub fn load_rows(conn: &Connection) -> rusqlite::Result<Vec<StoredRow>> {
    let mut stmt = conn.prepare(SELECT_ALL_SQL)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(StoredRow {
                namespace: row.get(0)?,
                blob: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
