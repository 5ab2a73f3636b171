//! Configuration parsing for the nsettings command-line host.
//!
//! Supports:
//! - CLI arguments via clap
//! - Environment variable overrides
//! - Sensible defaults for quick start

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::storage::store::{DEFAULT_BUSY_TIMEOUT_MS, DEFAULT_WRITE_CHANNEL_SIZE};
use crate::storage::SqliteStoreConfig;

/// nsettings: namespaced settings persisted to SQLite.
#[derive(Parser, Debug, Clone)]
#[command(name = "nsettings")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Config {
    /// Path to the settings database
    #[arg(short, long, env = "NSETTINGS_DATABASE", default_value = "settings.sqlite3")]
    pub database: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long, env = "NSETTINGS_LOG_JSON")]
    pub log_json: bool,

    /// Size of the write channel (backpressure control)
    #[arg(long, env = "NSETTINGS_WRITE_CHANNEL_SIZE", default_value_t = DEFAULT_WRITE_CHANNEL_SIZE)]
    pub write_channel_size: usize,

    /// SQLite busy timeout in milliseconds
    #[arg(long, env = "NSETTINGS_BUSY_TIMEOUT_MS", default_value_t = DEFAULT_BUSY_TIMEOUT_MS)]
    pub busy_timeout_ms: u64,

    #[command(subcommand)]
    pub command: Command,
}

/// Operations on the settings database.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List stored namespaces
    List,
    /// Print a namespace, or a single key within it
    Get {
        /// Namespace name
        namespace: String,
        /// Key within the namespace
        key: Option<String>,
    },
    /// Set a key to a JSON value (bare words are stored as strings)
    Set {
        namespace: String,
        key: String,
        value: String,
    },
    /// Remove a key from a namespace
    Unset { namespace: String, key: String },
    /// Reset a namespace to an empty object
    Clear { namespace: String },
}

impl Config {
    /// Parse configuration from CLI arguments and environment.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Store configuration derived from the CLI options.
    pub fn store_config(&self) -> SqliteStoreConfig {
        SqliteStoreConfig {
            path: self.database.clone(),
            write_channel_size: self.write_channel_size,
            busy_timeout_ms: self.busy_timeout_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["nsettings", "list"]).unwrap();
        assert_eq!(config.database, PathBuf::from("settings.sqlite3"));
        assert_eq!(config.write_channel_size, DEFAULT_WRITE_CHANNEL_SIZE);
        assert_eq!(config.command, Command::List);
    }

    #[test]
    fn test_set_command() {
        let config = Config::try_parse_from([
            "nsettings",
            "--database",
            "/tmp/x.sqlite3",
            "set",
            "alpha",
            "theme",
            "\"dark\"",
        ])
        .unwrap();
        assert_eq!(config.store_config().path, PathBuf::from("/tmp/x.sqlite3"));
        assert_eq!(
            config.command,
            Command::Set {
                namespace: "alpha".into(),
                key: "theme".into(),
                value: "\"dark\"".into(),
            }
        );
    }
}
