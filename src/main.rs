//! nsettings: inspect and edit a namespaced settings database.
//!
//! # Usage
//!
//! ```bash
//! nsettings --database ./settings.sqlite3 set alpha theme '"dark"'
//! nsettings --database ./settings.sqlite3 get alpha
//! ```
//!
//! Environment variables can also be used:
//! - `NSETTINGS_DATABASE`: Path to the settings database
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)

use anyhow::{Context, Result};
use nsettings::config::{Command, Config};
use nsettings::observability::tracing::init_tracing;
use nsettings::{SettingsManager, SqliteSettingsStore};
use serde::Serialize;
use serde_json::Value;

/// Row printed by `list`.
#[derive(Serialize)]
struct NamespaceSummary {
    namespace: String,
    keys: usize,
}

/// Interpret a command-line value as JSON, falling back to a plain string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

async fn run(store: &SqliteSettingsStore, command: Command) -> Result<()> {
    match command {
        Command::List => {
            let cache = store.settings();
            let summaries: Vec<NamespaceSummary> = cache
                .namespaces()
                .into_iter()
                .map(|namespace| {
                    let keys = cache.get(&namespace).map_or(0, |s| s.len());
                    NamespaceSummary { namespace, keys }
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
        Command::Get { namespace, key } => {
            let value = match key {
                Some(key) => store.get(&namespace, &key),
                None => store.settings().get(&namespace).map(Value::Object),
            };
            let value = value.with_context(|| format!("nothing stored for {namespace}"))?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Command::Set {
            namespace,
            key,
            value,
        } => {
            store
                .set(&namespace, &key, parse_value(&value))
                .await
                .with_context(|| format!("failed to set {namespace}.{key}"))?;
        }
        Command::Unset { namespace, key } => {
            let removed = store
                .unset(&namespace, &key)
                .await
                .with_context(|| format!("failed to unset {namespace}.{key}"))?;
            if removed.is_none() {
                tracing::warn!(namespace = %namespace, key = %key, "Key was not set");
            }
        }
        Command::Clear { namespace } => {
            store
                .clear(&namespace)
                .await
                .with_context(|| format!("failed to clear {namespace}"))?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse_args();

    init_tracing(&config.log_level, config.log_json)?;

    let store = SqliteSettingsStore::with_config(config.store_config());
    store.init().await.with_context(|| {
        format!("failed to open settings database {}", config.database.display())
    })?;

    let result = run(&store, config.command).await;

    store.shutdown().await?;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("\"dark\""), json!("dark"));
        assert_eq!(parse_value("dark"), json!("dark"));
        assert_eq!(parse_value("3"), json!(3));
        assert_eq!(parse_value(r#"{"a":true}"#), json!({"a": true}));
    }
}
