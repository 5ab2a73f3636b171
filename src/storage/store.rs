//! SQLite-backed settings manager.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::schema::StoredRow;
use super::writer::{Writer, WriterConfig, WriterHandle};
use crate::error::StoreError;
use crate::manager::{validate_namespace, PendingWrite, Settings, SettingsCache, SettingsManager};
use crate::observability::{Diagnostic, SharedSink, TracingSink};
use crate::SETTINGS_EXTENSION;

/// Default capacity of the write command channel.
pub const DEFAULT_WRITE_CHANNEL_SIZE: usize = 256;
/// Default SQLite busy timeout (ms).
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Configuration for [`SqliteSettingsStore`].
#[derive(Debug, Clone)]
pub struct SqliteStoreConfig {
    /// Path to the SQLite database file.
    pub path: PathBuf,
    /// Capacity of the write command channel.
    pub write_channel_size: usize,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u64,
}

impl SqliteStoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_channel_size: DEFAULT_WRITE_CHANNEL_SIZE,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }

    fn writer_config(&self) -> WriterConfig {
        WriterConfig {
            path: self.path.clone(),
            channel_size: self.write_channel_size,
            busy_timeout_ms: self.busy_timeout_ms,
        }
    }
}

/// Settings manager that persists each namespace as one SQLite row.
///
/// Construction only records configuration. [`init`](SettingsManager::init)
/// opens the database, ensures the table, prepares the upsert statement and
/// hydrates the cache; until it succeeds, [`update`](SettingsManager::update)
/// fails with [`StoreError::Uninitialized`].
///
/// Writes issued for the same namespace without awaiting the previous one
/// land in the order they reach the writer queue.
pub struct SqliteSettingsStore {
    config: SqliteStoreConfig,
    cache: SettingsCache,
    sink: SharedSink,
    writer: Mutex<Option<Writer>>,
}

impl SqliteSettingsStore {
    /// File suffix for settings databases.
    pub const EXTENSION: &'static str = SETTINGS_EXTENSION;

    /// Create an uninitialized store for the database at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_config(SqliteStoreConfig::new(path))
    }

    pub fn with_config(config: SqliteStoreConfig) -> Self {
        Self {
            config,
            cache: SettingsCache::new(),
            sink: Arc::new(TracingSink),
            writer: Mutex::new(None),
        }
    }

    /// Replace the diagnostic sink.
    #[must_use]
    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Finish queued writes and close the database.
    ///
    /// The store returns to the uninitialized state; the cache is kept.
    pub async fn shutdown(&self) -> Result<(), StoreError> {
        let writer = self.lock_writer().take();
        match writer {
            Some(writer) => writer.stop().await,
            None => Ok(()),
        }
    }

    fn lock_writer(&self) -> MutexGuard<'_, Option<Writer>> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn writer_handle(&self) -> Option<WriterHandle> {
        self.lock_writer().as_ref().map(Writer::handle)
    }
}

/// Decode stored rows into the cache.
///
/// Rows whose blob is NULL, not JSON, or not a JSON object are skipped with a
/// [`Diagnostic::RowDecodeFailed`]. Returns the number of cached namespaces.
pub fn hydrate(cache: &SettingsCache, rows: Vec<StoredRow>, sink: &SharedSink) -> usize {
    let mut cached = 0;
    for StoredRow { namespace, blob } in rows {
        let decoded = match blob {
            Some(blob) => serde_json::from_str::<Settings>(&blob).map_err(|e| e.to_string()),
            None => Err("settings blob is NULL".to_owned()),
        };

        match decoded {
            Ok(settings) => {
                cache.insert(namespace.clone(), settings);
                sink.emit(Diagnostic::Cached { namespace });
                cached += 1;
            }
            Err(error) => sink.emit(Diagnostic::RowDecodeFailed { namespace, error }),
        }
    }
    cached
}

#[async_trait]
impl SettingsManager for SqliteSettingsStore {
    fn settings(&self) -> &SettingsCache {
        &self.cache
    }

    async fn init(&self) -> Result<(), StoreError> {
        let (writer, rows) = Writer::start(&self.config.writer_config(), Arc::clone(&self.sink)).await?;
        let cached = hydrate(&self.cache, rows, &self.sink);

        let previous = self.lock_writer().replace(writer);
        if previous.is_some() {
            // Dropping the old writer closes its queue once in-flight writes finish.
            tracing::debug!(path = %self.config.path.display(), "Replaced existing settings writer");
        }

        tracing::info!(
            path = %self.config.path.display(),
            namespaces = cached,
            "Settings store ready"
        );
        Ok(())
    }

    /// Whether `init` has completed and writes are accepted.
    fn is_ready(&self) -> bool {
        self.lock_writer().is_some()
    }

    fn update(&self, namespace: &str) -> Result<PendingWrite, StoreError> {
        let handle = self.writer_handle().ok_or(StoreError::Uninitialized)?;
        validate_namespace(namespace)?;
        let blob = self.cache.encode(namespace)?;

        self.sink.emit(Diagnostic::Updating {
            namespace: namespace.to_owned(),
        });
        Ok(handle.submit(namespace.to_owned(), blob))
    }
}
