//! Error types for settings managers.

use std::path::PathBuf;
use thiserror::Error;

/// Error type for settings manager operations.
///
/// Initialization failures (`Open`, `Schema`, `Prepare`, `Load`) are fatal and
/// leave the store uninitialized. Per-row decode failures during hydration are
/// not represented here; they are reported through the diagnostic sink.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open settings database at {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to ensure settings table: {0}")]
    Schema(#[source] rusqlite::Error),

    #[error("failed to prepare upsert statement: {0}")]
    Prepare(#[source] rusqlite::Error),

    #[error("failed to load stored settings: {0}")]
    Load(#[source] rusqlite::Error),

    #[error("settings store has not been initialized")]
    Uninitialized,

    #[error("invalid namespace {namespace:?}: {reason}")]
    InvalidNamespace {
        namespace: String,
        reason: &'static str,
    },

    #[error("no cached settings for namespace {0:?}")]
    MissingNamespace(String),

    #[error("failed to encode settings for {namespace:?}: {source}")]
    Encode {
        namespace: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write settings for {namespace:?}: {source}")]
    Write {
        namespace: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to spawn writer thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("writer thread is not running")]
    WriterClosed,

    #[error("writer thread panicked")]
    WriterPanic,
}

impl StoreError {
    /// Whether this error happened while bringing the store up.
    pub fn is_initialization_failure(&self) -> bool {
        matches!(
            self,
            Self::Open { .. } | Self::Schema(_) | Self::Prepare(_) | Self::Load(_) | Self::Spawn(_)
        )
    }
}
