//! Diagnostic events emitted by settings stores.
//!
//! Stores report lifecycle progress and recoverable failures through an
//! injected [`DiagnosticSink`] instead of a process-wide logger, so tests can
//! capture exactly what a store reported.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// A single event reported by a settings store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The database file was opened (or created).
    Opened { path: PathBuf },
    /// The settings table exists.
    TableEnsured,
    /// The upsert statement is ready for reuse.
    StatementPrepared,
    /// All stored rows were fetched.
    RowsLoaded { count: usize },
    /// One namespace was decoded into the cache.
    Cached { namespace: String },
    /// A stored blob could not be decoded; the namespace was skipped.
    RowDecodeFailed { namespace: String, error: String },
    /// A write was issued for a namespace.
    Updating { namespace: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Opened { path } => write!(f, "opened settings database {}", path.display()),
            Self::TableEnsured => f.write_str("ensured the settings table exists"),
            Self::StatementPrepared => f.write_str("prepared the upsert statement"),
            Self::RowsLoaded { count } => write!(f, "loaded {count} rows of settings"),
            Self::Cached { namespace } => write!(f, "cached settings for {namespace}"),
            Self::RowDecodeFailed { namespace, error } => {
                write!(f, "could not cache settings for {namespace}: {error}")
            }
            Self::Updating { namespace } => write!(f, "updating settings for {namespace}"),
        }
    }
}

/// Receiver for store diagnostics.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);
}

impl<F> DiagnosticSink for F
where
    F: Fn(Diagnostic) + Send + Sync,
{
    fn emit(&self, diagnostic: Diagnostic) {
        self(diagnostic)
    }
}

/// Shared handle to a diagnostic sink.
pub type SharedSink = Arc<dyn DiagnosticSink>;

/// Default sink that forwards diagnostics to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::RowDecodeFailed { namespace, error } => {
                tracing::warn!(namespace = %namespace, error = %error, "Skipping undecodable settings row");
            }
            Diagnostic::Opened { path } => {
                tracing::debug!(path = %path.display(), "Opened settings database");
            }
            Diagnostic::RowsLoaded { count } => {
                tracing::debug!(count, "Loaded settings rows");
            }
            other => tracing::debug!("{other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_closure_sink_receives_events() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&seen);
        let sink: SharedSink = Arc::new(move |d: Diagnostic| captured.lock().unwrap().push(d));

        sink.emit(Diagnostic::TableEnsured);
        sink.emit(Diagnostic::RowsLoaded { count: 3 });

        assert_eq!(
            *seen.lock().unwrap(),
            vec![Diagnostic::TableEnsured, Diagnostic::RowsLoaded { count: 3 }]
        );
    }

    #[test]
    fn test_display() {
        let d = Diagnostic::RowDecodeFailed {
            namespace: "alpha".into(),
            error: "expected value".into(),
        };
        assert_eq!(d.to_string(), "could not cache settings for alpha: expected value");
    }
}
