//! Tracing subscriber setup.
//!
//! Configures structured logging with:
//! - Environment-based filtering (via `RUST_LOG`)
//! - Human-readable or JSON output

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing with the given default filter.
///
/// `RUST_LOG` takes precedence over `default_filter` when set. Returns an
/// error if a global subscriber is already installed.
pub fn init_tracing(
    default_filter: &str,
    json: bool,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info,nsettings=debug"));

    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so command output on stdout stays parseable.
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }

    tracing::debug!(filter = default_filter, "Tracing initialized");
    Ok(())
}

/// Initialize tracing for tests.
///
/// Honors `RUST_LOG`, defaulting to warnings from this crate so skipped
/// settings rows show up in test output. Safe to call repeatedly.
pub fn init_test_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nsettings=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
