//! Observability infrastructure.
//!
//! Provides:
//! - Structured tracing setup for the command-line host
//! - Injectable diagnostic sinks for settings stores

pub mod diagnostics;
pub mod tracing;

pub use diagnostics::{Diagnostic, DiagnosticSink, SharedSink, TracingSink};
