//! Structured logging for stub sessions.
//!
//! The engine emits `tracing` events with `object`, `method` and `patch`
//! fields. Tests can route them to the captured test output with
//! [`init_test_logging`] and filter with `RUST_LOG`, e.g.
//! `RUST_LOG=doublet=trace`.

use tracing_subscriber::EnvFilter;

/// Install a test-friendly subscriber; safe to call from every test
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_test_logging() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("doublet=warn")),
        )
        .with_test_writer()
        .try_init()
        .is_ok()
}

pub(crate) fn log_session_start(object: &str, methods: &[String], scoped: bool) {
    tracing::debug!(object, ?methods, scoped, "stub session started");
}

pub(crate) fn log_session_end(object: &str, restored: usize) {
    tracing::debug!(object, restored, "stub session restored");
}

pub(crate) fn log_argument_mismatch(object: &str, method: &str, difference: &str) {
    tracing::warn!(object, method, difference, "expectation arguments mismatch");
}

pub(crate) fn log_unstub_skipped(object: &str, method: &str) {
    tracing::warn!(object, method, "unstub skipped: method is not stubbed");
}
