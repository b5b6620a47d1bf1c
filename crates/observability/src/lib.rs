//! Tracing and logging setup shared by every shelfscan binary and test harness.

/// Initialize process-wide logging with defaults (`RUST_LOG`, else `info`;
/// human-readable output).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(&LogSettings::default());
}

/// Initialize process-wide logging with explicit settings.
pub fn init_with(settings: &LogSettings) {
    tracing::init(settings);
}

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use self::tracing::LogSettings;
