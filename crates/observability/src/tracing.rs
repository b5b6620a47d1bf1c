//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Filter directives used when `RUST_LOG` is not set (e.g. `info`,
    /// `shelfscan_scanner=debug`).
    pub default_filter: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            default_filter: "info".to_string(),
            json: false,
        }
    }
}

impl LogSettings {
    /// `RUST_LOG` wins over the configured default; unparsable directives fall
    /// back to `info`.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.default_filter))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Install the global subscriber.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(settings: &LogSettings) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(settings.env_filter())
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    let _ = if settings.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
