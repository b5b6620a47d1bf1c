use chrono::{DateTime, Utc};

/// A published fact about a scanning session.
///
/// Events are:
/// - **immutable** (treat them as facts)
/// - **versioned** (schema evolution)
/// - never persisted; they exist for observers while the session runs
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name/type identifier (e.g. "inventory.item.matched").
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32;

    /// When the event occurred (wall-clock time).
    fn occurred_at(&self) -> DateTime<Utc>;
}
