//! Scan workflow events and the in-process plumbing that distributes them.
//!
//! Every observable state change of a scanning session (scan started, item
//! matched, camera failed, catalog loaded, ...) is a [`ScanEvent`] wrapped in an
//! [`EventEnvelope`] and published on an [`EventBus`]. UI observers subscribe;
//! read models such as the activity log are [`Projection`]s over the stream.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;
pub mod projection;
pub mod publisher;
pub mod runner;
pub mod scan;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use projection::Projection;
pub use publisher::EventPublisher;
pub use runner::{ProjectionCursor, ProjectionError, ProjectionRunner};
pub use scan::{
    CameraUnavailable, CatalogLoaded, CatalogUnavailable, DetectionFailed, DetectionUnsupported,
    ItemMatched, NoMatch, ScanEnvelope, ScanEvent, ScanStarted, ScanStopped, StopReason, SymbolScanned,
};
