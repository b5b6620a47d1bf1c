use crate::{Event, EventEnvelope};

/// A projection builds a read model from the session's event stream.
///
/// Read models here are small and disposable (activity log, counters shown next
/// to the lists). They can always be rebuilt by replaying a session's envelopes
/// through a fresh instance.
///
/// `apply` does not return errors: events a projection does not care about are
/// ignored. Ordering and session consistency are enforced by
/// [`ProjectionRunner`](crate::ProjectionRunner).
pub trait Projection {
    type Ev: Event;

    /// Apply a single event to the projection, updating the read model.
    fn apply(&mut self, envelope: &EventEnvelope<Self::Ev>);
}
