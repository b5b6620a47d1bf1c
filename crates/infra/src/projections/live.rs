//! A bus that keeps one projection current as envelopes are published.

use std::sync::{Mutex, PoisonError};

use tracing::warn;

use shelfscan_events::{
    Event, EventBus, EventEnvelope, InMemoryBusError, InMemoryEventBus, Projection,
    ProjectionRunner, Subscription,
};

/// In-memory broadcast bus that also applies every published envelope to a
/// projection before fanning it out.
///
/// The projection holds only what it keeps (e.g. the last few log lines); no
/// queue builds up for it when nobody reads it.
#[derive(Debug)]
pub struct LiveProjectionBus<P>
where
    P: Projection,
{
    inner: InMemoryEventBus<EventEnvelope<P::Ev>>,
    runner: Mutex<ProjectionRunner<P>>,
}

impl<P> LiveProjectionBus<P>
where
    P: Projection,
{
    pub fn new(runner: ProjectionRunner<P>) -> Self {
        Self {
            inner: InMemoryEventBus::new(),
            runner: Mutex::new(runner),
        }
    }

    /// Read the projection as of the last published envelope.
    pub fn read<R>(&self, f: impl FnOnce(&P) -> R) -> R {
        f(self
            .runner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .projection())
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscriber_count()
    }
}

impl<P> EventBus<EventEnvelope<P::Ev>> for LiveProjectionBus<P>
where
    P: Projection + Send,
{
    type Error = InMemoryBusError;

    fn publish(&self, message: EventEnvelope<P::Ev>) -> Result<(), Self::Error> {
        {
            let mut runner = self.runner.lock().unwrap_or_else(PoisonError::into_inner);
            if let Err(err) = runner.apply(&message) {
                warn!(
                    event_type = message.payload().event_type(),
                    error = %err,
                    "projection skipped an event"
                );
            }
        }
        self.inner.publish(message)
    }

    fn subscribe(&self) -> Subscription<EventEnvelope<P::Ev>> {
        self.inner.subscribe()
    }
}
