//! Session-scoped publishing helper.

use std::sync::{Mutex, PoisonError};

use tracing::warn;
use uuid::Uuid;

use shelfscan_core::SessionId;

use crate::{Event, EventBus, EventEnvelope};

/// Wraps payloads into envelopes (fresh event id, next sequence number) and
/// publishes them on a bus.
///
/// Publishing is best-effort: a bus failure is logged and swallowed so that the
/// scan workflow never fails because an observer could not be reached.
///
/// Numbering and delivery happen under one lock, so subscribers always see
/// sequence numbers in increasing order even with concurrent publishers.
#[derive(Debug)]
pub struct EventPublisher<B> {
    session_id: SessionId,
    sequence: Mutex<u64>,
    bus: B,
}

impl<B> EventPublisher<B> {
    pub fn new(session_id: SessionId, bus: B) -> Self {
        Self {
            session_id,
            sequence: Mutex::new(0),
            bus,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Sequence number of the last envelope handed to the bus (0 if none).
    pub fn last_sequence_number(&self) -> u64 {
        *self.sequence.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish one event; returns the envelope's sequence number.
    pub fn publish<E>(&self, payload: E) -> u64
    where
        E: Event,
        B: EventBus<EventEnvelope<E>>,
    {
        let event_type = payload.event_type();
        let mut sequence = self.sequence.lock().unwrap_or_else(PoisonError::into_inner);
        *sequence += 1;
        let seq = *sequence;
        let envelope = EventEnvelope::new(Uuid::now_v7(), self.session_id, seq, payload);

        if let Err(err) = self.bus.publish(envelope) {
            warn!(
                session_id = %self.session_id,
                event_type,
                sequence_number = seq,
                error = ?err,
                "failed to publish event"
            );
        }
        seq
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use super::*;
    use crate::{CatalogLoaded, InMemoryEventBus, NoMatch, ScanEvent};

    #[test]
    fn envelopes_are_numbered_from_one() {
        let bus = Arc::new(InMemoryEventBus::<EventEnvelope<ScanEvent>>::new());
        let sub = bus.subscribe();
        let session_id = SessionId::new();
        let publisher = EventPublisher::new(session_id, bus.clone());

        for item_count in [1, 2, 3] {
            publisher.publish(ScanEvent::CatalogLoaded(CatalogLoaded {
                item_count,
                occurred_at: Utc::now(),
            }));
        }

        let received = sub.drain();
        let seqs: Vec<u64> = received.iter().map(|e| e.sequence_number()).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
        assert!(received.iter().all(|e| e.session_id() == session_id));
        assert_eq!(publisher.last_sequence_number(), 3);
    }

    #[test]
    fn concurrent_publishers_deliver_in_sequence_order() {
        for _ in 0..50 {
            let bus = Arc::new(InMemoryEventBus::<EventEnvelope<ScanEvent>>::new());
            let sub = bus.subscribe();
            let publisher = Arc::new(EventPublisher::new(SessionId::new(), bus.clone()));

            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let publisher = publisher.clone();
                    std::thread::spawn(move || {
                        for i in 0..250 {
                            publisher.publish(ScanEvent::NoMatch(NoMatch {
                                symbol: format!("{t}-{i}"),
                                occurred_at: Utc::now(),
                            }));
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            let seqs: Vec<u64> = sub.drain().iter().map(|e| e.sequence_number()).collect();
            assert_eq!(seqs, (1..=1000).collect::<Vec<u64>>());
        }
    }
}
