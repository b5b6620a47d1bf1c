use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shelfscan_core::SessionId;

/// Envelope for an event, carrying session + ordering metadata.
///
/// - `session_id` scopes the event to one scanning session (one loaded catalog).
/// - `sequence_number` is strictly increasing per session, starting at 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    session_id: SessionId,

    /// Monotonically increasing position in the session stream.
    sequence_number: u64,

    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(event_id: Uuid, session_id: SessionId, sequence_number: u64, payload: E) -> Self {
        Self {
            event_id,
            session_id,
            sequence_number,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}
