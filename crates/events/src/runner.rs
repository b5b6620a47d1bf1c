//! Projection runner utilities (read model builders).

use thiserror::Error;

use shelfscan_core::SessionId;

use crate::{EventEnvelope, Projection};

/// Tracks projection progress for a single session.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ProjectionCursor {
    session_id: SessionId,
    last_sequence_number: u64,
}

impl ProjectionCursor {
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn last_sequence_number(&self) -> u64 {
        self.last_sequence_number
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectionError {
    #[error("session mismatch (expected {expected}, found {found})")]
    SessionMismatch { expected: SessionId, found: SessionId },

    #[error("non-monotonic sequence number (last={last}, found={found})")]
    NonMonotonicSequence { last: u64, found: u64 },
}

/// Runs envelopes through a projection and tracks progress.
#[derive(Debug)]
pub struct ProjectionRunner<P>
where
    P: Projection,
{
    projection: P,
    cursor: Option<ProjectionCursor>,
}

impl<P> ProjectionRunner<P>
where
    P: Projection,
{
    pub fn new(projection: P) -> Self {
        Self {
            projection,
            cursor: None,
        }
    }

    /// Create a runner pinned to a specific session.
    pub fn new_for_session(session_id: SessionId, projection: P) -> Self {
        Self {
            projection,
            cursor: Some(ProjectionCursor {
                session_id,
                last_sequence_number: 0,
            }),
        }
    }

    pub fn projection(&self) -> &P {
        &self.projection
    }

    pub fn into_projection(self) -> P {
        self.projection
    }

    pub fn cursor(&self) -> Option<ProjectionCursor> {
        self.cursor
    }

    /// Apply a single envelope, enforcing session consistency and monotonic sequencing.
    pub fn apply(&mut self, envelope: &EventEnvelope<P::Ev>) -> Result<(), ProjectionError> {
        let found_session = envelope.session_id();
        let found_seq = envelope.sequence_number();

        match self.cursor {
            None => {
                self.projection.apply(envelope);
                self.cursor = Some(ProjectionCursor {
                    session_id: found_session,
                    last_sequence_number: found_seq,
                });
                Ok(())
            }
            Some(mut c) => {
                if c.session_id != found_session {
                    return Err(ProjectionError::SessionMismatch {
                        expected: c.session_id,
                        found: found_session,
                    });
                }
                if found_seq <= c.last_sequence_number {
                    return Err(ProjectionError::NonMonotonicSequence {
                        last: c.last_sequence_number,
                        found: found_seq,
                    });
                }

                self.projection.apply(envelope);
                c.last_sequence_number = found_seq;
                self.cursor = Some(c);
                Ok(())
            }
        }
    }

    /// Apply many envelopes in order.
    pub fn run<'a>(
        &mut self,
        envelopes: impl IntoIterator<Item = &'a EventEnvelope<P::Ev>>,
    ) -> Result<(), ProjectionError>
    where
        P::Ev: 'a,
    {
        for env in envelopes {
            self.apply(env)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::{NoMatch, ScanEvent};

    #[derive(Debug, Default)]
    struct Counter(usize);

    impl Projection for Counter {
        type Ev = ScanEvent;

        fn apply(&mut self, _envelope: &EventEnvelope<ScanEvent>) {
            self.0 += 1;
        }
    }

    fn envelope(session_id: SessionId, seq: u64) -> EventEnvelope<ScanEvent> {
        EventEnvelope::new(
            Uuid::now_v7(),
            session_id,
            seq,
            ScanEvent::NoMatch(NoMatch {
                symbol: "9999999999999".to_string(),
                occurred_at: Utc::now(),
            }),
        )
    }

    #[test]
    fn rejects_replayed_sequence_numbers() {
        let session = SessionId::new();
        let mut runner = ProjectionRunner::new_for_session(session, Counter::default());

        runner.apply(&envelope(session, 1)).unwrap();
        runner.apply(&envelope(session, 2)).unwrap();
        let err = runner.apply(&envelope(session, 2)).unwrap_err();

        assert_eq!(err, ProjectionError::NonMonotonicSequence { last: 2, found: 2 });
        assert_eq!(runner.projection().0, 2);
    }

    #[test]
    fn rejects_other_sessions() {
        let session = SessionId::new();
        let other = SessionId::new();
        let mut runner = ProjectionRunner::new(Counter::default());

        runner.apply(&envelope(session, 1)).unwrap();
        let err = runner.apply(&envelope(other, 2)).unwrap_err();

        assert!(matches!(err, ProjectionError::SessionMismatch { .. }));
        assert_eq!(runner.cursor().unwrap().last_sequence_number(), 1);
    }
}
