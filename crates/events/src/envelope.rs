use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::Event;

/// Envelope for an event, carrying stream metadata.
///
/// Notes:
/// - `stream` names the kind of record the event belongs to ("component",
///   "borrow"); `stream_id` is that record's id.
/// - `sequence_number` is monotonically increasing per publisher, so
///   subscribers can detect gaps and replays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    event_type: String,
    stream: String,
    stream_id: Uuid,
    sequence_number: u64,
    occurred_at: DateTime<Utc>,
    payload: E,
}

impl<E: Event> EventEnvelope<E> {
    /// Wrap an event, copying its type and business time into the envelope.
    pub fn wrap(stream: impl Into<String>, stream_id: Uuid, sequence_number: u64, payload: E) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            event_type: payload.event_type().to_string(),
            stream: stream.into(),
            stream_id,
            sequence_number,
            occurred_at: payload.occurred_at(),
            payload,
        }
    }
}

impl<E> EventEnvelope<E> {
    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn stream(&self) -> &str {
        &self.stream
    }

    pub fn stream_id(&self) -> Uuid {
        self.stream_id
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct Restocked {
        at: DateTime<Utc>,
    }

    impl Event for Restocked {
        fn event_type(&self) -> &'static str {
            "test.restocked"
        }

        fn version(&self) -> u32 {
            1
        }

        fn occurred_at(&self) -> DateTime<Utc> {
            self.at
        }
    }

    #[test]
    fn wrap_copies_event_metadata() {
        let at = Utc::now();
        let stream_id = Uuid::now_v7();
        let env = EventEnvelope::wrap("component", stream_id, 7, Restocked { at });

        assert_eq!(env.event_type(), "test.restocked");
        assert_eq!(env.stream(), "component");
        assert_eq!(env.stream_id(), stream_id);
        assert_eq!(env.sequence_number(), 7);
        assert_eq!(env.occurred_at(), at);
    }

    #[test]
    fn envelope_serializes_with_payload() {
        let env = EventEnvelope::wrap("component", Uuid::now_v7(), 1, Restocked { at: Utc::now() });
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["event_type"], "test.restocked");
        assert!(json["payload"]["at"].is_string());
    }
}
