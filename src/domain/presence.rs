use bytes::Bytes;

const DELIVER_TAG: u8 = 1;
const RECHECK_TAG: u8 = 2;

/// Event published on a device's presence topic. Encoded as a single tag
/// byte, optionally followed by the message payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceEvent {
    /// Carry a message payload to a live connection.
    Deliver(Bytes),
    /// Ask a live connection to re-read its durable queue.
    Recheck,
}

impl PresenceEvent {
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Deliver(payload) => {
                let mut buf = Vec::with_capacity(1 + payload.len());
                buf.push(DELIVER_TAG);
                buf.extend_from_slice(payload);
                buf
            }
            Self::Recheck => vec![RECHECK_TAG],
        }
    }

    #[must_use]
    pub fn decode(raw: &[u8]) -> Option<Self> {
        match raw.split_first()? {
            (&DELIVER_TAG, payload) => Some(Self::Deliver(Bytes::copy_from_slice(payload))),
            (&RECHECK_TAG, []) => Some(Self::Recheck),
            _ => None,
        }
    }
}

/// Outcome of a presence-channel delivery attempt. `queue_depth` is only
/// meaningful when `delivered` is false: it is the length of the durable
/// queue after the message was persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryStatus {
    pub delivered: bool,
    pub queue_depth: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deliver_round_trips_with_payload() {
        let event = PresenceEvent::Deliver(Bytes::from_static(b"ciphertext"));
        assert_eq!(PresenceEvent::decode(&event.encode()), Some(event));
    }

    #[test]
    fn test_recheck_is_a_bare_tag() {
        assert_eq!(PresenceEvent::Recheck.encode(), vec![RECHECK_TAG]);
        assert_eq!(PresenceEvent::decode(&[RECHECK_TAG]), Some(PresenceEvent::Recheck));
    }

    #[test]
    fn test_rejects_unknown_or_malformed_frames() {
        assert_eq!(PresenceEvent::decode(&[]), None);
        assert_eq!(PresenceEvent::decode(&[9]), None);
        assert_eq!(PresenceEvent::decode(&[RECHECK_TAG, 0]), None);
    }
}
