use bytes::Bytes;

/// An outbound message: opaque payload bytes plus its delivery
/// classification. A receipt outranks a notification when both are set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub payload: Bytes,
    pub receipt: bool,
    pub notification: bool,
}

impl Message {
    #[must_use]
    pub const fn new(payload: Bytes) -> Self {
        Self { payload, receipt: false, notification: false }
    }
}

/// Data-map key under which a rendered push payload travels.
#[must_use]
pub const fn payload_key(receipt: bool, notification: bool) -> &'static str {
    if receipt {
        "receipt"
    } else if notification {
        "notification"
    } else {
        "message"
    }
}
