use crate::domain::Destination;
use std::hash::{Hash, Hasher};
use time::OffsetDateTime;

/// A provider-reported token supersession: the provider told us that
/// `old_token` has been replaced by `new_token` for this destination.
#[derive(Debug, Clone)]
pub struct UnregisteredEvent {
    pub old_token: String,
    pub new_token: String,
    pub destination: Destination,
    pub observed_at: OffsetDateTime,
}

impl UnregisteredEvent {
    #[must_use]
    pub fn new(
        old_token: impl Into<String>,
        new_token: impl Into<String>,
        destination: Destination,
    ) -> Self {
        Self {
            old_token: old_token.into(),
            new_token: new_token.into(),
            destination,
            observed_at: OffsetDateTime::now_utc(),
        }
    }
}

// Identity excludes the observation time: repeated reports of the same
// supersession within one accumulation window collapse to a single event.
impl PartialEq for UnregisteredEvent {
    fn eq(&self, other: &Self) -> bool {
        self.old_token == other.old_token
            && self.new_token == other.new_token
            && self.destination == other.destination
    }
}

impl Eq for UnregisteredEvent {}

impl Hash for UnregisteredEvent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.old_token.hash(state);
        self.new_token.hash(state);
        self.destination.hash(state);
    }
}
