use crate::domain::UnregisteredEvent;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Accumulates provider-reported token supersessions between drains.
/// Inserts may come from any worker task; a drain swaps the whole
/// accumulator in one exchange, so no event is lost to a concurrent insert
/// and none is handed out twice.
#[derive(Debug, Default)]
pub struct FeedbackCollector {
    events: Mutex<HashSet<UnregisteredEvent>>,
}

impl FeedbackCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one supersession. Duplicate old/new pairs for the same
    /// destination collapse within an accumulation window.
    pub fn record(&self, event: UnregisteredEvent) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).insert(event);
    }

    /// Swaps the accumulator for an empty one and returns everything
    /// collected since the previous drain.
    #[must_use]
    pub fn drain(&self) -> Vec<UnregisteredEvent> {
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *events).into_iter().collect()
    }
}
