use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeliveryError {
    /// No live connection, no provider token, no persistent-pull flag.
    /// Terminal for this attempt; the caller decides what happens next.
    #[error("no push destination registered for device")]
    NotPushRegistered,
    /// A dispatcher queue was saturated at submission time, or the
    /// dispatcher was already stopped. Safe to retry later.
    #[error("transient push submission failure")]
    TransientPushFailure,
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, DeliveryError>;
