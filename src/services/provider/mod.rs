use crate::domain::{Destination, ProviderKind};
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub mod gcm;
pub mod pushy;

pub use gcm::GcmProvider;
pub use pushy::PushyProvider;

#[derive(Error, Debug)]
pub enum PushError {
    #[error("external service error: {0}")]
    Transport(#[from] anyhow::Error),
}

/// Unit of work inside a dispatcher's queue: the addressable device, its
/// resolved registration token, and the payload with its classification
/// flags. Owned exclusively by the dispatcher from submission to
/// completion.
#[derive(Debug, Clone)]
pub struct ProviderJob {
    pub destination: Destination,
    pub token: String,
    pub payload: Bytes,
    pub receipt: bool,
    pub notification: bool,
}

/// One external push provider: renders a generic job into its own wire
/// payload and performs the provider call. A closed set of implementations
/// is selected at construction time.
#[async_trait]
pub trait PushProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Provider-specific rendered payload.
    type Payload: Send + std::fmt::Debug + 'static;

    fn kind(&self) -> ProviderKind;

    /// Renders a job into this provider's wire payload.
    fn render(&self, job: &ProviderJob) -> Self::Payload;

    /// Performs the provider call. Best-effort: callers treat a failure as
    /// an event to log, never as a reason to retry the whole delivery.
    ///
    /// # Errors
    /// Returns `PushError::Transport` when the provider cannot be reached
    /// or definitively rejects the request.
    async fn send(&self, payload: Self::Payload) -> Result<(), PushError>;
}
