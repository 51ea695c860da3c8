use crate::domain::{
    ChannelTag, Destination, DeviceCapability, Message, ProviderKind, UnregisteredEvent,
};
use crate::error::{DeliveryError, Result};
use crate::services::dispatcher::ProviderDispatcher;
use crate::services::feedback::FeedbackCollector;
use crate::services::presence::PresenceChannel;
use crate::services::provider::{GcmProvider, PushyProvider};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

/// Read side of the device directory.
#[async_trait]
pub trait DeviceDirectory: Send + Sync + std::fmt::Debug {
    /// Reads the capability record for a destination, if one exists.
    ///
    /// # Errors
    /// Returns an error if the directory is unreachable.
    async fn capability(&self, destination: &Destination) -> anyhow::Result<Option<DeviceCapability>>;
}

/// Top-level delivery entry point: the presence channel is always tried
/// first; on a miss, the first provider in the configured precedence order
/// with a registered token receives a wake-up job.
#[derive(Debug)]
pub struct DeliveryRouter {
    presence: PresenceChannel,
    directory: Arc<dyn DeviceDirectory>,
    precedence: Vec<ProviderKind>,
    gcm: Option<ProviderDispatcher<GcmProvider>>,
    pushy: Option<ProviderDispatcher<PushyProvider>>,
    gcm_feedback: Arc<FeedbackCollector>,
}

impl DeliveryRouter {
    #[must_use]
    pub fn new(
        presence: PresenceChannel,
        directory: Arc<dyn DeviceDirectory>,
        precedence: Vec<ProviderKind>,
        gcm_feedback: Arc<FeedbackCollector>,
    ) -> Self {
        Self { presence, directory, precedence, gcm: None, pushy: None, gcm_feedback }
    }

    #[must_use]
    pub fn with_gcm(mut self, dispatcher: ProviderDispatcher<GcmProvider>) -> Self {
        self.gcm = Some(dispatcher);
        self
    }

    #[must_use]
    pub fn with_pushy(mut self, dispatcher: ProviderDispatcher<PushyProvider>) -> Self {
        self.pushy = Some(dispatcher);
        self
    }

    #[must_use]
    pub const fn presence(&self) -> &PresenceChannel {
        &self.presence
    }

    /// Delivers a message to a destination: live connection when one
    /// exists, otherwise a wake-up push through the selected provider. A
    /// destination that pulls its queue over a persistent connection needs
    /// no push at all; the durable write already happened.
    ///
    /// # Errors
    /// `DeliveryError::NotPushRegistered` when no channel can reach the
    /// destination; `DeliveryError::TransientPushFailure` when the
    /// selected dispatcher is saturated.
    #[tracing::instrument(
        skip(self, message),
        fields(destination = %destination),
        err(level = "debug")
    )]
    pub async fn deliver(&self, destination: &Destination, message: &Message) -> Result<()> {
        let capability = self.directory.capability(destination).await?;
        let Some(capability) = capability else {
            tracing::debug!("Destination has no device record");
            return Err(DeliveryError::NotPushRegistered);
        };

        let selected = self
            .precedence
            .iter()
            .copied()
            .find(|kind| capability.token_for(*kind).is_some());

        let channel = selected.map_or(ChannelTag::Web, ChannelTag::from);
        let status = self.presence.send_message(destination, message, channel).await?;
        if status.delivered {
            return Ok(());
        }

        match selected {
            Some(kind) => {
                // Known Some: `selected` only picks kinds with a token.
                let token = capability.token_for(kind).unwrap_or_default();
                self.submit_wakeup(kind, destination, token)
            }
            None if capability.fetches_messages => {
                tracing::trace!("Device pulls its queue; no push needed");
                Ok(())
            }
            None => Err(DeliveryError::NotPushRegistered),
        }
    }

    /// Drains stale-registration feedback for a provider kind. Only the
    /// SDK-style provider reports supersessions; every other kind yields
    /// an empty batch.
    #[must_use]
    pub fn provider_feedback(&self, kind: ProviderKind) -> Vec<UnregisteredEvent> {
        match kind {
            ProviderKind::Gcm => self.gcm_feedback.drain(),
            ProviderKind::Pushy => Vec::new(),
        }
    }

    /// Lifecycle no-op; dispatcher pools are created eagerly.
    pub fn start(&self) {
        if let Some(dispatcher) = &self.gcm {
            dispatcher.start();
        }
        if let Some(dispatcher) = &self.pushy {
            dispatcher.start();
        }
    }

    /// Hard shutdown of every wired dispatcher. Queued wake-ups are
    /// dropped; the durable queues keep the messages recoverable.
    pub fn stop(&self) {
        if let Some(dispatcher) = &self.gcm {
            dispatcher.stop();
        }
        if let Some(dispatcher) = &self.pushy {
            dispatcher.stop();
        }
    }

    fn submit_wakeup(&self, kind: ProviderKind, destination: &Destination, token: &str) -> Result<()> {
        // The push is a wake-up ping only; the ciphertext never rides the
        // provider, it stays in the durable queue.
        match kind {
            ProviderKind::Gcm => self
                .gcm
                .as_ref()
                .ok_or(DeliveryError::NotPushRegistered)?
                .push(destination, token, Bytes::new(), false, true),
            ProviderKind::Pushy => self
                .pushy
                .as_ref()
                .ok_or(DeliveryError::NotPushRegistered)?
                .push(destination, token, Bytes::new(), false, true),
        }
    }
}
