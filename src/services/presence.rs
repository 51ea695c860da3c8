use crate::domain::{ChannelTag, DeliveryStatus, Destination, Message, PresenceEvent};
use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use opentelemetry::{
    KeyValue, global,
    metrics::Counter,
};
use std::sync::Arc;

const PROVISIONING_PREFIX: &str = "provisioning:";

/// Publish side of the presence bus.
#[async_trait]
pub trait PresenceBus: Send + Sync + std::fmt::Debug {
    /// Publishes an event to a topic. Returns true iff at least one live
    /// subscriber existed at publish time.
    ///
    /// # Errors
    /// Returns an error if the bus is unreachable.
    async fn publish(&self, topic: &str, event: &PresenceEvent) -> anyhow::Result<bool>;
}

/// Durable per-destination message queue.
#[async_trait]
pub trait MessageQueue: Send + Sync + std::fmt::Debug {
    /// Appends a message to the destination's queue and returns the new
    /// queue length.
    ///
    /// # Errors
    /// Returns an error if the store is unreachable.
    async fn append(&self, destination: &Destination, payload: &[u8]) -> anyhow::Result<i64>;
}

#[derive(Clone, Debug)]
struct Metrics {
    delivery_attempts: Counter<u64>,
    provisioning_attempts: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("umbra-push");
        Self {
            delivery_attempts: meter
                .u64_counter("umbra_presence_delivery_attempts_total")
                .with_description("Presence-channel delivery attempts by channel tag and outcome")
                .build(),
            provisioning_attempts: meter
                .u64_counter("umbra_presence_provisioning_attempts_total")
                .with_description("Provisioning message attempts by outcome")
                .build(),
        }
    }
}

/// Synchronous delivery to live connections, with the durable queue as the
/// fallback for offline devices.
#[derive(Clone, Debug)]
pub struct PresenceChannel {
    bus: Arc<dyn PresenceBus>,
    queue: Arc<dyn MessageQueue>,
    metrics: Metrics,
}

impl PresenceChannel {
    #[must_use]
    pub fn new(bus: Arc<dyn PresenceBus>, queue: Arc<dyn MessageQueue>) -> Self {
        Self { bus, queue, metrics: Metrics::new() }
    }

    /// Attempts delivery over a live connection. On a miss the message is
    /// persisted to the destination's durable queue and a best-effort
    /// recheck nudge is published; the queue write, not the nudge, is what
    /// guarantees eventual delivery.
    ///
    /// # Errors
    /// Returns `DeliveryError::Internal` if the durable append fails.
    #[tracing::instrument(
        skip(self, message),
        fields(destination = %destination, channel = channel.as_str())
    )]
    pub async fn send_message(
        &self,
        destination: &Destination,
        message: &Message,
        channel: ChannelTag,
    ) -> Result<DeliveryStatus> {
        let topic = destination.topic_key();
        let deliver = PresenceEvent::Deliver(message.payload.clone());

        let online = match self.bus.publish(&topic, &deliver).await {
            Ok(online) => online,
            Err(e) => {
                // A failed publish is indistinguishable from an offline
                // device; the durable write below keeps the message safe.
                tracing::warn!(error = %e, "Presence publish failed, treating device as offline");
                false
            }
        };

        if online {
            self.metrics.delivery_attempts.add(
                1,
                &[KeyValue::new("channel", channel.as_str()), KeyValue::new("status", "online")],
            );
            tracing::trace!("Delivered over live connection");
            return Ok(DeliveryStatus { delivered: true, queue_depth: 0 });
        }

        let queue_depth = self.queue.append(destination, &message.payload).await?;

        // Best-effort nudge for a connection that raced the publish above.
        // Fire-and-forget: the outcome is ignored and never retried.
        if let Err(e) = self.bus.publish(&topic, &PresenceEvent::Recheck).await {
            tracing::debug!(error = %e, "Recheck publish failed");
        }

        self.metrics.delivery_attempts.add(
            1,
            &[KeyValue::new("channel", channel.as_str()), KeyValue::new("status", "offline")],
        );
        tracing::debug!(queue_depth, "Message queued for offline device");
        Ok(DeliveryStatus { delivered: false, queue_depth })
    }

    /// Publish-only path for ephemeral device-pairing messages: no
    /// persistence fallback, the caller learns whether anyone was
    /// listening.
    ///
    /// # Errors
    /// Returns `DeliveryError::Internal` if the publish itself fails.
    #[tracing::instrument(skip(self, body), fields(address = %address))]
    pub async fn send_provisioning_message(&self, address: &str, body: Bytes) -> Result<bool> {
        let topic = format!("{PROVISIONING_PREFIX}{address}");
        let online = self.bus.publish(&topic, &PresenceEvent::Deliver(body)).await?;

        let status = if online { "online" } else { "offline" };
        self.metrics.provisioning_attempts.add(1, &[KeyValue::new("status", status)]);

        Ok(online)
    }
}
