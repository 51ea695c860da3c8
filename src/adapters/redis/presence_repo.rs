use crate::adapters::redis::RedisClient;
use crate::domain::PresenceEvent;
use crate::services::presence::PresenceBus;
use async_trait::async_trait;
use std::sync::Arc;

/// Presence bus over Redis pub/sub. `PUBLISH` reports how many live
/// subscribers saw the event, which is exactly the liveness signal the
/// presence channel needs.
#[derive(Debug, Clone)]
pub struct PresenceBusRepository {
    redis: Arc<RedisClient>,
    channel_prefix: String,
}

impl PresenceBusRepository {
    #[must_use]
    pub const fn new(redis: Arc<RedisClient>, channel_prefix: String) -> Self {
        Self { redis, channel_prefix }
    }
}

#[async_trait]
impl PresenceBus for PresenceBusRepository {
    async fn publish(&self, topic: &str, event: &PresenceEvent) -> anyhow::Result<bool> {
        let channel = format!("{}{topic}", self.channel_prefix);
        let receivers = self.redis.publish(&channel, &event.encode()).await?;
        Ok(receivers > 0)
    }
}
