use crate::adapters::redis::RedisClient;
use crate::domain::Destination;
use crate::services::presence::MessageQueue;
use async_trait::async_trait;
use std::sync::Arc;

/// Durable per-destination queue over Redis lists. `RPUSH` returns the new
/// list length, which doubles as the queue-depth signal reported to the
/// caller.
#[derive(Debug, Clone)]
pub struct MessageQueueRepository {
    redis: Arc<RedisClient>,
    queue_prefix: String,
}

impl MessageQueueRepository {
    #[must_use]
    pub const fn new(redis: Arc<RedisClient>, queue_prefix: String) -> Self {
        Self { redis, queue_prefix }
    }
}

#[async_trait]
impl MessageQueue for MessageQueueRepository {
    async fn append(&self, destination: &Destination, payload: &[u8]) -> anyhow::Result<i64> {
        let key = format!("{}{}", self.queue_prefix, destination.topic_key());
        self.redis.rpush(&key, payload).await
    }
}
