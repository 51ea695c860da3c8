use crate::config::PubSubConfig;
use redis::AsyncCommands;

pub mod presence_repo;
pub mod queue_repo;

pub use presence_repo::PresenceBusRepository;
pub use queue_repo::MessageQueueRepository;

/// Thin wrapper over a multiplexed Redis connection, shared by the
/// presence bus and the durable queue repositories.
#[derive(Debug, Clone)]
pub struct RedisClient {
    publisher: redis::aio::ConnectionManager,
}

impl RedisClient {
    /// Connects to Redis with automatic reconnection handling.
    ///
    /// # Errors
    /// Returns an error if the initial connection fails.
    pub async fn new(config: &PubSubConfig) -> anyhow::Result<Self> {
        let client = redis::Client::open(config.url.as_str())?;
        let publisher = client.get_connection_manager().await?;
        Ok(Self { publisher })
    }

    /// Publishes a payload and returns how many subscribers received it.
    ///
    /// # Errors
    /// Returns an error if the Redis operation fails.
    pub async fn publish(&self, channel: &str, payload: &[u8]) -> anyhow::Result<i64> {
        let mut conn = self.publisher.clone();
        let receivers: i64 = conn.publish(channel, payload).await?;
        Ok(receivers)
    }

    /// Appends a payload to a list and returns the list's new length.
    ///
    /// # Errors
    /// Returns an error if the Redis operation fails.
    pub async fn rpush(&self, key: &str, payload: &[u8]) -> anyhow::Result<i64> {
        let mut conn = self.publisher.clone();
        let length: i64 = conn.rpush(key, payload).await?;
        Ok(length)
    }
}
