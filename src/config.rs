use crate::domain::ProviderKind;
use clap::{Args, Parser, ValueEnum};

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[command(flatten)]
    pub pubsub: PubSubConfig,

    #[command(flatten)]
    pub database: DatabaseConfig,

    #[command(flatten)]
    pub push: PushConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct PubSubConfig {
    /// Redis connection URL for the presence bus and durable queues
    #[arg(long = "redis-url", env = "UMBRA_REDIS_URL", default_value = "redis://127.0.0.1:6379")]
    pub url: String,

    /// Prefix for per-device presence channels
    #[arg(long, env = "UMBRA_CHANNEL_PREFIX", default_value = "presence:")]
    pub channel_prefix: String,

    /// Prefix for per-device durable message queues
    #[arg(long, env = "UMBRA_QUEUE_PREFIX", default_value = "queue:")]
    pub queue_prefix: String,
}

#[derive(Clone, Debug, Args)]
pub struct DatabaseConfig {
    /// Database connection URL for the device directory
    #[arg(long = "database-url", env = "UMBRA_DATABASE_URL")]
    pub url: String,

    /// Maximum number of database connections
    #[arg(long, env = "UMBRA_DATABASE_MAX_CONNECTIONS", default_value_t = 10)]
    pub max_connections: u32,

    /// How long to wait for a connection from the pool
    #[arg(long, env = "UMBRA_DATABASE_ACQUIRE_TIMEOUT_SECS", default_value_t = 5)]
    pub acquire_timeout_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct PushConfig {
    /// API key for the GCM provider; unset disables GCM dispatch
    #[arg(long, env = "UMBRA_GCM_API_KEY")]
    pub gcm_api_key: Option<String>,

    /// API key for the Pushy provider; unset disables Pushy dispatch
    #[arg(long, env = "UMBRA_PUSHY_API_KEY")]
    pub pushy_api_key: Option<String>,

    /// Host of the Pushy push endpoint
    #[arg(long, env = "UMBRA_PUSHY_HOST", default_value = "pushy.me")]
    pub pushy_host: String,

    /// Worker tasks per provider dispatcher
    #[arg(long, env = "UMBRA_PUSH_WORKER_COUNT", default_value_t = 20)]
    pub worker_count: usize,

    /// Pending jobs a dispatcher will hold before rejecting submissions
    #[arg(long, env = "UMBRA_PUSH_MAX_PENDING_TASKS", default_value_t = 10_000)]
    pub max_pending_tasks: usize,

    /// Comma-separated provider precedence for fallback selection
    #[arg(
        long,
        env = "UMBRA_PUSH_PRECEDENCE",
        default_value = "pushy,gcm",
        value_delimiter = ','
    )]
    pub precedence: Vec<ProviderKind>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// OTLP collector endpoint; unset disables export
    #[arg(long, env = "UMBRA_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    /// Log output format
    #[arg(long, env = "UMBRA_LOG_FORMAT", default_value = "text")]
    pub log_format: LogFormat,
}

impl Config {
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }
}
