#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod telemetry;

pub use error::{DeliveryError, Result};

use crate::adapters::database::DeviceRepository;
use crate::adapters::redis::{MessageQueueRepository, PresenceBusRepository, RedisClient};
use crate::config::Config;
use crate::services::dispatcher::ProviderDispatcher;
use crate::services::feedback::FeedbackCollector;
use crate::services::presence::PresenceChannel;
use crate::services::provider::{GcmProvider, PushyProvider};
use crate::services::router::DeliveryRouter;
use std::sync::Arc;

/// Wires the delivery core from configuration: live adapters, one bounded
/// dispatcher per configured provider, and the router on top.
///
/// Providers without an API key in the configuration are simply not wired;
/// destinations carrying only their tokens will fall through to the
/// persistent-pull path or fail as unregistered.
///
/// # Errors
/// Returns an error if the Redis or database connection cannot be
/// established.
pub async fn build_core(config: &Config) -> anyhow::Result<DeliveryRouter> {
    let redis = Arc::new(RedisClient::new(&config.pubsub).await?);
    let pool = adapters::database::init_pool(&config.database).await?;

    let bus = Arc::new(PresenceBusRepository::new(
        Arc::clone(&redis),
        config.pubsub.channel_prefix.clone(),
    ));
    let queue = Arc::new(MessageQueueRepository::new(redis, config.pubsub.queue_prefix.clone()));
    let presence = PresenceChannel::new(bus, queue);

    let directory = Arc::new(DeviceRepository::new(pool));
    let feedback = Arc::new(FeedbackCollector::new());
    let http = reqwest::Client::new();

    let mut router = DeliveryRouter::new(
        presence,
        directory,
        config.push.precedence.clone(),
        Arc::clone(&feedback),
    );

    if let Some(api_key) = &config.push.gcm_api_key {
        let provider = Arc::new(GcmProvider::new(http.clone(), api_key.clone(), Arc::clone(&feedback)));
        router = router.with_gcm(ProviderDispatcher::new(
            provider,
            config.push.worker_count,
            config.push.max_pending_tasks,
        ));
    }

    if let Some(api_key) = &config.push.pushy_api_key {
        let provider = Arc::new(PushyProvider::new(http, &config.push.pushy_host, api_key));
        router = router.with_pushy(ProviderDispatcher::new(
            provider,
            config.push.worker_count,
            config.push.max_pending_tasks,
        ));
    }

    Ok(router)
}
