use crate::domain::{ProviderKind, message::payload_key};
use crate::services::provider::{ProviderJob, PushError, PushProvider};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;

/// HTTP-style provider posting the fixed Pushy envelope. Single attempt,
/// no stale-token reporting.
pub struct PushyProvider {
    http: reqwest::Client,
    endpoint: String,
}

// The endpoint embeds the API key, so it stays out of debug output.
impl std::fmt::Debug for PushyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushyProvider").finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PushyRequest {
    pub data: HashMap<&'static str, String>,
    pub registration_ids: Vec<String>,
}

impl PushyProvider {
    #[must_use]
    pub fn new(http: reqwest::Client, host: &str, api_key: &str) -> Self {
        Self::with_endpoint(http, format!("https://{host}/push?api_key={api_key}"))
    }

    /// Builds a provider against a fully-formed endpoint URL, e.g. a local
    /// stand-in.
    #[must_use]
    pub fn with_endpoint(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self { http, endpoint: endpoint.into() }
    }
}

#[async_trait]
impl PushProvider for PushyProvider {
    type Payload = PushyRequest;

    fn kind(&self) -> ProviderKind {
        ProviderKind::Pushy
    }

    fn render(&self, job: &ProviderJob) -> PushyRequest {
        let key = payload_key(job.receipt, job.notification);
        let value = String::from_utf8_lossy(&job.payload).into_owned();

        PushyRequest {
            data: HashMap::from([(key, value)]),
            registration_ids: vec![job.token.clone()],
        }
    }

    async fn send(&self, request: PushyRequest) -> Result<(), PushError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(anyhow::Error::from)?;

        if response.status().as_u16() >= 400 {
            tracing::warn!(status = %response.status(), "Bad response from pushy");
        }

        Ok(())
    }
}
