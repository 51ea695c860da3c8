use crate::domain::{Destination, ProviderKind, UnregisteredEvent, message::payload_key};
use crate::services::feedback::FeedbackCollector;
use crate::services::provider::{ProviderJob, PushError, PushProvider};
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use reqwest::header;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

const GCM_ENDPOINT: &str = "https://android.googleapis.com/gcm/send";

/// Transient transport failures get this many retries before the send is
/// abandoned to the log.
const SEND_RETRIES: usize = 3;

#[derive(Debug, Serialize)]
pub struct GcmRequest {
    pub to: String,
    pub data: HashMap<&'static str, String>,
}

/// Rendered GCM request together with the destination it targets, so a
/// canonical-token response can be attributed after the send.
#[derive(Debug)]
pub struct GcmDispatch {
    request: GcmRequest,
    destination: Destination,
}

#[derive(Debug, Deserialize)]
struct GcmResponse {
    #[serde(default)]
    results: Vec<GcmResult>,
}

#[derive(Debug, Deserialize)]
struct GcmResult {
    #[serde(default)]
    registration_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// SDK-style provider speaking the GCM HTTP protocol. The only provider
/// kind that reports stale registrations, via canonical registration ids
/// in send responses.
pub struct GcmProvider {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    feedback: Arc<FeedbackCollector>,
    retry: ExponentialBuilder,
}

impl GcmProvider {
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        api_key: impl Into<String>,
        feedback: Arc<FeedbackCollector>,
    ) -> Self {
        Self::with_endpoint(http, GCM_ENDPOINT, api_key, feedback)
    }

    /// Builds a provider against a non-default endpoint, e.g. a regional
    /// relay or a local stand-in.
    #[must_use]
    pub fn with_endpoint(
        http: reqwest::Client,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        feedback: Arc<FeedbackCollector>,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            feedback,
            retry: ExponentialBuilder::default().with_max_times(SEND_RETRIES),
        }
    }

    /// Lowers the retry backoff floor, e.g. when the endpoint is a nearby
    /// relay where the default one-second floor is needlessly slow.
    #[must_use]
    pub fn with_min_retry_delay(mut self, delay: std::time::Duration) -> Self {
        self.retry = self.retry.with_min_delay(delay);
        self
    }
}

// The API key stays out of debug output.
impl std::fmt::Debug for GcmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcmProvider").field("endpoint", &self.endpoint).finish_non_exhaustive()
    }
}

fn is_transient(error: &reqwest::Error) -> bool {
    if error.is_timeout() || error.is_connect() {
        return true;
    }
    matches!(error.status(), Some(status) if status.is_server_error())
}

#[async_trait]
impl PushProvider for GcmProvider {
    type Payload = GcmDispatch;

    fn kind(&self) -> ProviderKind {
        ProviderKind::Gcm
    }

    fn render(&self, job: &ProviderJob) -> GcmDispatch {
        let key = payload_key(job.receipt, job.notification);
        let value = String::from_utf8_lossy(&job.payload).into_owned();

        GcmDispatch {
            request: GcmRequest {
                to: job.token.clone(),
                data: HashMap::from([(key, value)]),
            },
            destination: job.destination,
        }
    }

    async fn send(&self, dispatch: GcmDispatch) -> Result<(), PushError> {
        tracing::debug!(destination = %dispatch.destination, "Sending GCM push");

        let response = (|| async {
            self.http
                .post(&self.endpoint)
                .header(header::AUTHORIZATION, format!("key={}", self.api_key))
                .json(&dispatch.request)
                .send()
                .await?
                .error_for_status()
        })
        .retry(&self.retry)
        .when(is_transient)
        .notify(|error, duration| {
            tracing::debug!(?duration, %error, "Retrying GCM send");
        })
        .await
        .map_err(anyhow::Error::from)?;

        let body: GcmResponse = response.json().await.map_err(anyhow::Error::from)?;

        if let Some(result) = body.results.first() {
            if let Some(canonical) = &result.registration_id {
                tracing::info!(destination = %dispatch.destination, "GCM reported a canonical registration id");
                self.feedback.record(UnregisteredEvent::new(
                    dispatch.request.to.clone(),
                    canonical.clone(),
                    dispatch.destination,
                ));
            } else if let Some(error) = &result.error {
                tracing::debug!(destination = %dispatch.destination, error, "GCM rejected the message");
            }
        }

        Ok(())
    }
}
