use crate::domain::Destination;
use crate::error::{DeliveryError, Result};
use crate::services::provider::{ProviderJob, PushProvider};
use bytes::Bytes;
use opentelemetry::{
    KeyValue, global,
    metrics::Counter,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::Instrument;

#[derive(Clone, Debug)]
struct Metrics {
    submitted: Counter<u64>,
    rejected: Counter<u64>,
    send_failures: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("umbra-push");
        Self {
            submitted: meter
                .u64_counter("umbra_push_jobs_submitted_total")
                .with_description("Jobs accepted into a provider dispatch queue")
                .build(),
            rejected: meter
                .u64_counter("umbra_push_jobs_rejected_total")
                .with_description("Submissions rejected by a saturated or stopped dispatcher")
                .build(),
            send_failures: meter
                .u64_counter("umbra_push_send_failures_total")
                .with_description("Provider sends that failed after any internal retries")
                .build(),
        }
    }
}

/// Fixed-size worker pool wrapping one push provider. Submission never
/// blocks the caller; once a job is accepted its outcome is not reported
/// back, because the durable queue written on the presence miss is the
/// recovery source of truth.
#[derive(Debug)]
pub struct ProviderDispatcher<P: PushProvider> {
    provider: Arc<P>,
    tx: mpsc::Sender<ProviderJob>,
    workers: std::sync::Mutex<Vec<JoinHandle<()>>>,
    stopped: AtomicBool,
    kind_label: &'static str,
    metrics: Metrics,
}

impl<P: PushProvider> ProviderDispatcher<P> {
    /// Creates the pool eagerly: `worker_count` tasks servicing one queue
    /// holding at most `max_pending` jobs. Both are fixed for the life of
    /// the dispatcher. Must be called from within a Tokio runtime.
    #[must_use]
    pub fn new(provider: Arc<P>, worker_count: usize, max_pending: usize) -> Self {
        let kind_label = provider.kind().as_str();
        let metrics = Metrics::new();
        let (tx, rx) = mpsc::channel(max_pending.max(1));
        let rx = Arc::new(Mutex::new(rx));

        let workers: Vec<JoinHandle<()>> = (0..worker_count.max(1))
            .map(|worker| {
                let provider = Arc::clone(&provider);
                let rx = Arc::clone(&rx);
                let metrics = metrics.clone();
                tokio::spawn(
                    async move {
                        loop {
                            let job = {
                                let mut rx = rx.lock().await;
                                rx.recv().await
                            };
                            let Some(job) = job else { break };

                            let payload = provider.render(&job);
                            if let Err(e) = provider.send(payload).await {
                                metrics.send_failures
                                    .add(1, &[KeyValue::new("provider", kind_label)]);
                                tracing::warn!(
                                    error = %e,
                                    destination = %job.destination,
                                    "Push send failed"
                                );
                            }
                        }
                    }
                    .instrument(tracing::debug_span!("push_worker", provider = kind_label, worker)),
                )
            })
            .collect();

        Self {
            provider,
            tx,
            workers: std::sync::Mutex::new(workers),
            stopped: AtomicBool::new(false),
            kind_label,
            metrics,
        }
    }

    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Submits a wake-up job without blocking.
    ///
    /// # Errors
    /// `DeliveryError::TransientPushFailure` when the pending queue is
    /// full or the dispatcher has been stopped.
    pub fn push(
        &self,
        destination: &Destination,
        token: &str,
        payload: Bytes,
        receipt: bool,
        notification: bool,
    ) -> Result<()> {
        if self.stopped.load(Ordering::Acquire) {
            self.metrics.rejected.add(1, &[KeyValue::new("provider", self.kind_label)]);
            return Err(DeliveryError::TransientPushFailure);
        }

        let job = ProviderJob {
            destination: *destination,
            token: token.to_owned(),
            payload,
            receipt,
            notification,
        };

        match self.tx.try_send(job) {
            Ok(()) => {
                self.metrics.submitted.add(1, &[KeyValue::new("provider", self.kind_label)]);
                Ok(())
            }
            Err(_) => {
                self.metrics.rejected.add(1, &[KeyValue::new("provider", self.kind_label)]);
                Err(DeliveryError::TransientPushFailure)
            }
        }
    }

    /// The pool is created eagerly at construction; present for lifecycle
    /// symmetry with `stop`.
    pub const fn start(&self) {}

    /// Hard shutdown: queued and in-flight jobs are cancelled immediately,
    /// without draining. Later submissions are rejected.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);

        let workers = {
            let mut guard = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *guard)
        };
        for worker in workers {
            worker.abort();
        }
    }
}

impl<P: PushProvider> Drop for ProviderDispatcher<P> {
    fn drop(&mut self) {
        self.stop();
    }
}
