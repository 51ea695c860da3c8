#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::{Duration, Instant};
use umbra_push::domain::{Destination, DeviceCapability, PresenceEvent, ProviderKind};
use umbra_push::services::presence::{MessageQueue, PresenceBus};
use umbra_push::services::provider::{ProviderJob, PushError, PushProvider};
use umbra_push::services::router::DeviceDirectory;

static INIT: Once = Once::new();

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("umbra_push=debug".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap());

        tracing_subscriber::fmt().with_env_filter(filter).init();
    });
}

/// Polls a condition until it holds or the deadline passes.
pub async fn wait_until(deadline: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// Presence bus fake: topics marked online report a live subscriber, and
/// every publish is logged for inspection.
#[derive(Debug, Default)]
pub struct FakeBus {
    online: Mutex<HashSet<String>>,
    fail_publish: AtomicBool,
    published: Mutex<Vec<(String, PresenceEvent)>>,
}

impl FakeBus {
    pub fn set_online(&self, topic: &str) {
        self.online.lock().unwrap().insert(topic.to_string());
    }

    pub fn fail_publishes(&self) {
        self.fail_publish.store(true, Ordering::SeqCst);
    }

    pub fn published(&self) -> Vec<(String, PresenceEvent)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl PresenceBus for FakeBus {
    async fn publish(&self, topic: &str, event: &PresenceEvent) -> anyhow::Result<bool> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("bus unreachable"));
        }
        self.published.lock().unwrap().push((topic.to_string(), event.clone()));
        Ok(self.online.lock().unwrap().contains(topic))
    }
}

/// Durable queue fake backed by per-destination vectors; append returns
/// the new length, like the real store.
#[derive(Debug, Default)]
pub struct FakeQueue {
    entries: Mutex<HashMap<Destination, Vec<Vec<u8>>>>,
    fail: AtomicBool,
}

impl FakeQueue {
    pub fn seed(&self, destination: Destination, count: usize) {
        let mut entries = self.entries.lock().unwrap();
        entries.entry(destination).or_default().extend(std::iter::repeat_n(vec![0u8], count));
    }

    pub fn fail_appends(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn depth(&self, destination: &Destination) -> usize {
        self.entries.lock().unwrap().get(destination).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().values().all(Vec::is_empty)
    }
}

#[async_trait]
impl MessageQueue for FakeQueue {
    async fn append(&self, destination: &Destination, payload: &[u8]) -> anyhow::Result<i64> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("durable store unreachable"));
        }
        let mut entries = self.entries.lock().unwrap();
        let queue = entries.entry(*destination).or_default();
        queue.push(payload.to_vec());
        Ok(queue.len() as i64)
    }
}

/// Device directory fake with fixed capability records.
#[derive(Debug, Default)]
pub struct FakeDirectory {
    records: Mutex<HashMap<Destination, DeviceCapability>>,
}

impl FakeDirectory {
    pub fn insert(&self, destination: Destination, capability: DeviceCapability) {
        self.records.lock().unwrap().insert(destination, capability);
    }
}

#[async_trait]
impl DeviceDirectory for FakeDirectory {
    async fn capability(&self, destination: &Destination) -> anyhow::Result<Option<DeviceCapability>> {
        Ok(self.records.lock().unwrap().get(destination).cloned())
    }
}

/// Provider whose sends park on a gate until released. Lets tests hold
/// workers mid-send to saturate a dispatcher deterministically.
#[derive(Debug)]
pub struct GateProvider {
    kind: ProviderKind,
    pub started: AtomicUsize,
    pub completed: AtomicUsize,
    gate: tokio::sync::Semaphore,
}

impl GateProvider {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            started: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            gate: tokio::sync::Semaphore::new(0),
        }
    }

    pub fn release(&self, permits: usize) {
        self.gate.add_permits(permits);
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PushProvider for GateProvider {
    type Payload = ProviderJob;

    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn render(&self, job: &ProviderJob) -> ProviderJob {
        job.clone()
    }

    async fn send(&self, _job: ProviderJob) -> Result<(), PushError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| PushError::Transport(anyhow::anyhow!(e)))?;
        permit.forget();
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Provider that always fails; counts how many sends were attempted.
#[derive(Debug, Default)]
pub struct FailingProvider {
    pub attempts: AtomicUsize,
}

impl FailingProvider {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PushProvider for FailingProvider {
    type Payload = ProviderJob;

    fn kind(&self) -> ProviderKind {
        ProviderKind::Pushy
    }

    fn render(&self, job: &ProviderJob) -> ProviderJob {
        job.clone()
    }

    async fn send(&self, _job: ProviderJob) -> Result<(), PushError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(PushError::Transport(anyhow::anyhow!("provider exploded")))
    }
}

/// One request as seen by the mock provider endpoint.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub path_and_query: String,
    pub content_type: Option<String>,
    pub authorization: Option<String>,
    pub body: String,
}

impl CapturedRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("captured body is JSON")
    }
}

/// Scriptable HTTP stand-in for a push provider endpoint: responses are
/// consumed in order, then the fallback repeats.
#[derive(Debug, Clone)]
pub struct MockProvider {
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
    scripted: Arc<Mutex<VecDeque<(u16, String)>>>,
    fallback: (u16, String),
}

impl MockProvider {
    pub fn captured(&self) -> Vec<CapturedRequest> {
        self.captured.lock().unwrap().clone()
    }

    pub fn hits(&self) -> usize {
        self.captured.lock().unwrap().len()
    }
}

async fn mock_handler(
    State(mock): State<MockProvider>,
    uri: Uri,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> (StatusCode, String) {
    let header = |name: &str| {
        headers.get(name).and_then(|v| v.to_str().ok()).map(String::from)
    };
    mock.captured.lock().unwrap().push(CapturedRequest {
        path_and_query: uri.path_and_query().map(ToString::to_string).unwrap_or_default(),
        content_type: header("content-type"),
        authorization: header("authorization"),
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    let (status, body) = mock
        .scripted
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| mock.fallback.clone());
    (StatusCode::from_u16(status).expect("valid status"), body)
}

/// Spawns a mock provider endpoint; returns its base URL and a handle.
pub async fn spawn_mock_provider(
    scripted: Vec<(u16, String)>,
    fallback: (u16, String),
) -> (String, MockProvider) {
    let mock = MockProvider {
        captured: Arc::new(Mutex::new(Vec::new())),
        scripted: Arc::new(Mutex::new(scripted.into())),
        fallback,
    };

    let app = Router::new().fallback(mock_handler).with_state(mock.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), mock)
}

/// Spawns an endpoint that accepts connections but never responds; returns
/// the base URL and a hit counter.
pub async fn spawn_hanging_provider() -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);

    let app = Router::new().fallback(move || {
        let hits = Arc::clone(&counter);
        async move {
            hits.fetch_add(1, Ordering::SeqCst);
            std::future::pending::<()>().await;
            StatusCode::OK
        }
    });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), hits)
}
