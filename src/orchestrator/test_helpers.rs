//! Shared test helpers for driving an Orchestrator against a scripted transport.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::orchestrator::Orchestrator;
use crate::request::DownloadRequest;
use crate::transport::{Frame, ProgressSubscription, StreamHandle, Transport};
use crate::types::{Event, FormatInfo, Notification, ValidationResponse, VideoMetadata};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Notify, broadcast, mpsc};
use tokio_util::sync::CancellationToken;

/// Scripted failure (Error is not Clone, so scripts store a description)
#[derive(Clone, Debug)]
pub(crate) enum Failure {
    Transport(String),
    NotFound(String),
}

impl Failure {
    fn into_error(self, operation: &'static str) -> Error {
        match self {
            Failure::Transport(message) => Error::Transport { operation, message },
            Failure::NotFound(message) => Error::NotFound(message),
        }
    }
}

#[derive(Default)]
struct Script {
    validation: Option<std::result::Result<ValidationResponse, Failure>>,
    metadata: Option<std::result::Result<VideoMetadata, Failure>>,
    validate_gate: Option<Arc<Notify>>,
    metadata_gate: Option<Arc<Notify>>,
}

/// A progress subscription opened through the mock, seen from the server side
#[derive(Clone, Debug)]
pub(crate) struct OpenedStream {
    pub(crate) request: DownloadRequest,
    pub(crate) token: CancellationToken,
    pub(crate) frames: mpsc::Sender<Frame>,
}

impl OpenedStream {
    /// Push one progress event payload
    pub(crate) async fn push(&self, payload: impl Into<String>) {
        // The reader may already have stopped; the frame is then simply lost
        self.frames.send(Frame::Data(payload.into())).await.ok();
    }

    /// Push a raw frame
    pub(crate) async fn push_frame(&self, frame: Frame) {
        self.frames.send(frame).await.ok();
    }

    /// Whether the client closed this subscription
    pub(crate) fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// In-memory Transport with per-URL scripts, call counters and stream spies
///
/// Unscripted URLs validate as valid and resolve to [`sample_metadata`].
#[derive(Default)]
pub(crate) struct MockTransport {
    scripts: Mutex<HashMap<String, Script>>,
    opened: Mutex<Vec<OpenedStream>>,
    fail_open: AtomicBool,
    validate_calls: AtomicUsize,
    metadata_calls: AtomicUsize,
}

impl MockTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn with_script<R>(&self, url: &str, f: impl FnOnce(&mut Script) -> R) -> R {
        let mut scripts = self.scripts.lock().unwrap();
        f(scripts.entry(url.to_string()).or_default())
    }

    pub(crate) fn set_validation(&self, url: &str, valid: bool, message: Option<&str>) {
        self.with_script(url, |s| {
            s.validation = Some(Ok(ValidationResponse {
                valid,
                message: message.map(str::to_string),
            }))
        });
    }

    pub(crate) fn fail_validation(&self, url: &str, failure: Failure) {
        self.with_script(url, |s| s.validation = Some(Err(failure)));
    }

    pub(crate) fn set_metadata(&self, url: &str, metadata: VideoMetadata) {
        self.with_script(url, |s| s.metadata = Some(Ok(metadata)));
    }

    pub(crate) fn fail_metadata(&self, url: &str, failure: Failure) {
        self.with_script(url, |s| s.metadata = Some(Err(failure)));
    }

    /// Hold the validation of `url` until the returned gate is notified
    pub(crate) fn gate_validation(&self, url: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.with_script(url, |s| s.validate_gate = Some(gate.clone()));
        gate
    }

    /// Hold the metadata fetch of `url` until the returned gate is notified
    pub(crate) fn gate_metadata(&self, url: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.with_script(url, |s| s.metadata_gate = Some(gate.clone()));
        gate
    }

    /// Make every subsequent `open_progress_stream` fail
    pub(crate) fn fail_stream_open(&self) {
        self.fail_open.store(true, Ordering::SeqCst);
    }

    pub(crate) fn validate_calls(&self) -> usize {
        self.validate_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    /// Every stream opened so far, in order
    pub(crate) fn opened_streams(&self) -> Vec<OpenedStream> {
        self.opened.lock().unwrap().clone()
    }

    /// The most recently opened stream
    pub(crate) fn last_stream(&self) -> OpenedStream {
        self.opened
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no progress stream was opened")
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn validate(&self, url: &str) -> Result<ValidationResponse> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);

        let (gate, scripted) = self.with_script(url, |s| (s.validate_gate.clone(), s.validation.clone()));
        if let Some(gate) = gate {
            gate.notified().await;
        }

        match scripted {
            Some(Ok(response)) => Ok(response),
            Some(Err(failure)) => Err(failure.into_error("validate")),
            None => Ok(ValidationResponse {
                valid: true,
                message: None,
            }),
        }
    }

    async fn fetch_metadata(&self, url: &str) -> Result<VideoMetadata> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);

        let (gate, scripted) = self.with_script(url, |s| (s.metadata_gate.clone(), s.metadata.clone()));
        if let Some(gate) = gate {
            gate.notified().await;
        }

        match scripted {
            Some(Ok(metadata)) => Ok(metadata),
            Some(Err(failure)) => Err(failure.into_error("fetch_metadata")),
            None => Ok(sample_metadata(&format!("Video at {}", url))),
        }
    }

    fn open_progress_stream(&self, request: &DownloadRequest) -> Result<ProgressSubscription> {
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(Error::Transport {
                operation: "open_progress_stream",
                message: "backend unreachable".to_string(),
            });
        }

        let handle = StreamHandle::new();
        let (tx, rx) = mpsc::channel(64);
        self.opened.lock().unwrap().push(OpenedStream {
            request: request.clone(),
            token: handle.cancellation_token(),
            frames: tx,
        });

        Ok(ProgressSubscription { handle, frames: rx })
    }
}

/// Metadata with the given title and a couple of formats
pub(crate) fn sample_metadata(title: &str) -> VideoMetadata {
    VideoMetadata {
        title: title.to_string(),
        duration: 125,
        thumbnail_url: "https://i.example.com/thumb.jpg".to_string(),
        uploader: "Sample Channel".to_string(),
        available_formats: vec![
            FormatInfo {
                format_id: "22".to_string(),
                extension: "mp4".to_string(),
                resolution: "720p".to_string(),
                file_size_bytes: Some(10 * 1024 * 1024),
            },
            FormatInfo {
                format_id: "140".to_string(),
                extension: "m4a".to_string(),
                resolution: "audio only".to_string(),
                file_size_bytes: None,
            },
        ],
    }
}

/// JSON payload of a progress event
pub(crate) fn progress_json(percentage: f64, status: &str) -> String {
    serde_json::json!({
        "percentage": percentage,
        "speed": "1.5MiB/s",
        "eta": "00:30",
        "status": status,
    })
    .to_string()
}

/// JSON payload of an error event with a message
pub(crate) fn error_json(percentage: f64, message: &str) -> String {
    serde_json::json!({
        "percentage": percentage,
        "speed": "",
        "eta": "",
        "status": "error",
        "message": message,
    })
    .to_string()
}

/// Orchestrator with default config wired to a fresh MockTransport
pub(crate) fn create_test_orchestrator() -> (Orchestrator, Arc<MockTransport>) {
    let transport = MockTransport::new();
    let orchestrator = Orchestrator::new(Config::default(), transport.clone());
    (orchestrator, transport)
}

/// Orchestrator that has already resolved `url` to metadata
pub(crate) async fn ready_orchestrator(url: &str) -> (Orchestrator, Arc<MockTransport>) {
    let (mut orchestrator, transport) = create_test_orchestrator();
    orchestrator.submit_url(url).unwrap();
    settle(&mut orchestrator).await;
    (orchestrator, transport)
}

/// Apply the next message, failing the test if none arrives in time
pub(crate) async fn step(orchestrator: &mut Orchestrator) {
    tokio::time::timeout(Duration::from_secs(5), orchestrator.process_next())
        .await
        .expect("no message arrived within 5 seconds");
}

/// Run until settled, failing the test if that takes too long
pub(crate) async fn settle(orchestrator: &mut Orchestrator) {
    tokio::time::timeout(Duration::from_secs(5), orchestrator.run_until_settled())
        .await
        .expect("orchestrator did not settle within 5 seconds");
}

/// Every event currently buffered for `rx`
pub(crate) fn drain_events(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Notifications among `events`, in order
pub(crate) fn notifications(events: &[Event]) -> Vec<Notification> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Notification(n) => Some(n.clone()),
            _ => None,
        })
        .collect()
}
