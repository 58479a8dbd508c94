//! Backend transport: URL validation, metadata retrieval and progress subscriptions.
//!
//! The [`Transport`] trait is the seam between the orchestrator and the network.
//! [`HttpTransport`] talks to the real backend; tests plug in their own implementation.
//!
//! A progress subscription is split in two halves:
//! - a [`StreamHandle`], owned by the orchestrator, used to close the subscription
//! - a receiver of raw [`Frame`]s, consumed by the [`ProgressReader`](crate::progress::ProgressReader)

mod http;
pub mod sse;

pub use http::HttpTransport;

use crate::error::Result;
use crate::request::DownloadRequest;
use crate::types::{ValidationResponse, VideoMetadata};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Network operations the orchestrator needs from the backend
///
/// Implementations own no session state. Each call opens exactly one underlying
/// network resource; request/response resources are released when the call returns.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Ask the backend whether it can handle `url`
    ///
    /// An error means "cannot validate", never "invalid".
    async fn validate(&self, url: &str) -> Result<ValidationResponse>;

    /// Fetch metadata for `url`
    ///
    /// Fails with `Error::NotFound` when the backend reports no resolvable video and
    /// with `Error::Transport` for network or status failures.
    async fn fetch_metadata(&self, url: &str) -> Result<VideoMetadata>;

    /// Open a progress subscription for `request` without waiting for the connection
    ///
    /// Data arrives asynchronously on the returned frame receiver. The subscription
    /// stays open until its handle is closed or the server ends the stream.
    /// [`HttpTransport`](crate::transport::HttpTransport) spawns the connection, so it
    /// must be called inside a tokio runtime.
    fn open_progress_stream(&self, request: &DownloadRequest) -> Result<ProgressSubscription>;
}

static NEXT_STREAM_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a progress subscription
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId(u64);

impl StreamId {
    /// Get the inner value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for StreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client-side handle of one progress subscription
///
/// `close()` is idempotent and safe after the server already ended the stream.
/// Dropping the handle closes the subscription too, so a subscription can never
/// outlive the state that owns its handle.
#[derive(Debug)]
pub struct StreamHandle {
    id: StreamId,
    token: CancellationToken,
}

impl StreamHandle {
    /// Create a handle with a fresh id
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            id: StreamId(NEXT_STREAM_ID.fetch_add(1, Ordering::Relaxed)),
            token: CancellationToken::new(),
        }
    }

    /// Identifier of this subscription
    pub fn id(&self) -> StreamId {
        self.id
    }

    /// Close the subscription
    pub fn close(&self) {
        if !self.token.is_cancelled() {
            tracing::debug!(stream_id = %self.id, "closing progress stream");
            self.token.cancel();
        }
    }

    /// Whether `close()` has been requested
    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Token cancelled when the handle is closed
    ///
    /// Transport implementations select on it to tear the connection down; the
    /// progress reader checks it before delivering anything.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Raw unit delivered by a progress subscription, before decoding
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Frame {
    /// Payload of one server-pushed message
    Data(String),
    /// The server ended the stream
    Closed,
    /// The underlying transport failed
    Failed(String),
}

/// An open progress subscription
#[derive(Debug)]
pub struct ProgressSubscription {
    /// Handle used to close the subscription
    pub handle: StreamHandle,
    /// Frames pushed by the connection task
    pub frames: mpsc::Receiver<Frame>,
}
