//! Download orchestration state machine split into focused submodules.
//!
//! The `Orchestrator` struct and its methods are organized by concern:
//! - [`state`] - The [`SessionState`] variants and their accessors
//! - [`commands`] - User commands (submit, format change, start, reset)
//! - [`transitions`] - Applying asynchronous results to the session
//!
//! The orchestrator has a single owner and is driven through `&mut self`. Network
//! work runs in spawned tasks that report back as [`Message`]s on an internal
//! channel; [`Orchestrator::process_next`] applies them one at a time, so no lock
//! ever guards the session state.

mod commands;
mod state;
mod transitions;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use state::SessionState;

use crate::config::Config;
use crate::error::{Error, Result, ToNotification};
use crate::progress::StreamSignal;
use crate::request::DownloadDraft;
use crate::transport::{HttpTransport, StreamId, Transport};
use crate::types::{Event, Notification, SessionTag, ValidationResponse, VideoMetadata};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

/// Asynchronous result delivered back to the orchestrator
#[derive(Debug)]
pub enum Message {
    /// A validation call finished
    Validated {
        /// Generation the call was issued under
        generation: u64,
        /// URL that was validated
        url: String,
        /// Backend answer or transport failure
        outcome: Result<ValidationResponse>,
    },

    /// A metadata call finished
    MetadataFetched {
        /// Generation the call was issued under
        generation: u64,
        /// URL the metadata was requested for
        url: String,
        /// Metadata or failure
        outcome: Result<VideoMetadata>,
    },

    /// The progress reader produced a signal
    Stream {
        /// Subscription the signal belongs to
        stream_id: StreamId,
        /// Decoded event or breakage
        signal: StreamSignal,
    },
}

/// Drives one download session at a time
pub struct Orchestrator {
    /// Backend client (trait object so tests can substitute their own)
    pub(crate) transport: Arc<dyn Transport>,
    /// Configuration (shared with spawned tasks)
    pub(crate) config: Arc<Config>,
    /// Current session state
    pub(crate) state: SessionState,
    /// Format choices edited while metadata is shown
    pub(crate) draft: DownloadDraft,
    /// Bumped on every submit and reset; results from older generations are dropped
    pub(crate) generation: u64,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Sender cloned into spawned tasks
    pub(crate) message_tx: mpsc::UnboundedSender<Message>,
    /// Receiver drained by `process_next`
    message_rx: mpsc::UnboundedReceiver<Message>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("state", &self.state)
            .field("draft", &self.draft)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Create an orchestrator using `transport` for every backend call
    pub fn new(config: Config, transport: Arc<dyn Transport>) -> Self {
        // Progress events can arrive quickly; lagging subscribers only miss old ones
        let (event_tx, _rx) = broadcast::channel(1000);
        let (message_tx, message_rx) = mpsc::unbounded_channel();
        let draft = config.defaults.draft();

        Self {
            transport,
            config: Arc::new(config),
            state: SessionState::Idle,
            draft,
            generation: 0,
            event_tx,
            message_tx,
            message_rx,
        }
    }

    /// Create an orchestrator talking to the configured backend over HTTP
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration is invalid.
    pub fn with_http(config: Config) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        tracing::info!(base_url = %transport.base_url(), "orchestrator using HTTP backend");
        Ok(Self::new(config, Arc::new(transport)))
    }

    /// Subscribe to notifications, state changes and progress events
    ///
    /// Multiple subscribers are supported; each receives every event sent after it
    /// subscribed.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Current session state
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Tag of the current session state
    pub fn tag(&self) -> SessionTag {
        self.state.tag()
    }

    /// Current format choices
    pub fn draft(&self) -> &DownloadDraft {
        &self.draft
    }

    /// Current generation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Configuration this orchestrator was built with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether a URL is being validated or resolved
    pub fn is_submitting(&self) -> bool {
        matches!(self.state, SessionState::Validating { .. })
    }

    /// Whether a result is still expected for the current session
    pub fn is_busy(&self) -> bool {
        matches!(
            self.state,
            SessionState::Validating { .. } | SessionState::Downloading { .. }
        )
    }

    /// Wait for the next asynchronous result and apply it
    pub async fn process_next(&mut self) {
        // We hold a sender ourselves, so the channel never reports closed
        if let Some(message) = self.message_rx.recv().await {
            self.apply(message);
        }
    }

    /// Apply every result that has already arrived, without waiting
    ///
    /// Returns the number of messages applied.
    pub fn process_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(message) = self.message_rx.try_recv() {
            self.apply(message);
            applied += 1;
        }
        applied
    }

    /// Process results until the session no longer waits on anything
    ///
    /// Returns the tag of the settled state (`Idle`, `MetadataReady` or `Terminal`).
    pub async fn run_until_settled(&mut self) -> SessionTag {
        while self.is_busy() {
            self.process_next().await;
        }
        self.tag()
    }

    /// Install `next`, closing any subscription owned by the state it replaces
    pub(crate) fn transition(&mut self, next: SessionState) {
        self.transition_with(|_| next);
    }

    /// Build the next state from the current one
    ///
    /// The current state's subscription is closed before `build` runs.
    pub(crate) fn transition_with<F>(&mut self, build: F)
    where
        F: FnOnce(SessionState) -> SessionState,
    {
        let from = self.state.tag();
        let previous = std::mem::take(&mut self.state);
        previous.close_stream();
        self.state = build(previous);
        let to = self.state.tag();

        if from != to {
            tracing::debug!(from = %from, to = %to, generation = self.generation, "session state changed");
            self.event_tx.send(Event::StateChanged { from, to }).ok();
        }
    }

    /// Emit a notification to every subscriber
    pub(crate) fn notify(&self, notification: Notification) {
        tracing::info!(
            title = %notification.title,
            message = %notification.message,
            severity = ?notification.severity,
            "notification"
        );
        self.event_tx.send(Event::Notification(notification)).ok();
    }

    /// Emit the notification describing `error`
    pub(crate) fn notify_error(&self, error: &Error) {
        tracing::warn!(code = error.error_code(), error = %error, "session error");
        self.notify(Notification::from_error(error));
    }
}
