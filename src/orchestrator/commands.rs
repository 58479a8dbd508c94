//! User commands: submit a URL, edit the format, start the download, reset.

use crate::error::{Error, Result};
use crate::progress::ProgressReader;
use crate::request::FormatChange;
use crate::transport::StreamId;
use crate::types::{Event, ProgressEvent};
use crate::utils::normalize_url;

use super::transitions::LOST_CONNECTION_MESSAGE;
use super::{Message, Orchestrator, SessionState};

impl Orchestrator {
    /// Submit a URL and start resolving it
    ///
    /// Any session in progress is reset first, closing its progress stream. The URL is
    /// checked locally before the backend is contacted; validation and metadata
    /// results arrive asynchronously and are applied by [`process_next`](Self::process_next).
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime, since validation runs on a spawned
    /// task.
    ///
    /// # Errors
    ///
    /// Returns `Error::Input` if the URL is empty, whitespace-only, unparseable or names
    /// a scheme other than http(s). A missing scheme is accepted. The session is left
    /// unchanged and one notification is emitted.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use vidfetch::*;
    /// # async fn example() -> Result<()> {
    /// let mut orchestrator = Orchestrator::with_http(Config::default())?;
    /// orchestrator.submit_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ")?;
    /// let settled = orchestrator.run_until_settled().await;
    /// println!("session settled in {}", settled);
    /// # Ok(())
    /// # }
    /// ```
    pub fn submit_url(&mut self, raw: &str) -> Result<()> {
        let url = match normalize_url(raw) {
            Ok(url) => url,
            Err(e) => {
                self.notify_error(&e);
                return Err(e);
            }
        };

        if self.is_busy() || self.state.metadata().is_some() {
            tracing::debug!(state = %self.tag(), "resetting session for new submission");
        }

        self.generation += 1;
        let generation = self.generation;
        self.transition(SessionState::Validating { url: url.clone() });

        tracing::info!(url = %url, generation, "validating URL");
        self.spawn_validate(generation, url);
        Ok(())
    }

    /// Edit the draft request
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` unless metadata is shown and no download has
    /// started.
    pub fn change_format(&mut self, change: FormatChange) -> Result<()> {
        if !matches!(self.state, SessionState::MetadataReady { .. }) {
            return Err(self.invalid_state("change_format"));
        }

        self.draft.apply(change);
        tracing::debug!(change = ?change, draft = ?self.draft, "format changed");
        Ok(())
    }

    /// Build the request from the current draft and open its progress stream
    ///
    /// The session moves to downloading at 0% immediately; progress arrives
    /// asynchronously. Returns the id of the opened subscription.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime, since the progress reader runs on
    /// a spawned task.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` unless metadata is shown and no download has
    /// started. If the subscription cannot be opened, the session ends as a failed
    /// download (with its notification) and the transport error is returned.
    pub fn start_download(&mut self) -> Result<StreamId> {
        let SessionState::MetadataReady {
            source_url,
            metadata,
        } = &self.state
        else {
            return Err(self.invalid_state("start_download"));
        };
        let metadata = metadata.clone();
        let request = self.draft.build_request(source_url.clone());

        let subscription = match self.transport.open_progress_stream(&request) {
            Ok(subscription) => subscription,
            Err(e) => {
                tracing::warn!(url = %request.source_url, error = %e, "failed to open progress stream");
                let last = ProgressEvent::failed(0.0, LOST_CONNECTION_MESSAGE);
                self.transition(SessionState::Terminal {
                    metadata,
                    request,
                    last: last.clone(),
                });
                self.event_tx.send(Event::Progress(last)).ok();
                self.notify_error(&Error::Stream(LOST_CONNECTION_MESSAGE.to_string()));
                return Err(e);
            }
        };

        let (stream, reader) = ProgressReader::from_subscription(subscription);
        let stream_id = stream.id();
        let reader = reader.with_idle_timeout(self.config.stream.idle_timeout);

        tracing::info!(
            url = %request.source_url,
            kind = request.kind().as_str(),
            stream_id = %stream_id,
            "download started"
        );

        let latest = ProgressEvent::initial();
        self.transition(SessionState::Downloading {
            metadata,
            request,
            latest: latest.clone(),
            stream,
        });
        self.event_tx.send(Event::Progress(latest)).ok();

        let sink = self.message_tx.clone();
        reader.spawn(move |signal| {
            // Receiver gone means the orchestrator was dropped
            sink.send(Message::Stream { stream_id, signal }).ok();
        });

        Ok(stream_id)
    }

    /// Return to idle from any state
    ///
    /// Closes the progress stream if one is open and discards metadata, request and
    /// progress. Results still in flight for the old session are ignored when they
    /// arrive. The format draft is kept.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.transition(SessionState::Idle);
        tracing::info!(generation = self.generation, "session reset");
    }

    fn invalid_state(&self, operation: &str) -> Error {
        let error = Error::InvalidState {
            operation: operation.to_string(),
            state: self.tag().to_string(),
        };
        tracing::debug!(error = %error, "command rejected");
        error
    }
}
