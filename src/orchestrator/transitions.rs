//! Applying asynchronous results (validation, metadata, progress) to the session.

use crate::error::Error;
use crate::progress::StreamSignal;
use crate::transport::StreamId;
use crate::types::{
    Event, Notification, ProgressEvent, ProgressStatus, ValidationResponse, VideoMetadata,
};

use super::{Message, Orchestrator, SessionState};

/// Shown when the backend rejects a URL without saying why
pub(crate) const INVALID_URL_MESSAGE: &str = "Please enter a valid video URL";
/// Shown when an error event carries no message
pub(crate) const DOWNLOAD_FAILED_MESSAGE: &str = "An error occurred during download";
/// Shown when the progress stream breaks
pub(crate) const LOST_CONNECTION_MESSAGE: &str = "Lost connection to server";

impl Orchestrator {
    /// Apply one asynchronous result
    ///
    /// Results that no longer belong to the current session (older generation,
    /// different stream, or a state that no longer expects them) are dropped.
    pub fn apply(&mut self, message: Message) {
        match message {
            Message::Validated {
                generation,
                url,
                outcome,
            } => {
                if self.is_current(generation, &url) {
                    self.on_validated(generation, url, outcome);
                } else {
                    self.discard_stale("validation", generation, &url);
                }
            }
            Message::MetadataFetched {
                generation,
                url,
                outcome,
            } => {
                if self.is_current(generation, &url) {
                    self.on_metadata(url, outcome);
                } else {
                    self.discard_stale("metadata", generation, &url);
                }
            }
            Message::Stream { stream_id, signal } => self.on_stream_signal(stream_id, signal),
        }
    }

    pub(crate) fn spawn_validate(&self, generation: u64, url: String) {
        let transport = self.transport.clone();
        let tx = self.message_tx.clone();

        tokio::spawn(async move {
            let outcome = transport.validate(&url).await;
            tx.send(Message::Validated {
                generation,
                url,
                outcome,
            })
            .ok();
        });
    }

    fn spawn_fetch_metadata(&self, generation: u64, url: String) {
        let transport = self.transport.clone();
        let tx = self.message_tx.clone();

        tokio::spawn(async move {
            let outcome = transport.fetch_metadata(&url).await;
            tx.send(Message::MetadataFetched {
                generation,
                url,
                outcome,
            })
            .ok();
        });
    }

    fn is_current(&self, generation: u64, url: &str) -> bool {
        generation == self.generation
            && matches!(&self.state, SessionState::Validating { url: current } if current == url)
    }

    fn discard_stale(&self, kind: &str, generation: u64, url: &str) {
        tracing::debug!(
            kind,
            generation,
            current_generation = self.generation,
            url = %url,
            "discarding stale result"
        );
    }

    fn on_validated(
        &mut self,
        generation: u64,
        url: String,
        outcome: crate::error::Result<ValidationResponse>,
    ) {
        match outcome {
            Ok(response) if response.valid => {
                tracing::info!(url = %url, "URL accepted, fetching metadata");
                self.spawn_fetch_metadata(generation, url);
            }
            Ok(response) => {
                let reason = response
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| INVALID_URL_MESSAGE.to_string());
                tracing::info!(url = %url, reason = %reason, "URL rejected by backend");
                self.transition(SessionState::Idle);
                self.notify_error(&Error::ValidationRejected(reason));
            }
            Err(e) => {
                self.transition(SessionState::Idle);
                self.notify_error(&e);
            }
        }
    }

    fn on_metadata(&mut self, url: String, outcome: crate::error::Result<VideoMetadata>) {
        match outcome {
            Ok(metadata) => {
                tracing::info!(
                    url = %url,
                    title = %metadata.title,
                    formats = metadata.available_formats.len(),
                    "metadata ready"
                );
                self.transition(SessionState::MetadataReady {
                    source_url: url,
                    metadata,
                });
                self.notify(Notification::info("Video Found", "Ready to download"));
            }
            Err(e) => {
                self.transition(SessionState::Idle);
                self.notify_error(&e);
            }
        }
    }

    fn on_stream_signal(&mut self, stream_id: StreamId, signal: StreamSignal) {
        if self.state.stream_id() != Some(stream_id) {
            tracing::debug!(stream_id = %stream_id, state = %self.tag(), "discarding signal from closed stream");
            return;
        }

        match signal {
            StreamSignal::Event(event) => match event.status {
                ProgressStatus::Downloading | ProgressStatus::Processing => {
                    if let SessionState::Downloading { latest, .. } = &mut self.state {
                        *latest = event.clone();
                    }
                    self.event_tx.send(Event::Progress(event)).ok();
                }
                ProgressStatus::Complete => {
                    tracing::info!(stream_id = %stream_id, "download complete");
                    self.finish_download(event);
                    self.notify(Notification::info(
                        "Success",
                        "Download completed successfully",
                    ));
                }
                ProgressStatus::Error => {
                    let reason = event
                        .message
                        .clone()
                        .filter(|m| !m.trim().is_empty())
                        .unwrap_or_else(|| DOWNLOAD_FAILED_MESSAGE.to_string());
                    self.finish_download(event);
                    self.notify_error(&Error::Application(reason));
                }
            },
            StreamSignal::Broken(reason) => {
                tracing::warn!(stream_id = %stream_id, reason = %reason, "lost progress stream");
                let percentage = self.state.progress().map_or(0.0, |p| p.percentage);
                self.finish_download(ProgressEvent::failed(percentage, LOST_CONNECTION_MESSAGE));
                self.notify_error(&Error::Stream(LOST_CONNECTION_MESSAGE.to_string()));
            }
        }
    }

    /// Close the stream and move to terminal with `last` as the final event
    fn finish_download(&mut self, last: ProgressEvent) {
        let final_event = last.clone();
        self.transition_with(move |previous| match previous {
            SessionState::Downloading {
                metadata, request, ..
            } => SessionState::Terminal {
                metadata,
                request,
                last,
            },
            other => other,
        });
        self.event_tx.send(Event::Progress(final_event)).ok();
    }
}
