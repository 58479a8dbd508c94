//! Progress stream reader
//!
//! Turns the raw [`Frame`]s of a progress subscription into [`StreamSignal`]s for the
//! orchestrator:
//! - each data frame is decoded as a [`ProgressEvent`]; undecodable frames are logged
//!   and dropped without changing anything
//! - a transport failure, a server-side close before any terminal event, or an idle
//!   timeout becomes a single [`StreamSignal::Broken`]
//! - after the first terminal signal, or once the handle is closed, nothing more is
//!   delivered, even if frames are already buffered

use crate::error::{Error, Result};
use crate::transport::{Frame, ProgressSubscription, StreamHandle, StreamId};
use crate::types::ProgressEvent;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// What the reader reports to its subscriber
#[derive(Clone, Debug, PartialEq)]
pub enum StreamSignal {
    /// A decoded progress event
    Event(ProgressEvent),
    /// The subscription broke (not an application-level error event)
    Broken(String),
}

impl StreamSignal {
    /// Whether no further signal can follow this one
    pub fn is_terminal(&self) -> bool {
        match self {
            StreamSignal::Event(event) => event.status.is_terminal(),
            StreamSignal::Broken(_) => true,
        }
    }
}

/// Decode one message payload as a progress event
///
/// # Errors
///
/// Returns [`Error::MalformedEvent`] if the payload is not a valid progress event.
pub fn decode_event(payload: &str) -> Result<ProgressEvent> {
    serde_json::from_str(payload).map_err(|e| Error::MalformedEvent {
        reason: e.to_string(),
        payload: payload.to_string(),
    })
}

enum Received {
    Frame(Frame),
    Disconnected,
    IdleTimeout(Duration),
}

/// Reads one progress subscription on behalf of a single subscriber
#[derive(Debug)]
pub struct ProgressReader {
    stream_id: StreamId,
    frames: mpsc::Receiver<Frame>,
    token: CancellationToken,
    idle_timeout: Option<Duration>,
    finished: bool,
    malformed: usize,
}

impl ProgressReader {
    /// Attach to the frames of the subscription `handle` belongs to
    pub fn attach(handle: &StreamHandle, frames: mpsc::Receiver<Frame>) -> Self {
        Self {
            stream_id: handle.id(),
            frames,
            token: handle.cancellation_token(),
            idle_timeout: None,
            finished: false,
            malformed: 0,
        }
    }

    /// Split a subscription into its handle and a reader attached to it
    pub fn from_subscription(subscription: ProgressSubscription) -> (StreamHandle, Self) {
        let ProgressSubscription { handle, frames } = subscription;
        let reader = Self::attach(&handle, frames);
        (handle, reader)
    }

    /// Report the stream as broken after `timeout` without any frame
    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Subscription this reader is attached to
    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    /// Number of frames dropped because they could not be decoded
    pub fn malformed_count(&self) -> usize {
        self.malformed
    }

    /// Wait for the next signal
    ///
    /// Returns `None` once a terminal signal has been delivered or the handle has
    /// been closed.
    pub async fn next_signal(&mut self) -> Option<StreamSignal> {
        while !self.finished {
            let received = tokio::select! {
                biased;
                _ = self.token.cancelled() => {
                    self.finished = true;
                    return None;
                }
                received = recv_frame(&mut self.frames, self.idle_timeout) => received,
            };

            // close() may have raced with an already-buffered frame
            if self.token.is_cancelled() {
                self.finished = true;
                return None;
            }

            match received {
                Received::Frame(Frame::Data(payload)) => match decode_event(&payload) {
                    Ok(event) => {
                        if event.status.is_terminal() {
                            self.finished = true;
                        }
                        return Some(StreamSignal::Event(event));
                    }
                    Err(e) => {
                        self.malformed += 1;
                        tracing::warn!(
                            stream_id = %self.stream_id,
                            error = %e,
                            "dropping malformed progress event"
                        );
                    }
                },
                Received::Frame(Frame::Failed(reason)) => return Some(self.broken(reason)),
                Received::Frame(Frame::Closed) => {
                    return Some(self.broken("stream closed by server before completion".to_string()));
                }
                Received::Disconnected => {
                    return Some(self.broken("stream ended unexpectedly".to_string()));
                }
                Received::IdleTimeout(limit) => {
                    return Some(self.broken(format!(
                        "no progress received for {} seconds",
                        limit.as_secs()
                    )));
                }
            }
        }

        None
    }

    /// Run the reader on the tokio runtime, invoking `on_signal` for every signal
    ///
    /// The task ends after the first terminal signal or when the handle is closed.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn spawn<F>(mut self, mut on_signal: F) -> JoinHandle<()>
    where
        F: FnMut(StreamSignal) + Send + 'static,
    {
        tokio::spawn(async move {
            while let Some(signal) = self.next_signal().await {
                if self.token.is_cancelled() {
                    break;
                }
                on_signal(signal);
            }
            tracing::debug!(stream_id = %self.stream_id, "progress reader finished");
        })
    }

    fn broken(&mut self, reason: String) -> StreamSignal {
        self.finished = true;
        tracing::warn!(stream_id = %self.stream_id, reason = %reason, "progress stream broken");
        StreamSignal::Broken(reason)
    }
}

async fn recv_frame(frames: &mut mpsc::Receiver<Frame>, idle: Option<Duration>) -> Received {
    match idle {
        Some(limit) => match tokio::time::timeout(limit, frames.recv()).await {
            Ok(Some(frame)) => Received::Frame(frame),
            Ok(None) => Received::Disconnected,
            Err(_) => Received::IdleTimeout(limit),
        },
        None => match frames.recv().await {
            Some(frame) => Received::Frame(frame),
            None => Received::Disconnected,
        },
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProgressStatus;

    fn data(percentage: f64, status: &str) -> Frame {
        Frame::Data(format!(
            r#"{{"percentage": {}, "speed": "1MiB/s", "eta": "00:10", "status": "{}"}}"#,
            percentage, status
        ))
    }

    fn reader_with_channel() -> (StreamHandle, ProgressReader, mpsc::Sender<Frame>) {
        let handle = StreamHandle::new();
        let (tx, rx) = mpsc::channel(16);
        let reader = ProgressReader::attach(&handle, rx);
        (handle, reader, tx)
    }

    #[test]
    fn decode_event_reports_malformed_payload() {
        match decode_event("not json") {
            Err(Error::MalformedEvent { payload, .. }) => assert_eq!(payload, "not json"),
            other => panic!("expected malformed event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn delivers_events_in_arrival_order() {
        let (_handle, mut reader, tx) = reader_with_channel();
        tx.send(data(10.0, "downloading")).await.unwrap();
        tx.send(data(5.0, "downloading")).await.unwrap();
        tx.send(data(100.0, "processing")).await.unwrap();

        let mut seen = Vec::new();
        for _ in 0..3 {
            match reader.next_signal().await {
                Some(StreamSignal::Event(ev)) => seen.push((ev.percentage, ev.status)),
                other => panic!("unexpected signal {:?}", other),
            }
        }

        // Non-monotonic values are delivered verbatim
        assert_eq!(
            seen,
            vec![
                (10.0, ProgressStatus::Downloading),
                (5.0, ProgressStatus::Downloading),
                (100.0, ProgressStatus::Processing),
            ]
        );
    }

    #[tokio::test]
    async fn malformed_frames_are_dropped() {
        let (_handle, mut reader, tx) = reader_with_channel();
        tx.send(Frame::Data("{oops".to_string())).await.unwrap();
        tx.send(Frame::Data(r#"{"percentage": 1, "status": "paused"}"#.to_string()))
            .await
            .unwrap();
        tx.send(data(20.0, "downloading")).await.unwrap();

        let signal = reader.next_signal().await.unwrap();
        assert!(matches!(signal, StreamSignal::Event(ev) if ev.percentage == 20.0));
        assert_eq!(reader.malformed_count(), 2);
    }

    #[tokio::test]
    async fn nothing_is_delivered_after_terminal_event() {
        let (_handle, mut reader, tx) = reader_with_channel();
        tx.send(data(100.0, "complete")).await.unwrap();
        tx.send(data(50.0, "downloading")).await.unwrap();
        tx.send(Frame::Failed("reset".to_string())).await.unwrap();

        let first = reader.next_signal().await.unwrap();
        assert!(first.is_terminal());
        assert_eq!(reader.next_signal().await, None);
    }

    #[tokio::test]
    async fn transport_failure_is_reported_once() {
        let (_handle, mut reader, tx) = reader_with_channel();
        tx.send(Frame::Failed("connection reset".to_string()))
            .await
            .unwrap();
        tx.send(Frame::Closed).await.unwrap();

        assert_eq!(
            reader.next_signal().await,
            Some(StreamSignal::Broken("connection reset".to_string()))
        );
        assert_eq!(reader.next_signal().await, None);
    }

    #[tokio::test]
    async fn server_close_without_terminal_event_is_broken() {
        let (_handle, mut reader, tx) = reader_with_channel();
        tx.send(data(40.0, "downloading")).await.unwrap();
        tx.send(Frame::Closed).await.unwrap();

        assert!(matches!(
            reader.next_signal().await,
            Some(StreamSignal::Event(_))
        ));
        assert!(matches!(
            reader.next_signal().await,
            Some(StreamSignal::Broken(_))
        ));
    }

    #[tokio::test]
    async fn dropped_sender_is_broken() {
        let (_handle, mut reader, tx) = reader_with_channel();
        drop(tx);
        assert!(matches!(
            reader.next_signal().await,
            Some(StreamSignal::Broken(_))
        ));
    }

    #[tokio::test]
    async fn closed_handle_suppresses_buffered_frames() {
        let (handle, mut reader, tx) = reader_with_channel();
        tx.send(data(30.0, "downloading")).await.unwrap();
        tx.send(data(100.0, "complete")).await.unwrap();

        handle.close();

        assert_eq!(reader.next_signal().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_timeout_breaks_stalled_stream() {
        let (_handle, reader, _tx) = reader_with_channel();
        let mut reader = reader.with_idle_timeout(Some(Duration::from_secs(15)));

        match reader.next_signal().await {
            Some(StreamSignal::Broken(reason)) => assert!(reason.contains("15 seconds")),
            other => panic!("expected broken stream, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn spawned_reader_forwards_until_terminal() {
        let (_handle, reader, tx) = reader_with_channel();
        let (sink_tx, mut sink_rx) = mpsc::unbounded_channel();

        let task = reader.spawn(move |signal| {
            sink_tx.send(signal).ok();
        });

        tx.send(data(50.0, "downloading")).await.unwrap();
        tx.send(Frame::Data(r#"{"percentage": 0, "status": "error", "message": "boom"}"#.into()))
            .await
            .unwrap();
        // The reader may already be gone
        tx.send(data(60.0, "downloading")).await.ok();

        task.await.unwrap();

        let mut signals = Vec::new();
        while let Ok(signal) = sink_rx.try_recv() {
            signals.push(signal);
        }
        assert_eq!(signals.len(), 2);
        assert!(signals[1].is_terminal());
    }
}
