//! # vidfetch
//!
//! Client-side orchestration for a video download backend: submit a video URL,
//! preview its metadata, choose an output format and follow a live progress stream
//! until the download completes or fails.
//!
//! ## Design Philosophy
//!
//! vidfetch is designed to be:
//! - **Library-first** - No UI; front-ends render a [`ViewState`] and send [`Intent`]s
//! - **Single-owner** - One [`Orchestrator`] per session, driven through `&mut self`
//! - **Event-driven** - Consumers subscribe to notifications, state changes and progress
//! - **Backend-agnostic** - The network sits behind the [`Transport`] trait
//!
//! ## Quick Start
//!
//! ```no_run
//! use vidfetch::{Config, Event, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut orchestrator = Orchestrator::with_http(Config::from_env()?)?;
//!
//!     // Subscribe to events
//!     let mut events = orchestrator.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             if let Event::Notification(n) = event {
//!                 println!("{}: {}", n.title, n.message);
//!             }
//!         }
//!     });
//!
//!     orchestrator.submit_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ")?;
//!     orchestrator.run_until_settled().await;
//!
//!     if orchestrator.view().can_start_download {
//!         orchestrator.start_download()?;
//!         orchestrator.run_until_settled().await;
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Download orchestration state machine
pub mod orchestrator;
/// View state and user intents for front-ends
pub mod presentation;
/// Progress stream reader
pub mod progress;
/// Download request construction
pub mod request;
/// Backend transport (HTTP + server-sent events)
pub mod transport;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::{BackendConfig, Config, FormatDefaults, StreamConfig};
pub use error::{Error, Result, ToNotification};
pub use orchestrator::{Message, Orchestrator, SessionState};
pub use presentation::{Intent, Panel, ProgressView, ViewState};
pub use progress::{ProgressReader, StreamSignal};
pub use request::{
    AudioCodec, DownloadDraft, DownloadKind, DownloadRequest, FormatChange, Quality,
    RequestFormat, VideoContainer,
};
pub use transport::{HttpTransport, StreamHandle, StreamId, Transport};
pub use types::{
    Event, FormatInfo, Notification, ProgressEvent, ProgressStatus, SessionTag, Severity,
    ValidationResponse, VideoMetadata,
};
