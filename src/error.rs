//! Error types for vidfetch
//!
//! This module provides the error taxonomy for a download session:
//! - Pre-network input errors (empty or malformed URL)
//! - Backend outcomes (validation rejected, video not found, transport failure)
//! - In-download failures (broken progress stream, application error events)
//! - Ambient errors (configuration, serialization, I/O)
//!
//! Every error can be mapped to a user-facing notification via [`ToNotification`].

use crate::types::Severity;
use thiserror::Error;

/// Result type alias for vidfetch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for vidfetch
///
/// None of these errors is retried automatically. Each one surfaces as exactly one
/// notification and leaves the orchestrator in a stable state.
#[derive(Debug, Error)]
pub enum Error {
    /// Empty or malformed URL, caught before any network call
    #[error("invalid input: {0}")]
    Input(String),

    /// The backend says the URL is not a supported video
    #[error("URL rejected: {0}")]
    ValidationRejected(String),

    /// Backend unreachable or non-success status during validate/fetch
    #[error("{operation} failed: {message}")]
    Transport {
        /// The backend operation that failed (e.g. "validate", "fetch_metadata")
        operation: &'static str,
        /// Human-readable reason, taken from the backend's `detail` when present
        message: String,
    },

    /// The backend reports no resolvable video
    #[error("video not found: {0}")]
    NotFound(String),

    /// The push subscription itself broke
    #[error("progress stream error: {0}")]
    Stream(String),

    /// The backend emitted a `status=error` progress event
    #[error("download failed: {0}")]
    Application(String),

    /// A progress stream message could not be decoded
    #[error("malformed progress event: {reason}")]
    MalformedEvent {
        /// Why decoding failed
        reason: String,
        /// The raw payload that failed to decode
        payload: String,
    },

    /// Operation not allowed in the current session state
    #[error("cannot {operation} while {state}")]
    InvalidState {
        /// The operation that was attempted (e.g. "start_download")
        operation: String,
        /// The current session state that prevents it
        state: String,
    },

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "backend.base_url")
        key: Option<String>,
    },

    /// Network error from the HTTP client
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for converting errors into user-facing notification attributes
pub trait ToNotification {
    /// Severity of the notification this error produces
    fn severity(&self) -> Severity;

    /// Machine-readable error code
    fn error_code(&self) -> &'static str;

    /// Short notification title
    fn title(&self) -> &'static str;

    /// Notification body shown to the user
    fn user_message(&self) -> String;
}

impl ToNotification for Error {
    fn severity(&self) -> Severity {
        // Every error is destructive from the user's point of view
        Severity::Destructive
    }

    fn error_code(&self) -> &'static str {
        match self {
            Error::Input(_) => "input_error",
            Error::ValidationRejected(_) => "validation_rejected",
            Error::Transport { .. } => "transport_error",
            Error::NotFound(_) => "not_found",
            Error::Stream(_) => "stream_error",
            Error::Application(_) => "application_error",
            Error::MalformedEvent { .. } => "malformed_event",
            Error::InvalidState { .. } => "invalid_state",
            Error::Config { .. } => "config_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::Io(_) => "io_error",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            Error::ValidationRejected(_) => "Invalid URL",
            Error::Stream(_) => "Connection Error",
            Error::Application(_) => "Download Failed",
            _ => "Error",
        }
    }

    fn user_message(&self) -> String {
        match self {
            // Backend-provided reasons are surfaced verbatim
            Error::Input(msg)
            | Error::ValidationRejected(msg)
            | Error::NotFound(msg)
            | Error::Stream(msg)
            | Error::Application(msg) => msg.clone(),
            Error::Transport { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
