//! Core types for vidfetch

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, ToNotification};

/// Metadata for a resolvable video, as returned by the backend
///
/// Immutable once fetched. The orchestrator owns it for the lifetime of one
/// download session and replaces it wholesale on reset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Video title
    #[serde(default = "default_unknown")]
    pub title: String,

    /// Duration in seconds (a missing or null duration decodes as 0)
    #[serde(default, deserialize_with = "null_as_zero")]
    pub duration: u64,

    /// Thumbnail image URL
    #[serde(rename = "thumbnail", default)]
    pub thumbnail_url: String,

    /// Uploader / channel name
    #[serde(default = "default_unknown")]
    pub uploader: String,

    /// Available formats, in backend order
    #[serde(rename = "formats", default)]
    pub available_formats: Vec<FormatInfo>,
}

/// One downloadable format of a video
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatInfo {
    /// Backend format identifier
    pub format_id: String,

    /// File extension (e.g. "mp4", "webm")
    #[serde(rename = "ext")]
    pub extension: String,

    /// Resolution label (e.g. "720p")
    pub resolution: String,

    /// Size in bytes, when the backend knows it
    #[serde(rename = "filesize", default, skip_serializing_if = "Option::is_none")]
    pub file_size_bytes: Option<u64>,
}

/// Response of the URL validation call
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResponse {
    /// Whether the backend can handle this URL
    pub valid: bool,

    /// Optional reason, usually present when `valid` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Status carried by a progress event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    /// Media is being fetched
    Downloading,
    /// Fetch finished, backend is post-processing
    Processing,
    /// Download finished successfully (terminal)
    Complete,
    /// Download failed (terminal)
    Error,
}

impl ProgressStatus {
    /// Whether this status ends the progress stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressStatus::Complete | ProgressStatus::Error)
    }

    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::Downloading => "downloading",
            ProgressStatus::Processing => "processing",
            ProgressStatus::Complete => "complete",
            ProgressStatus::Error => "error",
        }
    }
}

/// One server-pushed progress record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Completion percentage, nominally in `[0, 100]`
    pub percentage: f64,

    /// Transfer rate label as formatted by the backend (e.g. "1.2MiB/s")
    #[serde(rename = "speed", default)]
    pub speed_label: String,

    /// Remaining time label as formatted by the backend (e.g. "00:42")
    #[serde(rename = "eta", default)]
    pub eta_label: String,

    /// Event status
    pub status: ProgressStatus,

    /// Optional human-readable message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ProgressEvent {
    /// The synthetic event a download starts from: 0%, downloading
    pub fn initial() -> Self {
        Self {
            percentage: 0.0,
            speed_label: String::new(),
            eta_label: String::new(),
            status: ProgressStatus::Downloading,
            message: None,
        }
    }

    /// A terminal error event that keeps the last known percentage
    pub fn failed(percentage: f64, message: impl Into<String>) -> Self {
        Self {
            percentage,
            speed_label: String::new(),
            eta_label: String::new(),
            status: ProgressStatus::Error,
            message: Some(message.into()),
        }
    }
}

/// Notification severity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational (success, progress milestones)
    Info,
    /// Destructive (errors and rejections)
    Destructive,
}

/// A user-visible message (toast)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Severity used to pick the toast style
    pub severity: Severity,
    /// Short title
    pub title: String,
    /// Body text
    pub message: String,
    /// Machine-readable error code for destructive notifications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// When the notification was raised
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    /// Informational notification
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            title: title.into(),
            message: message.into(),
            code: None,
            timestamp: Utc::now(),
        }
    }

    /// Notification describing an error
    pub fn from_error(error: &Error) -> Self {
        Self {
            severity: error.severity(),
            title: error.title().to_string(),
            message: error.user_message(),
            code: Some(error.error_code().to_string()),
            timestamp: Utc::now(),
        }
    }
}

/// Tag of the current session state, without its payload
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionTag {
    /// Waiting for a URL
    Idle,
    /// Validating the URL or fetching its metadata
    Validating,
    /// Metadata fetched, format selection open
    MetadataReady,
    /// Progress stream open
    Downloading,
    /// Download ended (complete or error)
    Terminal,
}

impl std::fmt::Display for SessionTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionTag::Idle => "idle",
            SessionTag::Validating => "validating",
            SessionTag::MetadataReady => "metadata_ready",
            SessionTag::Downloading => "downloading",
            SessionTag::Terminal => "terminal",
        };
        f.write_str(name)
    }
}

/// Events broadcast by the orchestrator to its subscribers
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A user-visible notification
    Notification(Notification),

    /// The session moved between states
    StateChanged {
        /// Previous state
        from: SessionTag,
        /// New state
        to: SessionTag,
    },

    /// A progress event was applied to the active download
    Progress(ProgressEvent),
}

fn default_unknown() -> String {
    "Unknown".to_string()
}

fn null_as_zero<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or(0))
}
