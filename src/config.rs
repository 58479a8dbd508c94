//! Configuration types for vidfetch

use crate::error::{Error, Result};
use crate::request::{AudioCodec, DownloadDraft, DownloadKind, Quality, VideoContainer};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding [`BackendConfig::base_url`]
pub const API_URL_ENV: &str = "VIDFETCH_API_URL";

/// Backend connection settings
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the backend service (default: "http://localhost:8000")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Whole-request timeout for validate and metadata calls (default: 30 seconds)
    ///
    /// Not applied to the progress stream, which stays open for the whole download.
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// TCP connect timeout for every call, including the progress stream (default: 10 seconds)
    #[serde(default = "default_connect_timeout", with = "duration_serde")]
    pub connect_timeout: Duration,

    /// User-Agent header sent to the backend
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Progress stream settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Treat the stream as broken after this long without a message (None = wait forever)
    ///
    /// The backend pushes a snapshot every half second while a download runs, so a
    /// long silence usually means a dead connection.
    #[serde(default, with = "optional_duration_serde")]
    pub idle_timeout: Option<Duration>,

    /// Capacity of the channel between the connection task and the reader (default: 64)
    #[serde(default = "default_frame_buffer")]
    pub frame_buffer: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            idle_timeout: None,
            frame_buffer: default_frame_buffer(),
        }
    }
}

/// Initial values of the format-selection draft
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct FormatDefaults {
    /// Audio or video (default: video)
    #[serde(default)]
    pub kind: DownloadKind,

    /// Audio codec (default: mp3)
    #[serde(default)]
    pub audio_codec: AudioCodec,

    /// Video container (default: mp4)
    #[serde(default)]
    pub video_container: VideoContainer,

    /// Video quality (default: 720)
    #[serde(default)]
    pub quality: Quality,
}

impl FormatDefaults {
    /// The draft a fresh session starts with
    pub fn draft(&self) -> DownloadDraft {
        DownloadDraft {
            kind: self.kind,
            audio_codec: self.audio_codec,
            video_container: self.video_container,
            quality: self.quality,
        }
    }
}

/// Main configuration for the orchestrator and its HTTP transport
///
/// Fields are organized into logical sub-configs:
/// - [`backend`](BackendConfig): where the backend lives and how long to wait for it
/// - [`stream`](StreamConfig): progress stream behavior
/// - [`defaults`](FormatDefaults): initial format selection
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend connection settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Progress stream settings
    #[serde(default)]
    pub stream: StreamConfig,

    /// Initial format selection
    #[serde(default)]
    pub defaults: FormatDefaults,
}

impl Config {
    /// Load configuration from a JSON file
    ///
    /// Missing fields take their defaults. The result is validated before it is returned.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Default configuration with environment overrides applied
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides (`VIDFETCH_API_URL`) in place
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            let url = url.trim();
            if !url.is_empty() {
                self.backend.base_url = url.to_string();
            }
        }
    }

    /// Check that the configuration is usable
    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.backend.base_url).map_err(|e| Error::Config {
            message: format!("invalid backend URL '{}': {}", self.backend.base_url, e),
            key: Some("backend.base_url".to_string()),
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Config {
                message: format!(
                    "backend URL must use http or https, got '{}'",
                    parsed.scheme()
                ),
                key: Some("backend.base_url".to_string()),
            });
        }

        if self.stream.frame_buffer == 0 {
            return Err(Error::Config {
                message: "frame buffer must be at least 1".to_string(),
                key: Some("stream.frame_buffer".to_string()),
            });
        }

        Ok(())
    }

    /// The backend base URL
    pub fn base_url(&self) -> &str {
        &self.backend.base_url
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_user_agent() -> String {
    format!("vidfetch/{}", env!("CARGO_PKG_VERSION"))
}

fn default_frame_buffer() -> usize {
    64
}

// Duration serialization helper (as whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
