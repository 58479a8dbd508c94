//! Download request construction
//!
//! The user edits a [`DownloadDraft`] while metadata is on screen. Starting a download
//! turns the draft into an immutable [`DownloadRequest`]. The kind-dependent fields
//! live inside [`RequestFormat`], so an audio request cannot carry a video container or
//! quality and a video request cannot carry an audio codec.

use serde::{Deserialize, Serialize};

/// Whether to download audio only or the full video
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadKind {
    /// Audio only
    Audio,
    /// Video with audio
    #[default]
    Video,
}

impl DownloadKind {
    /// Wire name used in the `format` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadKind::Audio => "audio",
            DownloadKind::Video => "video",
        }
    }
}

/// Audio codec for audio-only downloads
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCodec {
    /// MP3
    #[default]
    Mp3,
    /// AAC
    Aac,
}

impl AudioCodec {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioCodec::Mp3 => "mp3",
            AudioCodec::Aac => "aac",
        }
    }
}

/// Container for video downloads
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoContainer {
    /// MP4
    #[default]
    Mp4,
    /// WebM
    Webm,
}

impl VideoContainer {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoContainer::Mp4 => "mp4",
            VideoContainer::Webm => "webm",
        }
    }
}

/// Target vertical resolution for video downloads
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Quality {
    /// 360p
    P360,
    /// 480p
    P480,
    /// 720p (HD)
    #[default]
    P720,
    /// 1080p (Full HD)
    P1080,
}

impl Quality {
    /// All selectable qualities, highest first
    pub const ALL: [Quality; 4] = [Quality::P1080, Quality::P720, Quality::P480, Quality::P360];

    /// Height in pixels
    pub fn height(&self) -> u32 {
        match self {
            Quality::P360 => 360,
            Quality::P480 => 480,
            Quality::P720 => 720,
            Quality::P1080 => 1080,
        }
    }

    /// Label shown in a quality picker
    pub fn label(&self) -> &'static str {
        match self {
            Quality::P1080 => "1080p (Full HD)",
            Quality::P720 => "720p (HD)",
            Quality::P480 => "480p (SD)",
            Quality::P360 => "360p",
        }
    }
}

impl TryFrom<u32> for Quality {
    type Error = String;

    fn try_from(height: u32) -> Result<Self, Self::Error> {
        match height {
            360 => Ok(Quality::P360),
            480 => Ok(Quality::P480),
            720 => Ok(Quality::P720),
            1080 => Ok(Quality::P1080),
            other => Err(format!("unsupported quality: {}", other)),
        }
    }
}

impl From<Quality> for u32 {
    fn from(quality: Quality) -> Self {
        quality.height()
    }
}

/// A single edit to the draft, as produced by format-selection controls
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatChange {
    /// Switch between audio and video
    Kind(DownloadKind),
    /// Pick the audio codec
    AudioCodec(AudioCodec),
    /// Pick the video container
    VideoContainer(VideoContainer),
    /// Pick the target quality
    Quality(Quality),
}

/// The not-yet-submitted request being edited while metadata is shown
///
/// All fields are kept regardless of kind so that toggling between audio and video
/// does not lose the user's other choices. Irrelevant fields are dropped only when
/// the request is built.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadDraft {
    /// Audio or video
    pub kind: DownloadKind,
    /// Codec used when `kind` is audio
    pub audio_codec: AudioCodec,
    /// Container used when `kind` is video
    pub video_container: VideoContainer,
    /// Quality used when `kind` is video
    pub quality: Quality,
}

impl DownloadDraft {
    /// Apply one edit
    pub fn apply(&mut self, change: FormatChange) {
        match change {
            FormatChange::Kind(kind) => self.kind = kind,
            FormatChange::AudioCodec(codec) => self.audio_codec = codec,
            FormatChange::VideoContainer(container) => self.video_container = container,
            FormatChange::Quality(quality) => self.quality = quality,
        }
    }

    /// Build the outgoing request, keeping only the fields relevant to the kind
    pub fn build_request(&self, source_url: impl Into<String>) -> DownloadRequest {
        let format = match self.kind {
            DownloadKind::Audio => RequestFormat::Audio {
                codec: self.audio_codec,
            },
            DownloadKind::Video => RequestFormat::Video {
                container: self.video_container,
                quality: self.quality,
            },
        };

        DownloadRequest {
            source_url: source_url.into(),
            format,
        }
    }
}

/// Kind-dependent part of a download request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum RequestFormat {
    /// Audio-only download
    Audio {
        /// Output codec
        codec: AudioCodec,
    },
    /// Video download
    Video {
        /// Output container
        container: VideoContainer,
        /// Target quality
        quality: Quality,
    },
}

/// An immutable, submitted download request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    /// The video URL the metadata was fetched for
    pub source_url: String,
    /// Kind and kind-dependent options
    pub format: RequestFormat,
}

impl DownloadRequest {
    /// Audio or video
    pub fn kind(&self) -> DownloadKind {
        match self.format {
            RequestFormat::Audio { .. } => DownloadKind::Audio,
            RequestFormat::Video { .. } => DownloadKind::Video,
        }
    }

    /// Query parameters of the progress subscription request, in wire order
    ///
    /// Audio requests carry `audio_format` and never `video_format`/`quality`;
    /// video requests carry `quality` and `video_format` and never `audio_format`.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("url", self.source_url.clone()),
            ("format", self.kind().as_str().to_string()),
        ];

        match self.format {
            RequestFormat::Audio { codec } => {
                pairs.push(("audio_format", codec.as_str().to_string()));
            }
            RequestFormat::Video { container, quality } => {
                pairs.push(("quality", quality.height().to_string()));
                pairs.push(("video_format", container.as_str().to_string()));
            }
        }

        pairs
    }
}
