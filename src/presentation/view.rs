//! Render-ready snapshot of a session.

use crate::orchestrator::{Orchestrator, SessionState};
use crate::request::{AudioCodec, DownloadDraft, DownloadKind, Quality, VideoContainer};
use crate::types::{FormatInfo, ProgressEvent, ProgressStatus, SessionTag, VideoMetadata};
use crate::utils::{format_duration, format_file_size};
use serde::Serialize;

/// Shown under a completed download
pub const COMPLETE_FOOTER: &str =
    "Your file is ready and will be automatically cleaned up after 1 hour.";

/// Which panel the front-end should show
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Panel {
    /// URL input (idle or validating)
    UrlEntry,
    /// Metadata preview with the format picker
    FormatSelection,
    /// Metadata preview with download progress
    Progress,
}

/// Metadata preview card
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PreviewCard {
    /// Video title
    pub title: String,
    /// "by <uploader>"
    pub uploader_label: String,
    /// Thumbnail URL (may be empty)
    pub thumbnail_url: String,
    /// Duration as `M:SS` or `H:MM:SS`
    pub duration_label: String,
    /// Number of formats the backend reported
    pub format_count: usize,
    /// One line per reported format, e.g. "720p mp4 (10.0 MiB)"
    pub format_labels: Vec<String>,
}

impl PreviewCard {
    fn from_metadata(metadata: &VideoMetadata) -> Self {
        Self {
            title: metadata.title.clone(),
            uploader_label: format!("by {}", metadata.uploader),
            thumbnail_url: metadata.thumbnail_url.clone(),
            duration_label: format_duration(metadata.duration),
            format_count: metadata.available_formats.len(),
            format_labels: metadata.available_formats.iter().map(format_label).collect(),
        }
    }
}

fn format_label(format: &FormatInfo) -> String {
    match format.file_size_bytes {
        Some(size) => format!(
            "{} {} ({})",
            format.resolution,
            format.extension,
            format_file_size(size)
        ),
        None => format!("{} {}", format.resolution, format.extension),
    }
}

/// One entry of the quality picker
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct QualityOption {
    /// Quality this entry selects
    pub quality: Quality,
    /// Display label, e.g. "720p (HD)"
    pub label: &'static str,
    /// Whether this is the current choice
    pub selected: bool,
}

/// Format picker controls
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FormatPickerView {
    /// Audio or video
    pub kind: DownloadKind,
    /// Selected audio codec
    pub audio_codec: AudioCodec,
    /// Selected video container
    pub video_container: VideoContainer,
    /// Selected quality
    pub quality: Quality,
    /// Whether the codec picker is shown
    pub audio_options_visible: bool,
    /// Whether the container and quality pickers are shown
    pub video_options_visible: bool,
    /// Quality picker entries, highest first
    pub quality_options: Vec<QualityOption>,
}

impl FormatPickerView {
    fn from_draft(draft: &DownloadDraft) -> Self {
        Self {
            kind: draft.kind,
            audio_codec: draft.audio_codec,
            video_container: draft.video_container,
            quality: draft.quality,
            audio_options_visible: draft.kind == DownloadKind::Audio,
            video_options_visible: draft.kind == DownloadKind::Video,
            quality_options: Quality::ALL
                .iter()
                .map(|&quality| QualityOption {
                    quality,
                    label: quality.label(),
                    selected: quality == draft.quality,
                })
                .collect(),
        }
    }
}

/// Icon next to the progress headline
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusIcon {
    /// Pulsing download arrow
    Downloading,
    /// Spinner
    Processing,
    /// Check mark
    Complete,
    /// Cross
    Failed,
}

/// Progress card
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProgressView {
    /// Status of the event shown
    pub status: ProgressStatus,
    /// "Downloading...", "Processing...", "Download Complete" or "Download Failed"
    pub headline: &'static str,
    /// Icon for the status
    pub icon: StatusIcon,
    /// Percentage exactly as reported
    pub percentage: f64,
    /// Percentage with one decimal, e.g. "42.5%"
    pub percent_label: String,
    /// Progress bar fill in `[0, 1]`
    pub bar_fraction: f64,
    /// "Speed: <speed>", when the backend reported one
    pub speed_label: Option<String>,
    /// "ETA: <eta>", when the backend reported one
    pub eta_label: Option<String>,
    /// Backend message, if any
    pub message: Option<String>,
    /// Whether the bar and the labels are shown (hidden once terminal)
    pub show_bar: bool,
    /// Text under a completed download
    pub footer: Option<&'static str>,
}

impl ProgressView {
    /// Build the card for one progress event
    pub fn from_event(event: &ProgressEvent) -> Self {
        let (headline, icon) = match event.status {
            ProgressStatus::Downloading => ("Downloading...", StatusIcon::Downloading),
            ProgressStatus::Processing => ("Processing...", StatusIcon::Processing),
            ProgressStatus::Complete => ("Download Complete", StatusIcon::Complete),
            ProgressStatus::Error => ("Download Failed", StatusIcon::Failed),
        };

        Self {
            status: event.status,
            headline,
            icon,
            percentage: event.percentage,
            percent_label: format!("{:.1}%", event.percentage),
            bar_fraction: bar_fraction(event.percentage),
            speed_label: non_empty(&event.speed_label).map(|s| format!("Speed: {}", s)),
            eta_label: non_empty(&event.eta_label).map(|s| format!("ETA: {}", s)),
            message: event.message.clone().filter(|m| !m.is_empty()),
            show_bar: !event.status.is_terminal(),
            footer: (event.status == ProgressStatus::Complete).then_some(COMPLETE_FOOTER),
        }
    }
}

/// Everything a front-end needs to render the current session
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ViewState {
    /// Session state tag
    pub tag: SessionTag,
    /// Panel to show
    pub panel: Panel,
    /// Whether the URL input shows a spinner and is disabled
    pub submitting: bool,
    /// Whether the "New Download" button is shown
    pub can_reset: bool,
    /// Whether the "Start Download" button is enabled
    pub can_start_download: bool,
    /// Metadata preview, once resolved
    pub preview: Option<PreviewCard>,
    /// Format picker (shown on the format selection panel)
    pub format: FormatPickerView,
    /// Progress card, once a download has started
    pub progress: Option<ProgressView>,
}

impl ViewState {
    /// Project a session state and draft into a view
    pub fn from_session(state: &SessionState, draft: &DownloadDraft) -> Self {
        let tag = state.tag();
        let panel = match tag {
            SessionTag::Idle | SessionTag::Validating => Panel::UrlEntry,
            SessionTag::MetadataReady => Panel::FormatSelection,
            SessionTag::Downloading | SessionTag::Terminal => Panel::Progress,
        };
        let preview = state.metadata().map(PreviewCard::from_metadata);

        Self {
            tag,
            panel,
            submitting: tag == SessionTag::Validating,
            can_reset: preview.is_some(),
            can_start_download: tag == SessionTag::MetadataReady,
            preview,
            format: FormatPickerView::from_draft(draft),
            progress: state.progress().map(ProgressView::from_event),
        }
    }
}

impl Orchestrator {
    /// Render-ready view of the current session
    pub fn view(&self) -> ViewState {
        ViewState::from_session(self.state(), self.draft())
    }
}

/// Clamp a reported percentage into a bar fill fraction
fn bar_fraction(percentage: f64) -> f64 {
    if percentage.is_nan() {
        return 0.0;
    }
    (percentage / 100.0).clamp(0.0, 1.0)
}

fn non_empty(label: &str) -> Option<&str> {
    let trimmed = label.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
