//! User intents and their dispatch onto orchestrator commands.

use crate::error::Result;
use crate::orchestrator::Orchestrator;
use crate::request::{AudioCodec, DownloadKind, FormatChange, Quality, VideoContainer};
use serde::{Deserialize, Serialize};

/// Something the user did in the front-end
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", content = "value", rename_all = "snake_case")]
pub enum Intent {
    /// Submitted the URL form
    SubmitUrl(String),
    /// Picked audio or video
    SelectKind(DownloadKind),
    /// Picked an audio codec
    SelectAudioCodec(AudioCodec),
    /// Picked a video container
    SelectVideoContainer(VideoContainer),
    /// Picked a quality
    SelectQuality(Quality),
    /// Pressed "Start Download"
    StartDownload,
    /// Pressed "New Download"
    Reset,
}

impl Intent {
    /// The draft edit this intent stands for, if it is one
    pub fn format_change(&self) -> Option<FormatChange> {
        match *self {
            Intent::SelectKind(kind) => Some(FormatChange::Kind(kind)),
            Intent::SelectAudioCodec(codec) => Some(FormatChange::AudioCodec(codec)),
            Intent::SelectVideoContainer(container) => Some(FormatChange::VideoContainer(container)),
            Intent::SelectQuality(quality) => Some(FormatChange::Quality(quality)),
            Intent::SubmitUrl(_) | Intent::StartDownload | Intent::Reset => None,
        }
    }
}

impl Orchestrator {
    /// Route a user intent to the matching command
    ///
    /// # Panics
    ///
    /// `SubmitUrl` and `StartDownload` panic outside a tokio runtime, like the
    /// commands they route to.
    ///
    /// # Errors
    ///
    /// Returns whatever the command returns: `Error::Input` for a bad URL,
    /// `Error::InvalidState` for format edits or a start outside format selection,
    /// or the transport error if the progress stream cannot be opened.
    pub fn dispatch(&mut self, intent: Intent) -> Result<()> {
        tracing::debug!(intent = ?intent, state = %self.tag(), "dispatching intent");

        if let Some(change) = intent.format_change() {
            return self.change_format(change);
        }

        match intent {
            Intent::SubmitUrl(url) => self.submit_url(&url),
            Intent::StartDownload => self.start_download().map(|_| ()),
            Intent::Reset => {
                self.reset();
                Ok(())
            }
            // Handled above
            Intent::SelectKind(_)
            | Intent::SelectAudioCodec(_)
            | Intent::SelectVideoContainer(_)
            | Intent::SelectQuality(_) => Ok(()),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::orchestrator::test_helpers::{create_test_orchestrator, ready_orchestrator, settle};
    use crate::presentation::Panel;
    use crate::types::SessionTag;

    const URL: &str = "https://www.youtube.com/watch?v=ccccccccccc";

    #[test]
    fn intents_deserialize_from_front_end_json() {
        let intent: Intent =
            serde_json::from_str(r#"{"intent": "select_quality", "value": 1080}"#).unwrap();
        assert_eq!(intent, Intent::SelectQuality(Quality::P1080));

        let intent: Intent = serde_json::from_str(r#"{"intent": "reset"}"#).unwrap();
        assert_eq!(intent, Intent::Reset);

        let bad: std::result::Result<Intent, _> =
            serde_json::from_str(r#"{"intent": "select_quality", "value": 999}"#);
        assert!(bad.is_err());
    }

    #[tokio::test]
    async fn dispatch_drives_a_full_selection() {
        let (mut orchestrator, _transport) = create_test_orchestrator();

        orchestrator
            .dispatch(Intent::SubmitUrl(URL.to_string()))
            .unwrap();
        assert!(orchestrator.view().submitting);
        settle(&mut orchestrator).await;
        assert_eq!(orchestrator.view().panel, Panel::FormatSelection);

        orchestrator
            .dispatch(Intent::SelectKind(DownloadKind::Audio))
            .unwrap();
        orchestrator
            .dispatch(Intent::SelectAudioCodec(AudioCodec::Aac))
            .unwrap();
        let view = orchestrator.view();
        assert!(view.format.audio_options_visible);
        assert_eq!(view.format.audio_codec, AudioCodec::Aac);

        orchestrator.dispatch(Intent::StartDownload).unwrap();
        assert_eq!(orchestrator.view().panel, Panel::Progress);
        assert_eq!(
            orchestrator.view().progress.unwrap().headline,
            "Downloading..."
        );

        orchestrator.dispatch(Intent::Reset).unwrap();
        assert_eq!(orchestrator.tag(), SessionTag::Idle);
        assert_eq!(orchestrator.view().panel, Panel::UrlEntry);
    }

    #[tokio::test]
    async fn dispatch_reports_command_errors() {
        let (mut orchestrator, _transport) = ready_orchestrator(URL).await;
        orchestrator.dispatch(Intent::StartDownload).unwrap();

        let result = orchestrator.dispatch(Intent::SelectQuality(Quality::P360));
        assert!(matches!(result, Err(Error::InvalidState { .. })));

        let result = orchestrator.dispatch(Intent::SubmitUrl(" ".to_string()));
        assert!(matches!(result, Err(Error::Input(_))));
        // A bad URL does not disturb the running download
        assert_eq!(orchestrator.tag(), SessionTag::Downloading);
    }
}
