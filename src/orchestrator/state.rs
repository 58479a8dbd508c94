//! Session state of one orchestrator.

use crate::request::DownloadRequest;
use crate::transport::{StreamHandle, StreamId};
use crate::types::{ProgressEvent, SessionTag, VideoMetadata};

/// Where the current download session is
///
/// Exactly one variant is active. The progress subscription handle lives inside
/// [`SessionState::Downloading`], so a subscription exists iff the session is
/// downloading; dropping or replacing the variant closes it.
#[derive(Debug, Default)]
pub enum SessionState {
    /// Waiting for a URL
    #[default]
    Idle,

    /// Validating `url`, then fetching its metadata
    Validating {
        /// Normalized URL being resolved
        url: String,
    },

    /// Metadata fetched, the user is choosing a format
    MetadataReady {
        /// URL the metadata belongs to
        source_url: String,
        /// Resolved metadata
        metadata: VideoMetadata,
    },

    /// Progress stream open
    Downloading {
        /// Metadata of the video being downloaded
        metadata: VideoMetadata,
        /// Request the stream was opened for
        request: DownloadRequest,
        /// Most recent progress event
        latest: ProgressEvent,
        /// Handle of the open subscription
        stream: StreamHandle,
    },

    /// Download ended, successfully or not
    Terminal {
        /// Metadata of the video that was downloaded
        metadata: VideoMetadata,
        /// Request that was run
        request: DownloadRequest,
        /// Final progress event (`complete` or `error`)
        last: ProgressEvent,
    },
}

impl SessionState {
    /// Tag of this state, without its payload
    pub fn tag(&self) -> SessionTag {
        match self {
            SessionState::Idle => SessionTag::Idle,
            SessionState::Validating { .. } => SessionTag::Validating,
            SessionState::MetadataReady { .. } => SessionTag::MetadataReady,
            SessionState::Downloading { .. } => SessionTag::Downloading,
            SessionState::Terminal { .. } => SessionTag::Terminal,
        }
    }

    /// Metadata of the current session, if resolved
    pub fn metadata(&self) -> Option<&VideoMetadata> {
        match self {
            SessionState::MetadataReady { metadata, .. }
            | SessionState::Downloading { metadata, .. }
            | SessionState::Terminal { metadata, .. } => Some(metadata),
            SessionState::Idle | SessionState::Validating { .. } => None,
        }
    }

    /// Request of the current or finished download
    pub fn request(&self) -> Option<&DownloadRequest> {
        match self {
            SessionState::Downloading { request, .. } | SessionState::Terminal { request, .. } => {
                Some(request)
            }
            _ => None,
        }
    }

    /// Latest progress event (the final one once terminal)
    pub fn progress(&self) -> Option<&ProgressEvent> {
        match self {
            SessionState::Downloading { latest, .. } => Some(latest),
            SessionState::Terminal { last, .. } => Some(last),
            _ => None,
        }
    }

    /// Id of the open progress subscription
    pub fn stream_id(&self) -> Option<StreamId> {
        match self {
            SessionState::Downloading { stream, .. } => Some(stream.id()),
            _ => None,
        }
    }

    /// Close the progress subscription if this state owns one
    pub(crate) fn close_stream(&self) {
        if let SessionState::Downloading { stream, .. } = self {
            stream.close();
        }
    }
}
