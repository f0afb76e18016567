use crate::session::ChatError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Why a camera, microphone or display capture request was refused.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CaptureError {
    #[error("capture permission denied")]
    PermissionDenied,

    #[error("no capture device found")]
    DeviceNotFound,

    #[error("capture failed: {0}")]
    Other(String),
}

/// Failure talking to the signaling relay.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("relay request failed: {0}")]
    Network(String),

    #[error("relay returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("relay response could not be decoded: {0}")]
    Decode(String),
}

impl RelayError {
    /// Whether the next poll tick is worth trying again.
    pub fn is_transient(&self) -> bool {
        match self {
            RelayError::Network(_) => true,
            RelayError::Status { status, .. } => *status >= 500 || *status == 429,
            RelayError::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RelayError::Decode(err.to_string())
        } else {
            RelayError::Network(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error("peer connection error: {0}")]
    PeerConnection(String),

    #[error("SDP error: {0}")]
    Sdp(String),

    #[error("ICE candidate error: {0}")]
    IceCandidate(String),

    #[error("data channel error: {0}")]
    DataChannel(String),

    #[error("media track error: {0}")]
    MediaTrack(String),

    #[error("invalid session state: {0}")]
    InvalidState(String),

    #[error("session is closed")]
    SessionClosed,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("WebRTC error: {0}")]
    WebRtc(#[from] webrtc::Error),
}

impl Error {
    pub fn capture(&self) -> Option<&CaptureError> {
        match self {
            Error::Capture(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Error::Capture(CaptureError::PermissionDenied))
    }
}
