use crate::config::SessionConfig;
use crate::error::Result;
use crate::media::LocalTrack;
use crate::session::SessionEvent;
use async_trait::async_trait;
use liveclass_core::{IceCandidate, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalingState {
    Stable,
    HaveLocalOffer,
    HaveRemoteOffer,
    HaveLocalPranswer,
    HaveRemotePranswer,
    Closed,
}

/// Builds the peer connection for a session. Every callback the connection
/// raises is pushed into `events` as a [`SessionEvent::Peer`].
#[async_trait]
pub trait PeerConnector: Send + Sync {
    async fn connect(
        &self,
        config: &SessionConfig,
        events: mpsc::Sender<SessionEvent>,
    ) -> Result<Arc<dyn PeerLink>>;
}

/// One peer connection.
#[async_trait]
pub trait PeerLink: Send + Sync {
    /// Adds `track` as a new outgoing sender.
    async fn add_track(&self, track: &LocalTrack) -> Result<()>;

    /// Points the existing video sender at `track` without renegotiating.
    async fn replace_video_track(&self, track: &LocalTrack) -> Result<()>;

    /// Opens an ordered data channel. Its open/close/message callbacks are
    /// reported the same way as for a channel the remote side opened.
    async fn create_chat_channel(&self, label: &str) -> Result<Arc<dyn ChatTransport>>;

    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()>;

    fn signaling_state(&self) -> SignalingState;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Message channel carried by the peer connection.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    fn label(&self) -> String;

    fn is_open(&self) -> bool;

    async fn send_text(&self, text: String) -> Result<()>;

    async fn close(&self) -> Result<()>;
}
