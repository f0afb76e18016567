use crate::media::RemoteTrackInfo;
use crate::peer::ChatTransport;
use bytes::Bytes;
use liveclass_core::IceCandidate;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IceConnectivity {
    New,
    Checking,
    Connected,
    Completed,
    Disconnected,
    Failed,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerConnectivity {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Callbacks from the peer connection, delivered to the session loop.
pub enum PeerEvent {
    IceConnectionState(IceConnectivity),
    ConnectionState(PeerConnectivity),
    LocalCandidate(IceCandidate),
    RemoteTrack(RemoteTrackInfo),
    /// The remote side opened a data channel.
    ChannelReceived(Arc<dyn ChatTransport>),
    ChannelOpened,
    ChannelClosed,
    ChannelError(String),
    ChannelMessage(Bytes),
}

impl fmt::Debug for PeerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerEvent::IceConnectionState(s) => f.debug_tuple("IceConnectionState").field(s).finish(),
            PeerEvent::ConnectionState(s) => f.debug_tuple("ConnectionState").field(s).finish(),
            PeerEvent::LocalCandidate(c) => f.debug_tuple("LocalCandidate").field(c).finish(),
            PeerEvent::RemoteTrack(t) => f.debug_tuple("RemoteTrack").field(t).finish(),
            PeerEvent::ChannelReceived(c) => {
                f.debug_tuple("ChannelReceived").field(&c.label()).finish()
            }
            PeerEvent::ChannelOpened => f.write_str("ChannelOpened"),
            PeerEvent::ChannelClosed => f.write_str("ChannelClosed"),
            PeerEvent::ChannelError(e) => f.debug_tuple("ChannelError").field(e).finish(),
            PeerEvent::ChannelMessage(b) => {
                f.debug_tuple("ChannelMessage").field(&b.len()).finish()
            }
        }
    }
}
