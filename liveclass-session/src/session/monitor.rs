use crate::peer::{IceConnectivity, PeerConnectivity};
use liveclass_core::{ConnectionStatus, Notice};
use tracing::debug;

/// Folds ICE and peer connection callbacks into one [`ConnectionStatus`].
///
/// Both callback sources report the same transitions, so repeats are
/// absorbed. The "connected" notice is raised only on the first connect;
/// later recoveries are silent. `Failed` is final for this attempt.
#[derive(Debug, Clone, Default)]
pub struct LifecycleMonitor {
    status: ConnectionStatus,
    connected_once: bool,
}

/// What one observed transition changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusChange {
    pub status: Option<ConnectionStatus>,
    pub notice: Option<Notice>,
}

impl LifecycleMonitor {
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn connected_once(&self) -> bool {
        self.connected_once
    }

    pub fn map_ice(state: IceConnectivity) -> Option<ConnectionStatus> {
        match state {
            IceConnectivity::Checking => Some(ConnectionStatus::Connecting),
            IceConnectivity::Connected | IceConnectivity::Completed => {
                Some(ConnectionStatus::Connected)
            }
            IceConnectivity::Disconnected => Some(ConnectionStatus::Disconnected),
            IceConnectivity::Failed => Some(ConnectionStatus::Failed),
            IceConnectivity::New | IceConnectivity::Closed => None,
        }
    }

    pub fn map_peer(state: PeerConnectivity) -> Option<ConnectionStatus> {
        match state {
            PeerConnectivity::Connecting => Some(ConnectionStatus::Connecting),
            PeerConnectivity::Connected => Some(ConnectionStatus::Connected),
            PeerConnectivity::Disconnected => Some(ConnectionStatus::Disconnected),
            PeerConnectivity::Failed => Some(ConnectionStatus::Failed),
            PeerConnectivity::New | PeerConnectivity::Closed => None,
        }
    }

    pub fn observe(&mut self, next: ConnectionStatus) -> StatusChange {
        if self.status == ConnectionStatus::Failed || self.status == next {
            return StatusChange::default();
        }
        // Re-checking after a drop keeps the drop visible until connected again.
        if next == ConnectionStatus::Connecting && self.connected_once {
            return StatusChange::default();
        }

        debug!("Connection status {} -> {}", self.status, next);
        self.status = next;

        let notice = match next {
            ConnectionStatus::Connected if !self.connected_once => {
                self.connected_once = true;
                Some(Notice::Connected)
            }
            ConnectionStatus::Disconnected => Some(Notice::ConnectionLost),
            ConnectionStatus::Failed => Some(Notice::ConnectionFailed),
            _ => None,
        };

        StatusChange {
            status: Some(next),
            notice,
        }
    }

    /// Forces `Failed`, for setup errors and timeouts that never passed
    /// through the connection callbacks.
    pub fn fail(&mut self) -> bool {
        if self.status == ConnectionStatus::Failed {
            return false;
        }
        self.status = ConnectionStatus::Failed;
        true
    }
}
