use crate::media::MediaTrackController;
use crate::peer::PeerLink;
use crate::relay::{PollHandle, SignalingRelay};
use crate::session::{ChatChannel, NegotiationEngine, SessionState, Transition};
use liveclass_core::SessionHandle;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Everything teardown releases, borrowed from the session.
pub struct TeardownScope<'a> {
    pub state: &'a mut SessionState,
    pub engine: &'a mut NegotiationEngine,
    pub media: &'a mut MediaTrackController,
    pub chat: &'a mut ChatChannel,
    pub peer: Option<Arc<dyn PeerLink>>,
}

/// Releases a session's resources exactly once.
///
/// Owns the session's root cancellation token; poll loops and background
/// publishes run under child tokens and stop when it is cancelled.
pub struct TeardownCoordinator {
    session: SessionHandle,
    relay: Arc<dyn SignalingRelay>,
    root: CancellationToken,
    polls: Vec<PollHandle>,
    leave_timeout: Duration,
    completed: bool,
}

impl TeardownCoordinator {
    pub fn new(
        session: SessionHandle,
        relay: Arc<dyn SignalingRelay>,
        root: CancellationToken,
        leave_timeout: Duration,
    ) -> Self {
        Self {
            session,
            relay,
            root,
            polls: Vec::new(),
            leave_timeout,
            completed: false,
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.root
    }

    pub fn register_poll(&mut self, handle: PollHandle) {
        if self.completed || self.root.is_cancelled() {
            handle.cancel();
        }
        self.polls.push(handle);
    }

    pub fn active_polls(&self) -> usize {
        self.polls.iter().filter(|p| !p.is_cancelled()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// Runs every step even if an earlier one fails. Returns false if
    /// teardown had already run.
    pub async fn cleanup(&mut self, scope: TeardownScope<'_>) -> bool {
        if self.completed {
            debug!("Teardown already ran for session {}", self.session);
            return false;
        }
        self.completed = true;
        info!("Tearing down session {}", self.session);

        let active = self.active_polls();
        self.root.cancel();
        for poll in &self.polls {
            poll.cancel();
        }
        debug!("Cancelled {} active poll loop(s)", active);

        scope.media.stop_all();
        scope.state.apply(Transition::Closed);
        scope.chat.close().await;

        if let Some(peer) = scope.peer {
            if let Err(e) = peer.close().await {
                warn!("Closing peer connection failed: {}", e);
            }
        }
        scope.engine.clear();

        match tokio::time::timeout(self.leave_timeout, self.relay.leave(&self.session)).await {
            Ok(Ok(())) => debug!("Left session {}", self.session),
            Ok(Err(e)) => debug!("Leave failed, ignoring: {}", e),
            Err(_) => debug!("Leave timed out, ignoring"),
        }
        true
    }
}
