use crate::error::RelayError;
use crate::relay::SignalingRelay;
use crate::session::SessionEvent;
use liveclass_core::{IceCandidate, SessionDescription, SessionHandle};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollKind {
    Offer,
    Answer,
    Candidates,
}

impl PollKind {
    pub const ALL: [PollKind; 3] = [PollKind::Offer, PollKind::Answer, PollKind::Candidates];
}

impl fmt::Display for PollKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollKind::Offer => f.write_str("offer"),
            PollKind::Answer => f.write_str("answer"),
            PollKind::Candidates => f.write_str("candidates"),
        }
    }
}

/// Result of one poll tick. Empty results are forwarded too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Polled {
    Offer(Option<SessionDescription>),
    Answer(Option<SessionDescription>),
    Candidates(Vec<IceCandidate>),
}

impl Polled {
    pub fn kind(&self) -> PollKind {
        match self {
            Polled::Offer(_) => PollKind::Offer,
            Polled::Answer(_) => PollKind::Answer,
            Polled::Candidates(_) => PollKind::Candidates,
        }
    }
}

/// Running polling loop. Dropping the handle does not stop the loop; call
/// [`PollHandle::cancel`] or cancel the parent token.
pub struct PollHandle {
    kind: PollKind,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn kind(&self) -> PollKind {
        self.kind
    }

    pub fn cancel(&self) {
        self.token.cancel();
        self.task.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawns the relay polling loops for one session.
///
/// Every loop runs under a child of `parent`, so cancelling the parent stops
/// all of them. A loop never forwards a result once its token is cancelled.
pub struct Poller {
    relay: Arc<dyn SignalingRelay>,
    session: SessionHandle,
    interval: Duration,
    events: mpsc::Sender<SessionEvent>,
    parent: CancellationToken,
}

impl Poller {
    pub fn new(
        relay: Arc<dyn SignalingRelay>,
        session: SessionHandle,
        interval: Duration,
        events: mpsc::Sender<SessionEvent>,
        parent: CancellationToken,
    ) -> Self {
        Self {
            relay,
            session,
            interval,
            events,
            parent,
        }
    }

    pub fn spawn(&self, kind: PollKind) -> PollHandle {
        let token = self.parent.child_token();
        let relay = self.relay.clone();
        let session = self.session.clone();
        let events = self.events.clone();
        let interval = self.interval;
        let loop_token = token.clone();

        let task = tokio::spawn(async move {
            debug!("{} poll started for session {}", kind, session);
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = loop_token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let result = tokio::select! {
                    _ = loop_token.cancelled() => break,
                    r = fetch(relay.as_ref(), &session, kind) => r,
                };

                match result {
                    Ok(polled) => {
                        if loop_token.is_cancelled() {
                            break;
                        }
                        if events.send(SessionEvent::Polled(polled)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) if e.is_transient() => {
                        debug!("{} poll for {} failed, retrying: {}", kind, session, e);
                    }
                    Err(e) => warn!("{} poll for {} failed: {}", kind, session, e),
                }
            }
            debug!("{} poll stopped for session {}", kind, session);
        });

        PollHandle { kind, token, task }
    }

    pub fn spawn_all(&self) -> Vec<PollHandle> {
        PollKind::ALL.iter().map(|kind| self.spawn(*kind)).collect()
    }
}

async fn fetch(
    relay: &dyn SignalingRelay,
    session: &SessionHandle,
    kind: PollKind,
) -> Result<Polled, RelayError> {
    match kind {
        PollKind::Offer => relay.fetch_offer(session).await.map(Polled::Offer),
        PollKind::Answer => relay.fetch_answer(session).await.map(Polled::Answer),
        PollKind::Candidates => relay.fetch_candidates(session).await.map(Polled::Candidates),
    }
}
