use crate::error::{Error, Result};
use crate::peer::{PeerLink, SignalingState};
use crate::relay::{PollKind, SignalingRelay};
use liveclass_core::{IceCandidate, Role, SdpKind, SessionDescription, SessionHandle};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What happened to one payload handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Applied,
    /// Already seen; nothing done.
    Duplicate,
    /// Not acceptable in the current signaling state or role.
    Dropped,
    /// Candidate held until the remote description is set.
    Buffered,
    /// Accepted but the peer connection refused it.
    Failed,
}

#[derive(Debug, Default)]
struct SeenPayloads {
    descriptions: HashSet<u64>,
    candidates: HashSet<String>,
}

/// Offer/answer exchange for one side of the session.
///
/// Payloads come from relay polls that may repeat them, so each one is
/// recorded before it is applied and applied at most once. Our own published
/// descriptions and candidates are recorded too, in case the relay echoes
/// them back.
pub struct NegotiationEngine {
    role: Role,
    session: SessionHandle,
    relay: Arc<dyn SignalingRelay>,
    peer: Option<Arc<dyn PeerLink>>,
    seen: SeenPayloads,
    pending_candidates: Vec<IceCandidate>,
    remote_applied: bool,
    unpublished: Option<SessionDescription>,
}

impl NegotiationEngine {
    pub fn new(role: Role, session: SessionHandle, relay: Arc<dyn SignalingRelay>) -> Self {
        Self {
            role,
            session,
            relay,
            peer: None,
            seen: SeenPayloads::default(),
            pending_candidates: Vec::new(),
            remote_applied: false,
            unpublished: None,
        }
    }

    pub fn is_started(&self) -> bool {
        self.peer.is_some()
    }

    pub fn remote_applied(&self) -> bool {
        self.remote_applied
    }

    pub fn pending_candidates(&self) -> usize {
        self.pending_candidates.len()
    }

    pub fn has_unpublished(&self) -> bool {
        self.unpublished.is_some()
    }

    /// Starts the exchange. The initiator creates, applies and publishes its
    /// offer; the responder waits for one.
    pub async fn begin(&mut self, peer: Arc<dyn PeerLink>) -> Result<()> {
        if self.peer.is_some() {
            return Err(Error::InvalidState("negotiation already started".to_owned()));
        }
        self.peer = Some(peer.clone());

        if self.role.creates_offer() {
            let offer = peer.create_offer().await?;
            peer.set_local_description(offer.clone()).await?;
            self.seen.descriptions.insert(offer.fingerprint());
            info!("Offer created for session {}", self.session);
            self.publish(offer).await;
        } else {
            info!("Waiting for an offer in session {}", self.session);
        }
        Ok(())
    }

    pub async fn on_remote_offer(&mut self, offer: SessionDescription) -> Delivery {
        let Some(peer) = self.peer.clone() else {
            return Delivery::Dropped;
        };
        let fingerprint = offer.fingerprint();
        if self.seen.descriptions.contains(&fingerprint) {
            return Delivery::Duplicate;
        }
        if self.role.creates_offer() || offer.kind != SdpKind::Offer {
            debug!("Ignoring offer as {}", self.role);
            return Delivery::Dropped;
        }
        let state = peer.signaling_state();
        if state != SignalingState::Stable {
            debug!("Ignoring offer in signaling state {:?}", state);
            return Delivery::Dropped;
        }
        self.seen.descriptions.insert(fingerprint);

        if let Err(e) = peer.set_remote_description(offer).await {
            warn!("Failed to apply remote offer: {}", e);
            return Delivery::Failed;
        }
        self.remote_applied = true;
        self.flush_candidates(peer.as_ref()).await;

        let answer = match peer.create_answer().await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Failed to create answer: {}", e);
                return Delivery::Failed;
            }
        };
        if let Err(e) = peer.set_local_description(answer.clone()).await {
            warn!("Failed to apply local answer: {}", e);
            return Delivery::Failed;
        }
        self.seen.descriptions.insert(answer.fingerprint());
        info!("Answer created for session {}", self.session);
        self.publish(answer).await;
        Delivery::Applied
    }

    pub async fn on_remote_answer(&mut self, answer: SessionDescription) -> Delivery {
        let Some(peer) = self.peer.clone() else {
            return Delivery::Dropped;
        };
        let fingerprint = answer.fingerprint();
        if self.seen.descriptions.contains(&fingerprint) {
            return Delivery::Duplicate;
        }
        if !self.role.creates_offer() || answer.kind != SdpKind::Answer {
            debug!("Ignoring answer as {}", self.role);
            return Delivery::Dropped;
        }
        let state = peer.signaling_state();
        if state != SignalingState::HaveLocalOffer {
            debug!("Ignoring answer in signaling state {:?}", state);
            return Delivery::Dropped;
        }
        self.seen.descriptions.insert(fingerprint);

        if let Err(e) = peer.set_remote_description(answer).await {
            warn!("Failed to apply remote answer: {}", e);
            return Delivery::Failed;
        }
        info!("Answer applied for session {}", self.session);
        self.remote_applied = true;
        self.flush_candidates(peer.as_ref()).await;
        Delivery::Applied
    }

    pub async fn on_remote_candidate(&mut self, candidate: IceCandidate) -> Delivery {
        if !self.seen.candidates.insert(candidate.dedup_key()) {
            return Delivery::Duplicate;
        }
        let peer = match &self.peer {
            Some(peer) if self.remote_applied => peer.clone(),
            _ => {
                self.pending_candidates.push(candidate);
                return Delivery::Buffered;
            }
        };
        match peer.add_ice_candidate(candidate).await {
            Ok(()) => Delivery::Applied,
            Err(e) => {
                warn!("Failed to add remote candidate: {}", e);
                Delivery::Failed
            }
        }
    }

    /// Records a candidate we gathered so an echo from the relay is ignored.
    pub fn note_local_candidate(&mut self, candidate: &IceCandidate) {
        self.seen.candidates.insert(candidate.dedup_key());
    }

    /// Re-publishes a description whose publish failed, on a tick of the
    /// loop that carries its kind.
    pub async fn retry_publish(&mut self, tick: PollKind) {
        let matches = match &self.unpublished {
            Some(desc) => match desc.kind {
                SdpKind::Offer => tick == PollKind::Offer,
                SdpKind::Answer => tick == PollKind::Answer,
            },
            None => false,
        };
        if !matches {
            return;
        }
        if let Some(desc) = self.unpublished.take() {
            debug!("Retrying {} publish", desc.kind);
            self.publish(desc).await;
        }
    }

    /// Forgets every payload and the peer. Used at teardown.
    pub fn clear(&mut self) {
        self.peer = None;
        self.seen = SeenPayloads::default();
        self.pending_candidates.clear();
        self.remote_applied = false;
        self.unpublished = None;
    }

    async fn publish(&mut self, desc: SessionDescription) {
        let res = match desc.kind {
            SdpKind::Offer => self.relay.publish_offer(&self.session, &desc).await,
            SdpKind::Answer => self.relay.publish_answer(&self.session, &desc).await,
        };
        match res {
            Ok(()) => self.unpublished = None,
            Err(e) => {
                warn!("Publishing {} failed, will retry: {}", desc.kind, e);
                self.unpublished = Some(desc);
            }
        }
    }

    async fn flush_candidates(&mut self, peer: &dyn PeerLink) {
        if self.pending_candidates.is_empty() {
            return;
        }
        debug!("Applying {} buffered candidate(s)", self.pending_candidates.len());
        for candidate in std::mem::take(&mut self.pending_candidates) {
            if let Err(e) = peer.add_ice_candidate(candidate).await {
                warn!("Failed to add buffered candidate: {}", e);
            }
        }
    }
}
