use async_trait::async_trait;
use liveclass_core::{IceCandidate, SdpKind, SessionDescription};
use liveclass_session::{
    ChatTransport, Error, LocalTrack, PeerConnector, PeerEvent, PeerLink, Result, SessionConfig,
    SessionEvent, SignalingState, TrackKind,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Hands out [`FakePeer`]s and keeps the last one for inspection.
#[derive(Clone, Default)]
pub struct FakeConnector {
    peer: Arc<Mutex<Option<Arc<FakePeer>>>>,
    fail: bool,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn peer(&self) -> Option<Arc<FakePeer>> {
        self.peer.lock().unwrap().clone()
    }

    pub async fn wait_for_peer(&self, timeout_ms: u64) -> Option<Arc<FakePeer>> {
        let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            if let Some(peer) = self.peer() {
                return Some(peer);
            }
            if tokio::time::Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

#[async_trait]
impl PeerConnector for FakeConnector {
    async fn connect(
        &self,
        _config: &SessionConfig,
        events: mpsc::Sender<SessionEvent>,
    ) -> Result<Arc<dyn PeerLink>> {
        if self.fail {
            return Err(Error::PeerConnection("no network".into()));
        }
        let peer = Arc::new(FakePeer::new(events));
        *self.peer.lock().unwrap() = Some(peer.clone());
        Ok(peer as Arc<dyn PeerLink>)
    }
}

#[derive(Debug, Clone)]
pub struct FakeSender {
    pub kind: TrackKind,
    pub track_id: String,
}

struct PeerState {
    signaling: SignalingState,
    local: Option<SessionDescription>,
    remote: Option<SessionDescription>,
    senders: Vec<FakeSender>,
    applied_candidates: Vec<IceCandidate>,
    offers_created: usize,
    answers_created: usize,
    remote_sets: usize,
    fail_replace: bool,
    chat: Option<Arc<FakeChatTransport>>,
}

/// Peer connection with the browser's offer/answer state machine and no
/// network underneath.
pub struct FakePeer {
    events: mpsc::Sender<SessionEvent>,
    state: Mutex<PeerState>,
    closed: AtomicBool,
}

impl FakePeer {
    fn new(events: mpsc::Sender<SessionEvent>) -> Self {
        Self {
            events,
            state: Mutex::new(PeerState {
                signaling: SignalingState::Stable,
                local: None,
                remote: None,
                senders: Vec::new(),
                applied_candidates: Vec::new(),
                offers_created: 0,
                answers_created: 0,
                remote_sets: 0,
                fail_replace: false,
                chat: None,
            }),
            closed: AtomicBool::new(false),
        }
    }

    /// Delivers a callback as the native connection would.
    pub async fn emit(&self, event: PeerEvent) {
        let _ = self.events.send(SessionEvent::Peer(event)).await;
    }

    /// Simulates the remote side opening the chat channel.
    pub async fn open_remote_channel(&self) -> Arc<FakeChatTransport> {
        let transport = FakeChatTransport::new(true);
        self.emit(PeerEvent::ChannelReceived(transport.clone())).await;
        transport
    }

    pub fn video_senders(&self) -> Vec<FakeSender> {
        self.state
            .lock()
            .unwrap()
            .senders
            .iter()
            .filter(|s| s.kind == TrackKind::Video)
            .cloned()
            .collect()
    }

    pub fn sender_count(&self) -> usize {
        self.state.lock().unwrap().senders.len()
    }

    pub fn outgoing_video_id(&self) -> Option<String> {
        self.video_senders().first().map(|s| s.track_id.clone())
    }

    pub fn applied_candidates(&self) -> Vec<IceCandidate> {
        self.state.lock().unwrap().applied_candidates.clone()
    }

    pub fn offers_created(&self) -> usize {
        self.state.lock().unwrap().offers_created
    }

    pub fn answers_created(&self) -> usize {
        self.state.lock().unwrap().answers_created
    }

    pub fn remote_sets(&self) -> usize {
        self.state.lock().unwrap().remote_sets
    }

    pub fn local_description(&self) -> Option<SessionDescription> {
        self.state.lock().unwrap().local.clone()
    }

    pub fn current_signaling(&self) -> SignalingState {
        self.state.lock().unwrap().signaling
    }

    pub fn chat(&self) -> Option<Arc<FakeChatTransport>> {
        self.state.lock().unwrap().chat.clone()
    }

    pub fn set_fail_replace(&self, fail: bool) {
        self.state.lock().unwrap().fail_replace = fail;
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PeerLink for FakePeer {
    async fn add_track(&self, track: &LocalTrack) -> Result<()> {
        self.state.lock().unwrap().senders.push(FakeSender {
            kind: track.kind(),
            track_id: track.id().to_owned(),
        });
        Ok(())
    }

    async fn replace_video_track(&self, track: &LocalTrack) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_replace {
            return Err(Error::MediaTrack("replace refused".into()));
        }
        let sender = state
            .senders
            .iter_mut()
            .find(|s| s.kind == TrackKind::Video)
            .ok_or_else(|| Error::MediaTrack("no outgoing video sender".into()))?;
        sender.track_id = track.id().to_owned();
        Ok(())
    }

    async fn create_chat_channel(&self, _label: &str) -> Result<Arc<dyn ChatTransport>> {
        let transport = FakeChatTransport::new(false);
        self.state.lock().unwrap().chat = Some(transport.clone());
        Ok(transport as Arc<dyn ChatTransport>)
    }

    async fn create_offer(&self) -> Result<SessionDescription> {
        let mut state = self.state.lock().unwrap();
        state.offers_created += 1;
        Ok(SessionDescription::offer(format!(
            "v=0 fake-offer-{}",
            state.offers_created
        )))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let mut state = self.state.lock().unwrap();
        if state.signaling != SignalingState::HaveRemoteOffer {
            return Err(Error::Sdp("no remote offer".into()));
        }
        state.answers_created += 1;
        Ok(SessionDescription::answer(format!(
            "v=0 fake-answer-{}",
            state.answers_created
        )))
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.signaling = match (desc.kind, state.signaling) {
            (SdpKind::Offer, SignalingState::Stable) => SignalingState::HaveLocalOffer,
            (SdpKind::Answer, SignalingState::HaveRemoteOffer) => SignalingState::Stable,
            (kind, current) => {
                return Err(Error::Sdp(format!("local {kind} in {current:?}")));
            }
        };
        state.local = Some(desc);
        Ok(())
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.signaling = match (desc.kind, state.signaling) {
            (SdpKind::Offer, SignalingState::Stable) => SignalingState::HaveRemoteOffer,
            (SdpKind::Answer, SignalingState::HaveLocalOffer) => SignalingState::Stable,
            (kind, current) => {
                return Err(Error::Sdp(format!("remote {kind} in {current:?}")));
            }
        };
        state.remote = Some(desc);
        state.remote_sets += 1;
        Ok(())
    }

    fn signaling_state(&self) -> SignalingState {
        self.state.lock().unwrap().signaling
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.remote.is_none() {
            return Err(Error::IceCandidate("remote description not set".into()));
        }
        state.applied_candidates.push(candidate);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.signaling = SignalingState::Closed;
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Chat transport that records what was sent.
pub struct FakeChatTransport {
    open: AtomicBool,
    fail_sends: AtomicBool,
    closes: AtomicUsize,
    sent: Mutex<Vec<String>>,
}

impl FakeChatTransport {
    pub fn new(open: bool) -> Arc<Self> {
        Arc::new(Self {
            open: AtomicBool::new(open),
            fail_sends: AtomicBool::new(false),
            closes: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn set_open(&self, open: bool) {
        self.open.store(open, Ordering::SeqCst);
    }

    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatTransport for FakeChatTransport {
    fn label(&self) -> String {
        "chat".into()
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn send_text(&self, text: String) -> Result<()> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(Error::DataChannel("send buffer full".into()));
        }
        self.sent.lock().unwrap().push(text);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.open.store(false, Ordering::SeqCst);
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
