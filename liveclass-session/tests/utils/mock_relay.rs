use async_trait::async_trait;
use liveclass_core::{IceCandidate, SessionDescription, SessionHandle};
use liveclass_session::{RelayError, SignalingRelay};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RelayState {
    offer: Option<SessionDescription>,
    answer: Option<SessionDescription>,
    candidates: Vec<IceCandidate>,
    published_offers: Vec<SessionDescription>,
    published_answers: Vec<SessionDescription>,
    published_candidates: Vec<IceCandidate>,
    joins: usize,
    leaves: usize,
    candidate_fetches: usize,
    failing_publishes: usize,
    fail_fetches: bool,
    fail_leave: bool,
    hang_join: bool,
    echo_candidates: bool,
}

/// In-memory relay.
///
/// Published offers and answers become what the next fetch returns, like
/// the real relay. Published candidates are only recorded; tests feed remote
/// candidates with [`MockRelay::push_candidate`].
#[derive(Clone, Default)]
pub struct MockRelay {
    inner: Arc<Mutex<RelayState>>,
}

impl MockRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Relay shared by two real sessions: published candidates become
    /// fetchable, so each side also sees its own.
    pub fn shared() -> Self {
        let relay = Self::default();
        relay.inner.lock().unwrap().echo_candidates = true;
        relay
    }

    pub fn set_offer(&self, offer: SessionDescription) {
        self.inner.lock().unwrap().offer = Some(offer);
    }

    pub fn set_answer(&self, answer: SessionDescription) {
        self.inner.lock().unwrap().answer = Some(answer);
    }

    pub fn push_candidate(&self, candidate: IceCandidate) {
        self.inner.lock().unwrap().candidates.push(candidate);
    }

    /// The next `n` offer/answer publishes fail.
    pub fn fail_next_publishes(&self, n: usize) {
        self.inner.lock().unwrap().failing_publishes = n;
    }

    pub fn set_fail_fetches(&self, fail: bool) {
        self.inner.lock().unwrap().fail_fetches = fail;
    }

    pub fn set_fail_leave(&self, fail: bool) {
        self.inner.lock().unwrap().fail_leave = fail;
    }

    /// `join` never completes.
    pub fn set_hang_join(&self, hang: bool) {
        self.inner.lock().unwrap().hang_join = hang;
    }

    pub fn published_offers(&self) -> Vec<SessionDescription> {
        self.inner.lock().unwrap().published_offers.clone()
    }

    pub fn published_answers(&self) -> Vec<SessionDescription> {
        self.inner.lock().unwrap().published_answers.clone()
    }

    pub fn published_candidates(&self) -> Vec<IceCandidate> {
        self.inner.lock().unwrap().published_candidates.clone()
    }

    pub fn joins(&self) -> usize {
        self.inner.lock().unwrap().joins
    }

    pub fn leaves(&self) -> usize {
        self.inner.lock().unwrap().leaves
    }

    pub fn candidate_fetches(&self) -> usize {
        self.inner.lock().unwrap().candidate_fetches
    }

    fn take_publish_failure(state: &mut RelayState) -> Result<(), RelayError> {
        if state.failing_publishes > 0 {
            state.failing_publishes -= 1;
            return Err(RelayError::Status {
                status: 503,
                body: "relay busy".into(),
            });
        }
        Ok(())
    }

    fn check_fetch(state: &RelayState) -> Result<(), RelayError> {
        if state.fail_fetches {
            return Err(RelayError::Network("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl SignalingRelay for MockRelay {
    async fn join(&self, _session: &SessionHandle) -> Result<(), RelayError> {
        let hang = {
            let mut state = self.inner.lock().unwrap();
            state.joins += 1;
            state.hang_join
        };
        if hang {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn publish_offer(
        &self,
        _session: &SessionHandle,
        offer: &SessionDescription,
    ) -> Result<(), RelayError> {
        let mut state = self.inner.lock().unwrap();
        Self::take_publish_failure(&mut state)?;
        state.published_offers.push(offer.clone());
        state.offer = Some(offer.clone());
        Ok(())
    }

    async fn fetch_offer(
        &self,
        _session: &SessionHandle,
    ) -> Result<Option<SessionDescription>, RelayError> {
        let state = self.inner.lock().unwrap();
        Self::check_fetch(&state)?;
        Ok(state.offer.clone())
    }

    async fn publish_answer(
        &self,
        _session: &SessionHandle,
        answer: &SessionDescription,
    ) -> Result<(), RelayError> {
        let mut state = self.inner.lock().unwrap();
        Self::take_publish_failure(&mut state)?;
        state.published_answers.push(answer.clone());
        state.answer = Some(answer.clone());
        Ok(())
    }

    async fn fetch_answer(
        &self,
        _session: &SessionHandle,
    ) -> Result<Option<SessionDescription>, RelayError> {
        let state = self.inner.lock().unwrap();
        Self::check_fetch(&state)?;
        Ok(state.answer.clone())
    }

    async fn publish_candidate(
        &self,
        _session: &SessionHandle,
        candidate: &IceCandidate,
    ) -> Result<(), RelayError> {
        let mut state = self.inner.lock().unwrap();
        state.published_candidates.push(candidate.clone());
        if state.echo_candidates {
            state.candidates.push(candidate.clone());
        }
        Ok(())
    }

    async fn fetch_candidates(
        &self,
        _session: &SessionHandle,
    ) -> Result<Vec<IceCandidate>, RelayError> {
        let mut state = self.inner.lock().unwrap();
        Self::check_fetch(&state)?;
        state.candidate_fetches += 1;
        Ok(state.candidates.clone())
    }

    async fn leave(&self, _session: &SessionHandle) -> Result<(), RelayError> {
        let mut state = self.inner.lock().unwrap();
        state.leaves += 1;
        if state.fail_leave {
            return Err(RelayError::Network("relay gone".into()));
        }
        Ok(())
    }
}
