use crate::error::RelayError;
use async_trait::async_trait;
use liveclass_core::{IceCandidate, SessionDescription, SessionHandle};

/// Rendezvous point both peers reach over plain request/response calls.
///
/// Fetch calls return whatever the relay currently holds; repeated fetches
/// may return the same payload again, so callers must deduplicate.
#[async_trait]
pub trait SignalingRelay: Send + Sync {
    async fn join(&self, session: &SessionHandle) -> Result<(), RelayError>;

    async fn publish_offer(
        &self,
        session: &SessionHandle,
        offer: &SessionDescription,
    ) -> Result<(), RelayError>;

    async fn fetch_offer(
        &self,
        session: &SessionHandle,
    ) -> Result<Option<SessionDescription>, RelayError>;

    async fn publish_answer(
        &self,
        session: &SessionHandle,
        answer: &SessionDescription,
    ) -> Result<(), RelayError>;

    async fn fetch_answer(
        &self,
        session: &SessionHandle,
    ) -> Result<Option<SessionDescription>, RelayError>;

    async fn publish_candidate(
        &self,
        session: &SessionHandle,
        candidate: &IceCandidate,
    ) -> Result<(), RelayError>;

    async fn fetch_candidates(&self, session: &SessionHandle)
    -> Result<Vec<IceCandidate>, RelayError>;

    async fn leave(&self, session: &SessionHandle) -> Result<(), RelayError>;
}
