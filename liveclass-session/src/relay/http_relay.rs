use crate::error::RelayError;
use crate::relay::SignalingRelay;
use async_trait::async_trait;
use liveclass_core::{
    AnswerEnvelope, CandidateEnvelope, CandidatesEnvelope, IceCandidate, OfferEnvelope,
    SessionDescription, SessionHandle,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Relay client for the `/api/liveclass/{session}/...` HTTP endpoints.
///
/// The client keeps a cookie store so an authenticated relay sees the same
/// credentials on every call.
#[derive(Clone)]
pub struct HttpRelay {
    http: reqwest::Client,
    base_url: String,
}

impl HttpRelay {
    pub fn new(base_url: impl Into<String>) -> Result<Self, RelayError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| RelayError::Network(e.to_string()))?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, session: &SessionHandle, path: &str) -> String {
        format!("{}/api/liveclass/{}/{}", self.base_url, session.as_str(), path)
    }

    async fn post<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<(), RelayError> {
        debug!("POST {}", url);
        let resp = self.http.post(url).json(body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RelayError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, RelayError> {
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(RelayError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        // An empty body means nothing has been published yet.
        if text.trim().is_empty() {
            return serde_json::from_str("{}").map_err(|e| RelayError::Decode(e.to_string()));
        }
        serde_json::from_str(&text).map_err(|e| RelayError::Decode(e.to_string()))
    }
}

#[async_trait]
impl SignalingRelay for HttpRelay {
    async fn join(&self, session: &SessionHandle) -> Result<(), RelayError> {
        self.post(&self.endpoint(session, "join"), &serde_json::json!({}))
            .await
    }

    async fn publish_offer(
        &self,
        session: &SessionHandle,
        offer: &SessionDescription,
    ) -> Result<(), RelayError> {
        let body = OfferEnvelope {
            offer: Some(offer.clone()),
        };
        self.post(&self.endpoint(session, "offer"), &body).await
    }

    async fn fetch_offer(
        &self,
        session: &SessionHandle,
    ) -> Result<Option<SessionDescription>, RelayError> {
        let env: OfferEnvelope = self.get(&self.endpoint(session, "offer")).await?;
        Ok(env.offer)
    }

    async fn publish_answer(
        &self,
        session: &SessionHandle,
        answer: &SessionDescription,
    ) -> Result<(), RelayError> {
        let body = AnswerEnvelope {
            answer: Some(answer.clone()),
        };
        self.post(&self.endpoint(session, "answer"), &body).await
    }

    async fn fetch_answer(
        &self,
        session: &SessionHandle,
    ) -> Result<Option<SessionDescription>, RelayError> {
        let env: AnswerEnvelope = self.get(&self.endpoint(session, "answer")).await?;
        Ok(env.answer)
    }

    async fn publish_candidate(
        &self,
        session: &SessionHandle,
        candidate: &IceCandidate,
    ) -> Result<(), RelayError> {
        let body = CandidateEnvelope {
            candidate: candidate.clone(),
        };
        self.post(&self.endpoint(session, "ice-candidate"), &body)
            .await
    }

    async fn fetch_candidates(
        &self,
        session: &SessionHandle,
    ) -> Result<Vec<IceCandidate>, RelayError> {
        let env: CandidatesEnvelope = self.get(&self.endpoint(session, "ice-candidates")).await?;
        Ok(env.candidates)
    }

    async fn leave(&self, session: &SessionHandle) -> Result<(), RelayError> {
        self.post(&self.endpoint(session, "leave"), &serde_json::json!({}))
            .await
    }
}
