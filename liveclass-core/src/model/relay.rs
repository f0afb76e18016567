//! JSON bodies exchanged with the signaling relay.
//!
//! Fetch responses may carry `null` or omit the field entirely when the other
//! side has not published yet; both decode to an empty envelope.

use crate::model::signaling::{IceCandidate, SessionDescription};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OfferEnvelope {
    #[serde(default)]
    pub offer: Option<SessionDescription>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerEnvelope {
    #[serde(default)]
    pub answer: Option<SessionDescription>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CandidateEnvelope {
    pub candidate: IceCandidate,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CandidatesEnvelope {
    #[serde(default)]
    pub candidates: Vec<IceCandidate>,
}
