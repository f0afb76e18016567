mod chat;
mod notice;
mod relay;
mod session;
mod signaling;
mod status;

pub use chat::ChatMessage;
pub use notice::{Notice, NoticeLevel};
pub use relay::{AnswerEnvelope, CandidateEnvelope, CandidatesEnvelope, OfferEnvelope};
pub use session::{Role, SessionHandle};
pub use signaling::{IceCandidate, IceServerConfig, SdpKind, SessionDescription};
pub use status::ConnectionStatus;
