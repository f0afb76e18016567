use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the two-party session on the signaling relay.
///
/// Supplied by the caller and never changed for the lifetime of a session.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq)]
#[serde(transparent)]
pub struct SessionHandle(String);

impl SessionHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionHandle {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for SessionHandle {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Side of the session this process plays.
///
/// The initiator creates the offer and the chat data channel; the responder
/// waits for the offer and receives the channel. On the wire the roles keep the
/// names the web client uses for chat senders.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq)]
pub enum Role {
    #[serde(rename = "Educator", alias = "initiator")]
    Initiator,
    #[serde(rename = "Student", alias = "responder")]
    Responder,
}

impl Role {
    pub fn creates_offer(self) -> bool {
        matches!(self, Role::Initiator)
    }

    pub fn creates_data_channel(self) -> bool {
        matches!(self, Role::Initiator)
    }

    /// Name shown next to chat messages.
    pub fn display_name(self) -> &'static str {
        match self {
            Role::Initiator => "Educator",
            Role::Responder => "Student",
        }
    }

    pub fn peer(self) -> Role {
        match self {
            Role::Initiator => Role::Responder,
            Role::Responder => Role::Initiator,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Initiator => f.write_str("initiator"),
            Role::Responder => f.write_str("responder"),
        }
    }
}
