use crate::peer::ChatTransport;
use liveclass_core::{ChatMessage, Role};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("message is empty")]
    Empty,

    #[error("chat channel is not open")]
    NotConnected,

    #[error("chat send failed: {0}")]
    Transport(String),
}

/// Chat history plus the data channel it travels over.
///
/// Outgoing messages join the history only once the transport accepted
/// them; incoming ones as soon as they parse.
pub struct ChatChannel {
    local_role: Role,
    transport: Option<Arc<dyn ChatTransport>>,
    messages: Vec<ChatMessage>,
}

impl ChatChannel {
    pub fn new(local_role: Role) -> Self {
        Self {
            local_role,
            transport: None,
            messages: Vec::new(),
        }
    }

    pub fn attach(&mut self, transport: Arc<dyn ChatTransport>) {
        debug!("Chat attached to channel '{}'", transport.label());
        self.transport = Some(transport);
    }

    pub fn is_open(&self) -> bool {
        self.transport.as_ref().is_some_and(|t| t.is_open())
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub async fn send(&mut self, text: &str) -> Result<ChatMessage, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::Empty);
        }
        let transport = match &self.transport {
            Some(t) if t.is_open() => t.clone(),
            _ => return Err(ChatError::NotConnected),
        };

        let message = ChatMessage::new(text, self.local_role);
        let payload = message
            .to_json()
            .map_err(|e| ChatError::Transport(e.to_string()))?;
        transport
            .send_text(payload)
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        self.messages.push(message.clone());
        Ok(message)
    }

    /// Appends an inbound payload. Malformed payloads are dropped.
    pub fn receive(&mut self, raw: &[u8]) -> Option<&ChatMessage> {
        match ChatMessage::from_json(raw) {
            Ok(message) => {
                self.messages.push(message);
                self.messages.last()
            }
            Err(e) => {
                warn!("Dropping malformed chat payload ({} bytes): {}", raw.len(), e);
                None
            }
        }
    }

    /// Closes and forgets the transport. History is kept.
    pub async fn close(&mut self) {
        if let Some(transport) = self.transport.take() {
            if let Err(e) = transport.close().await {
                debug!("Closing chat channel failed: {}", e);
            }
        }
    }
}
