use crate::error::Result;
use crate::session::ChatError;
use liveclass_core::ChatMessage;
use tokio::sync::oneshot;

/// Requests sent to the session loop by a [`crate::SessionController`].
#[derive(Debug)]
pub enum SessionCommand {
    /// Replies with the new camera state.
    ToggleVideo { reply: oneshot::Sender<bool> },

    /// Replies with the new microphone state.
    ToggleAudio { reply: oneshot::Sender<bool> },

    /// Replies with whether a screen share is active afterwards.
    ToggleScreenShare { reply: oneshot::Sender<Result<bool>> },

    SendChat {
        text: String,
        reply: oneshot::Sender<std::result::Result<ChatMessage, ChatError>>,
    },

    Close { reply: oneshot::Sender<()> },
}
