use crate::error::{Error, Result};
use crate::session::{SessionCommand, SessionPhase, SessionSnapshot};
use liveclass_core::{ChatMessage, ConnectionStatus, Notice, Role, SessionHandle};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

/// Handle to a running [`crate::LiveSession`].
///
/// Cheap to clone. The session is disposed once every clone is dropped.
#[derive(Clone)]
pub struct SessionController {
    handle: SessionHandle,
    role: Role,
    commands: mpsc::Sender<SessionCommand>,
    snapshot: watch::Receiver<SessionSnapshot>,
    cancel: CancellationToken,
}

impl SessionController {
    pub(crate) fn new(
        handle: SessionHandle,
        role: Role,
        commands: mpsc::Sender<SessionCommand>,
        snapshot: watch::Receiver<SessionSnapshot>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            handle,
            role,
            commands,
            snapshot,
            cancel,
        }
    }

    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.snapshot.borrow().status
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    pub async fn toggle_video(&self) -> Result<bool> {
        self.request(|reply| SessionCommand::ToggleVideo { reply })
            .await
    }

    pub async fn toggle_audio(&self) -> Result<bool> {
        self.request(|reply| SessionCommand::ToggleAudio { reply })
            .await
    }

    /// Returns whether a screen share is active afterwards.
    pub async fn toggle_screen_share(&self) -> Result<bool> {
        self.request(|reply| SessionCommand::ToggleScreenShare { reply })
            .await?
    }

    pub async fn send_chat(&self, text: impl Into<String>) -> Result<ChatMessage> {
        let text = text.into();
        let res = self
            .request(|reply| SessionCommand::SendChat { text, reply })
            .await?;
        res.map_err(Error::from)
    }

    /// Tears the session down, interrupting any setup still in flight.
    /// Closing an already closed session is a no-op.
    pub async fn close(&self) -> Result<()> {
        self.cancel.cancel();
        match self.request(|reply| SessionCommand::Close { reply }).await {
            Ok(()) | Err(Error::SessionClosed) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Waits until the snapshot satisfies `pred`, up to `timeout`.
    pub async fn wait_for<F>(&self, timeout: Duration, mut pred: F) -> bool
    where
        F: FnMut(&SessionSnapshot) -> bool,
    {
        let mut rx = self.snapshot.clone();
        let wait = async {
            loop {
                if pred(&rx.borrow_and_update()) {
                    return true;
                }
                if rx.changed().await.is_err() {
                    return pred(&rx.borrow());
                }
            }
        };
        tokio::time::timeout(timeout, wait).await.unwrap_or(false)
    }

    pub async fn wait_for_status(&self, status: ConnectionStatus, timeout: Duration) -> bool {
        self.wait_for(timeout, |s| s.status == status).await
    }

    pub async fn wait_until_finished(&self, timeout: Duration) -> bool {
        self.wait_for(timeout, |s| {
            matches!(s.phase, SessionPhase::Closed | SessionPhase::Failed)
        })
        .await
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(build(tx))
            .await
            .map_err(|_| Error::SessionClosed)?;
        rx.await.map_err(|_| Error::SessionClosed)
    }
}

/// Notices raised by a session, in order.
pub struct NoticeStream {
    rx: mpsc::UnboundedReceiver<Notice>,
}

impl NoticeStream {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<Notice>) -> Self {
        Self { rx }
    }

    /// `None` once the session has finished and every notice was read.
    pub async fn recv(&mut self) -> Option<Notice> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Notice> {
        self.rx.try_recv().ok()
    }

    /// Drains whatever is queued right now.
    pub fn drain(&mut self) -> Vec<Notice> {
        let mut out = Vec::new();
        while let Ok(n) = self.rx.try_recv() {
            out.push(n);
        }
        out
    }
}
