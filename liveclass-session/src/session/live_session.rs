use crate::config::SessionConfig;
use crate::error::{CaptureError, Error};
use crate::media::{CaptureDevices, MediaTrackController};
use crate::peer::{PeerConnector, PeerEvent, PeerLink};
use crate::relay::{Polled, Poller, SignalingRelay};
use crate::session::{
    ChatChannel, ChatError, LifecycleMonitor, NegotiationEngine, NoticeStream, Outcome,
    SessionCommand, SessionController, SessionEvent, SessionSnapshot, SessionState,
    TeardownCoordinator, TeardownScope, Transition,
};
use liveclass_core::{ConnectionStatus, Notice, Role, SessionHandle};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::Sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// One live session: the single task that owns all session state.
///
/// Commands from controllers, relay poll results and peer callbacks all
/// arrive on channels and are handled one at a time.
pub struct LiveSession {
    config: SessionConfig,
    handle: SessionHandle,
    role: Role,
    relay: Arc<dyn SignalingRelay>,
    connector: Arc<dyn PeerConnector>,
    state: SessionState,
    engine: NegotiationEngine,
    media: MediaTrackController,
    chat: ChatChannel,
    teardown: TeardownCoordinator,
    peer: Option<Arc<dyn PeerLink>>,
    command_rx: mpsc::Receiver<SessionCommand>,
    event_rx: mpsc::Receiver<SessionEvent>,
    event_tx: mpsc::Sender<SessionEvent>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    notice_tx: mpsc::UnboundedSender<Notice>,
}

impl LiveSession {
    /// Spawns the session task and starts negotiating right away.
    pub fn start(
        config: SessionConfig,
        handle: SessionHandle,
        role: Role,
        relay: Arc<dyn SignalingRelay>,
        connector: Arc<dyn PeerConnector>,
        capture: Arc<dyn CaptureDevices>,
    ) -> (SessionController, NoticeStream) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (event_tx, event_rx) = mpsc::channel(config.event_queue_capacity.max(1));
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();

        let state = SessionState::default();
        let chat = ChatChannel::new(role);
        let (snapshot_tx, snapshot_rx) = watch::channel(state.snapshot(chat.messages()));

        let root = CancellationToken::new();
        let media = MediaTrackController::new(
            capture,
            config.user_media_request(),
            config.camera_request(),
        );
        let engine = NegotiationEngine::new(role, handle.clone(), relay.clone());
        let teardown = TeardownCoordinator::new(
            handle.clone(),
            relay.clone(),
            root.clone(),
            config.leave_timeout(),
        );

        let session = Self {
            config,
            handle: handle.clone(),
            role,
            relay,
            connector,
            state,
            engine,
            media,
            chat,
            teardown,
            peer: None,
            command_rx,
            event_rx,
            event_tx,
            snapshot_tx,
            notice_tx,
        };
        tokio::spawn(session.run());

        let controller = SessionController::new(handle, role, command_tx, snapshot_rx, root);
        (controller, NoticeStream::new(notice_rx))
    }

    async fn run(mut self) {
        info!("Session {} started as {}", self.handle, self.role);

        let mut deadline: Option<Pin<Box<Sleep>>> = self
            .config
            .negotiation_timeout()
            .map(|timeout| Box::pin(tokio::time::sleep(timeout)));

        // A stalled setup step counts against the same deadline.
        let timed_out = match deadline.as_mut() {
            Some(sleep) => tokio::select! {
                _ = self.negotiate() => false,
                _ = sleep.as_mut() => true,
            },
            None => {
                self.negotiate().await;
                false
            }
        };
        if timed_out {
            deadline = None;
            warn!("Session {} did not finish setup in time", self.handle);
            self.transition(Transition::TimedOut).await;
        } else if self.state.is_finished() {
            deadline = None;
        }

        while !self.teardown.is_complete() {
            if self.state.status() == ConnectionStatus::Connected {
                deadline = None;
            }

            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("All controllers dropped. Disposing session {}", self.handle);
                            self.shutdown().await;
                        }
                    }
                }

                evt = self.event_rx.recv() => {
                    // The loop holds a sender, so the queue never closes.
                    if let Some(e) = evt {
                        self.handle_event(e).await;
                    }
                }

                _ = wait_deadline(&mut deadline) => {
                    deadline = None;
                    warn!("Session {} did not connect in time", self.handle);
                    self.transition(Transition::TimedOut).await;
                }
            }
        }

        // Answer commands that raced with teardown.
        self.command_rx.close();
        while let Ok(cmd) = self.command_rx.try_recv() {
            self.reject_command(cmd);
        }

        info!("Session {} event loop finished", self.handle);
    }

    /// Capture, connect, join and kick off the exchange. Any step can be
    /// interrupted by cancelling the root token.
    async fn negotiate(&mut self) {
        let token = self.teardown.token().clone();
        self.transition(Transition::NegotiationStarted).await;

        match cancellable(&token, self.media.acquire()).await {
            None => return,
            Some(Ok(())) => {}
            Some(Err(e)) => {
                error!("Capturing local media failed: {}", e);
                let notice = match e.capture() {
                    Some(CaptureError::PermissionDenied) => Notice::CapturePermissionDenied,
                    Some(CaptureError::DeviceNotFound) => Notice::CaptureDeviceNotFound,
                    _ => Notice::CaptureFailed,
                };
                self.transition(Transition::SetupFailed(notice)).await;
                return;
            }
        }

        let peer = match cancellable(
            &token,
            self.connector.connect(&self.config, self.event_tx.clone()),
        )
        .await
        {
            None => return,
            Some(Ok(peer)) => peer,
            Some(Err(e)) => {
                error!("Creating peer connection failed: {}", e);
                self.transition(Transition::SetupFailed(Notice::SessionStartFailed))
                    .await;
                return;
            }
        };
        self.peer = Some(peer.clone());

        if let Some(Err(e)) = cancellable(&token, self.media.attach(peer.as_ref())).await {
            error!("Attaching local tracks failed: {}", e);
            self.transition(Transition::SetupFailed(Notice::SessionStartFailed))
                .await;
            return;
        }
        if token.is_cancelled() {
            return;
        }

        if self.role.creates_data_channel() {
            match peer.create_chat_channel(&self.config.chat_label).await {
                Ok(transport) => self.chat.attach(transport),
                Err(e) => warn!("Creating chat channel failed: {}", e),
            }
        }

        match cancellable(&token, self.relay.join(&self.handle)).await {
            None => return,
            Some(Err(e)) => warn!("Joining session {} failed: {}", self.handle, e),
            Some(Ok(())) => debug!("Joined session {}", self.handle),
        }

        match cancellable(&token, self.engine.begin(peer)).await {
            None => return,
            Some(Ok(())) => {}
            Some(Err(e)) => {
                error!("Starting negotiation failed: {}", e);
                self.transition(Transition::SetupFailed(Notice::SessionStartFailed))
                    .await;
                return;
            }
        }

        let poller = Poller::new(
            self.relay.clone(),
            self.handle.clone(),
            self.config.poll_interval(),
            self.event_tx.clone(),
            token.clone(),
        );
        for handle in poller.spawn_all() {
            self.teardown.register_poll(handle);
        }
        self.publish_snapshot();
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::ToggleVideo { reply } => {
                let next = !self.state.video_enabled();
                if self.media.set_video_enabled(next) {
                    self.transition(Transition::VideoEnabled(next)).await;
                }
                let _ = reply.send(self.state.video_enabled());
            }

            SessionCommand::ToggleAudio { reply } => {
                let next = !self.state.audio_enabled();
                if self.media.set_audio_enabled(next) {
                    self.transition(Transition::AudioEnabled(next)).await;
                }
                let _ = reply.send(self.state.audio_enabled());
            }

            SessionCommand::ToggleScreenShare { reply } => {
                let res = if self.state.screen_sharing() {
                    self.stop_screen_share().await
                } else {
                    self.start_screen_share().await
                };
                let _ = reply.send(res.map(|()| self.state.screen_sharing()));
            }

            SessionCommand::SendChat { text, reply } => {
                let res = self.chat.send(&text).await;
                match &res {
                    Ok(_) => self.publish_snapshot(),
                    Err(ChatError::NotConnected) => self.notify(Notice::ChatNotConnected),
                    Err(ChatError::Transport(e)) => {
                        warn!("Chat send failed: {}", e);
                        self.notify(Notice::ChatSendFailed);
                    }
                    Err(ChatError::Empty) => {}
                }
                let _ = reply.send(res);
            }

            SessionCommand::Close { reply } => {
                info!("Close requested for session {}", self.handle);
                self.shutdown().await;
                let _ = reply.send(());
            }
        }
    }

    async fn handle_event(&mut self, event: SessionEvent) {
        // Anything still queued once cancellation started is stale.
        if self.teardown.is_complete() || self.teardown.token().is_cancelled() {
            return;
        }
        match event {
            SessionEvent::Polled(polled) => {
                self.engine.retry_publish(polled.kind()).await;
                match polled {
                    Polled::Offer(Some(offer)) => {
                        let res = self.engine.on_remote_offer(offer).await;
                        debug!("Remote offer: {:?}", res);
                    }
                    Polled::Answer(Some(answer)) => {
                        let res = self.engine.on_remote_answer(answer).await;
                        debug!("Remote answer: {:?}", res);
                    }
                    Polled::Candidates(candidates) => {
                        for candidate in candidates {
                            self.engine.on_remote_candidate(candidate).await;
                        }
                    }
                    Polled::Offer(None) | Polled::Answer(None) => {}
                }
            }

            SessionEvent::Peer(PeerEvent::IceConnectionState(s)) => {
                if let Some(status) = LifecycleMonitor::map_ice(s) {
                    self.transition(Transition::Connectivity(status)).await;
                }
            }

            SessionEvent::Peer(PeerEvent::ConnectionState(s)) => {
                if let Some(status) = LifecycleMonitor::map_peer(s) {
                    self.transition(Transition::Connectivity(status)).await;
                }
            }

            SessionEvent::Peer(PeerEvent::LocalCandidate(candidate)) => {
                self.engine.note_local_candidate(&candidate);
                let relay = self.relay.clone();
                let session = self.handle.clone();
                let token = self.teardown.token().child_token();
                tokio::spawn(async move {
                    tokio::select! {
                        _ = token.cancelled() => {}
                        res = relay.publish_candidate(&session, &candidate) => {
                            if let Err(e) = res {
                                debug!("Publishing local candidate failed: {}", e);
                            }
                        }
                    }
                });
            }

            SessionEvent::Peer(PeerEvent::RemoteTrack(info)) => {
                self.transition(Transition::RemoteTrackAdded(info)).await;
            }

            SessionEvent::Peer(PeerEvent::ChannelReceived(transport)) => {
                let open = transport.is_open();
                self.chat.attach(transport);
                if open {
                    self.transition(Transition::ChatOpened).await;
                }
            }

            SessionEvent::Peer(PeerEvent::ChannelOpened) => {
                self.transition(Transition::ChatOpened).await;
            }

            SessionEvent::Peer(PeerEvent::ChannelClosed) => {
                self.transition(Transition::ChatClosed).await;
            }

            SessionEvent::Peer(PeerEvent::ChannelError(e)) => {
                warn!("Chat channel error: {}", e);
            }

            SessionEvent::Peer(PeerEvent::ChannelMessage(data)) => {
                if self.chat.receive(&data).is_some() {
                    self.publish_snapshot();
                }
            }

            SessionEvent::ScreenTrackEnded(track_id) => {
                let current = self.media.screen_video().map(|t| t.id() == track_id);
                if current == Some(true) {
                    info!("Screen capture ended externally");
                    if let Err(e) = self.stop_screen_share().await {
                        warn!("Restoring camera after screen share failed: {}", e);
                        self.abandon_screen_share().await;
                    }
                }
            }
        }
    }

    async fn start_screen_share(&mut self) -> Result<(), Error> {
        let Some(peer) = self.peer.clone() else {
            return Err(Error::InvalidState("no peer connection".to_owned()));
        };
        match self.media.start_screen_share(peer.as_ref()).await {
            Ok(track) => {
                self.watch_screen_track(track.ended_token(), track.id().to_owned());
                self.transition(Transition::ScreenShare(true)).await;
                Ok(())
            }
            Err(e) => {
                warn!("Screen share failed: {}", e);
                self.notify(if e.is_permission_denied() {
                    Notice::ScreenSharePermissionDenied
                } else {
                    Notice::ScreenShareFailed
                });
                Err(e)
            }
        }
    }

    async fn stop_screen_share(&mut self) -> Result<(), Error> {
        let Some(peer) = self.peer.clone() else {
            return Err(Error::InvalidState("no peer connection".to_owned()));
        };
        let video_enabled = self.state.video_enabled();
        match self.media.stop_screen_share(peer.as_ref(), video_enabled).await {
            Ok(()) => {
                self.transition(Transition::ScreenShare(false)).await;
                Ok(())
            }
            Err(e) => {
                warn!("Stopping screen share failed: {}", e);
                self.notify(Notice::ScreenShareFailed);
                Err(e)
            }
        }
    }

    /// The display is gone and no fresh camera could be captured: fall back
    /// to the original camera track so the share never outlives its source.
    async fn abandon_screen_share(&mut self) {
        let Some(peer) = self.peer.clone() else {
            return;
        };
        if let Err(e) = self.media.release_screen_share(peer.as_ref()).await {
            warn!("Falling back to the original camera failed: {}", e);
        }
        self.transition(Transition::ScreenShare(false)).await;
    }

    /// Reports the end of a screen track back to the loop.
    fn watch_screen_track(&self, ended: CancellationToken, track_id: String) {
        let events = self.event_tx.clone();
        let root = self.teardown.token().clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = root.cancelled() => {}
                _ = ended.cancelled() => {
                    let _ = events.send(SessionEvent::ScreenTrackEnded(track_id)).await;
                }
            }
        });
    }

    async fn transition(&mut self, transition: Transition) {
        let Outcome { notices, teardown } = self.state.apply(transition);
        for notice in notices {
            self.notify(notice);
        }
        self.publish_snapshot();
        if teardown {
            self.shutdown().await;
        }
    }

    async fn shutdown(&mut self) {
        let scope = TeardownScope {
            state: &mut self.state,
            engine: &mut self.engine,
            media: &mut self.media,
            chat: &mut self.chat,
            peer: self.peer.take(),
        };
        if self.teardown.cleanup(scope).await {
            self.publish_snapshot();
        }
    }

    fn reject_command(&self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::ToggleVideo { reply } => {
                let _ = reply.send(self.state.video_enabled());
            }
            SessionCommand::ToggleAudio { reply } => {
                let _ = reply.send(self.state.audio_enabled());
            }
            SessionCommand::ToggleScreenShare { reply } => {
                let _ = reply.send(Err(Error::SessionClosed));
            }
            SessionCommand::SendChat { reply, .. } => {
                let _ = reply.send(Err(ChatError::NotConnected));
            }
            SessionCommand::Close { reply } => {
                let _ = reply.send(());
            }
        }
    }

    fn notify(&self, notice: Notice) {
        debug!("Notice: {}", notice);
        let _ = self.notice_tx.send(notice);
    }

    fn publish_snapshot(&self) {
        self.snapshot_tx
            .send_replace(self.state.snapshot(self.chat.messages()));
    }
}

async fn cancellable<F: Future>(token: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        _ = token.cancelled() => None,
        out = fut => Some(out),
    }
}

async fn wait_deadline(deadline: &mut Option<Pin<Box<Sleep>>>) {
    match deadline {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}
