use crate::media::RemoteTrackInfo;
use crate::session::LifecycleMonitor;
use liveclass_core::{ChatMessage, ConnectionStatus, Notice};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Hash, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Starting,
    Negotiating,
    Live,
    Failed,
    Closed,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionPhase::Starting => "starting",
            SessionPhase::Negotiating => "negotiating",
            SessionPhase::Live => "live",
            SessionPhase::Failed => "failed",
            SessionPhase::Closed => "closed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub enum Transition {
    NegotiationStarted,
    Connectivity(ConnectionStatus),
    /// Setup could not complete; carries the notice to show.
    SetupFailed(Notice),
    TimedOut,
    VideoEnabled(bool),
    AudioEnabled(bool),
    ScreenShare(bool),
    ChatOpened,
    ChatClosed,
    RemoteTrackAdded(RemoteTrackInfo),
    Closed,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub notices: Vec<Notice>,
    /// The session must be torn down.
    pub teardown: bool,
}

impl Outcome {
    fn notice(notice: Notice) -> Self {
        Self {
            notices: vec![notice],
            teardown: false,
        }
    }

    fn fatal(notice: Notice) -> Self {
        Self {
            notices: vec![notice],
            teardown: true,
        }
    }
}

/// Read-only view of a session, published after every change.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub status: ConnectionStatus,
    pub phase: SessionPhase,
    pub video_enabled: bool,
    pub audio_enabled: bool,
    pub screen_sharing: bool,
    pub chat_open: bool,
    pub remote_tracks: Vec<RemoteTrackInfo>,
    pub messages: Vec<ChatMessage>,
}

/// Every piece of session state the UI cares about, changed only via
/// [`SessionState::apply`].
#[derive(Debug, Clone)]
pub struct SessionState {
    phase: SessionPhase,
    monitor: LifecycleMonitor,
    video_enabled: bool,
    audio_enabled: bool,
    screen_sharing: bool,
    chat_open: bool,
    remote_tracks: Vec<RemoteTrackInfo>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Starting,
            monitor: LifecycleMonitor::default(),
            video_enabled: true,
            audio_enabled: true,
            screen_sharing: false,
            chat_open: false,
            remote_tracks: Vec::new(),
        }
    }
}

impl SessionState {
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn status(&self) -> ConnectionStatus {
        self.monitor.status()
    }

    pub fn video_enabled(&self) -> bool {
        self.video_enabled
    }

    pub fn audio_enabled(&self) -> bool {
        self.audio_enabled
    }

    pub fn screen_sharing(&self) -> bool {
        self.screen_sharing
    }

    pub fn chat_open(&self) -> bool {
        self.chat_open
    }

    pub fn remote_tracks(&self) -> &[RemoteTrackInfo] {
        &self.remote_tracks
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, SessionPhase::Failed | SessionPhase::Closed)
    }

    pub fn apply(&mut self, transition: Transition) -> Outcome {
        if self.phase == SessionPhase::Closed {
            return Outcome::default();
        }

        match transition {
            Transition::NegotiationStarted => {
                if self.phase == SessionPhase::Starting {
                    self.phase = SessionPhase::Negotiating;
                }
                Outcome::default()
            }
            Transition::Connectivity(status) => {
                if self.phase == SessionPhase::Failed {
                    return Outcome::default();
                }
                let change = self.monitor.observe(status);
                match change.status {
                    Some(ConnectionStatus::Connected) => self.phase = SessionPhase::Live,
                    Some(ConnectionStatus::Failed) => self.phase = SessionPhase::Failed,
                    _ => {}
                }
                Outcome {
                    notices: change.notice.into_iter().collect(),
                    teardown: self.phase == SessionPhase::Failed,
                }
            }
            Transition::SetupFailed(notice) => {
                if self.phase == SessionPhase::Failed {
                    return Outcome::default();
                }
                self.monitor.fail();
                self.phase = SessionPhase::Failed;
                Outcome::fatal(notice)
            }
            Transition::TimedOut => {
                if self.monitor.connected_once() || self.phase == SessionPhase::Failed {
                    return Outcome::default();
                }
                self.monitor.fail();
                self.phase = SessionPhase::Failed;
                Outcome::fatal(Notice::ConnectionFailed)
            }
            Transition::VideoEnabled(enabled) => {
                self.video_enabled = enabled;
                Outcome::notice(if enabled {
                    Notice::CameraOn
                } else {
                    Notice::CameraOff
                })
            }
            Transition::AudioEnabled(enabled) => {
                self.audio_enabled = enabled;
                Outcome::notice(if enabled {
                    Notice::MicrophoneUnmuted
                } else {
                    Notice::MicrophoneMuted
                })
            }
            Transition::ScreenShare(sharing) => {
                if self.screen_sharing == sharing {
                    return Outcome::default();
                }
                self.screen_sharing = sharing;
                Outcome::notice(if sharing {
                    Notice::ScreenShareStarted
                } else {
                    Notice::ScreenShareStopped
                })
            }
            Transition::ChatOpened => {
                if self.chat_open {
                    return Outcome::default();
                }
                self.chat_open = true;
                Outcome::notice(Notice::ChatConnected)
            }
            Transition::ChatClosed => {
                self.chat_open = false;
                Outcome::default()
            }
            Transition::RemoteTrackAdded(info) => {
                if !self.remote_tracks.iter().any(|t| t.id == info.id) {
                    self.remote_tracks.push(info);
                }
                Outcome::default()
            }
            Transition::Closed => {
                if self.phase != SessionPhase::Failed {
                    self.phase = SessionPhase::Closed;
                }
                self.screen_sharing = false;
                self.chat_open = false;
                self.remote_tracks.clear();
                Outcome::default()
            }
        }
    }

    pub fn snapshot(&self, messages: &[ChatMessage]) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status(),
            phase: self.phase,
            video_enabled: self.video_enabled,
            audio_enabled: self.audio_enabled,
            screen_sharing: self.screen_sharing,
            chat_open: self.chat_open,
            remote_tracks: self.remote_tracks.clone(),
            messages: messages.to_vec(),
        }
    }
}
