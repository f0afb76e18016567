use serde::{Deserialize, Serialize};
use std::fmt;

/// User-facing notification raised by the session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Hash, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    Connected,
    ConnectionLost,
    ConnectionFailed,
    CapturePermissionDenied,
    CaptureDeviceNotFound,
    CaptureFailed,
    SessionStartFailed,
    CameraOn,
    CameraOff,
    MicrophoneMuted,
    MicrophoneUnmuted,
    ScreenShareStarted,
    ScreenShareStopped,
    ScreenSharePermissionDenied,
    ScreenShareFailed,
    ChatConnected,
    ChatNotConnected,
    ChatSendFailed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Hash, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl Notice {
    pub fn message(self) -> &'static str {
        match self {
            Notice::Connected => "Connected to live class!",
            Notice::ConnectionLost => "Connection lost. Attempting to reconnect...",
            Notice::ConnectionFailed => "Connection failed. Please try again.",
            Notice::CapturePermissionDenied => {
                "Camera/microphone permission denied. Please allow access."
            }
            Notice::CaptureDeviceNotFound => "No camera/microphone found. Please connect a device.",
            Notice::CaptureFailed => "Failed to initialize video. Please check your devices.",
            Notice::SessionStartFailed => "Failed to start live class",
            Notice::CameraOn => "Camera turned on",
            Notice::CameraOff => "Camera turned off",
            Notice::MicrophoneMuted => "Microphone muted",
            Notice::MicrophoneUnmuted => "Microphone unmuted",
            Notice::ScreenShareStarted => "Screen sharing started",
            Notice::ScreenShareStopped => "Screen sharing stopped",
            Notice::ScreenSharePermissionDenied => "Screen sharing permission denied",
            Notice::ScreenShareFailed => "Failed to share screen",
            Notice::ChatConnected => "Chat connected",
            Notice::ChatNotConnected => "Chat not connected yet",
            Notice::ChatSendFailed => "Failed to send message",
        }
    }

    pub fn level(self) -> NoticeLevel {
        match self {
            Notice::Connected | Notice::ScreenShareStarted | Notice::ChatConnected => {
                NoticeLevel::Success
            }
            Notice::ConnectionLost | Notice::ChatNotConnected => NoticeLevel::Warning,
            Notice::ConnectionFailed
            | Notice::CapturePermissionDenied
            | Notice::CaptureDeviceNotFound
            | Notice::CaptureFailed
            | Notice::SessionStartFailed
            | Notice::ScreenSharePermissionDenied
            | Notice::ScreenShareFailed
            | Notice::ChatSendFailed => NoticeLevel::Error,
            Notice::CameraOn
            | Notice::CameraOff
            | Notice::MicrophoneMuted
            | Notice::MicrophoneUnmuted
            | Notice::ScreenShareStopped => NoticeLevel::Info,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
