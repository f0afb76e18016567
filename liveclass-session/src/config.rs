use crate::media::{AudioConstraints, CaptureRequest, VideoConstraints};
use liveclass_core::IceServerConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for one live session.
///
/// Every field has a default, so a partial TOML or JSON document is enough.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub ice_servers: Vec<IceServerConfig>,
    pub ice_candidate_pool_size: u8,
    /// Period of every relay polling loop.
    pub poll_interval_ms: u64,
    /// Give up and fail the session if it is not connected within this time.
    /// `None` waits indefinitely.
    pub negotiation_timeout_ms: Option<u64>,
    /// Upper bound for the best-effort `leave` call during teardown.
    pub leave_timeout_ms: u64,
    pub chat_label: String,
    pub camera: VideoConstraints,
    pub microphone: AudioConstraints,
    pub event_queue_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![
                IceServerConfig::stun("stun:stun.l.google.com:19302"),
                IceServerConfig::stun("stun:stun1.l.google.com:19302"),
                IceServerConfig::stun("stun:stun2.l.google.com:19302"),
            ],
            ice_candidate_pool_size: 10,
            poll_interval_ms: 1000,
            negotiation_timeout_ms: None,
            leave_timeout_ms: 3000,
            chat_label: "chat".to_owned(),
            camera: VideoConstraints::default(),
            microphone: AudioConstraints::default(),
            event_queue_capacity: 256,
        }
    }
}

impl SessionConfig {
    pub fn with_ice_servers(mut self, ice_servers: Vec<IceServerConfig>) -> Self {
        self.ice_servers = ice_servers;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_negotiation_timeout(mut self, timeout: Duration) -> Self {
        self.negotiation_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn negotiation_timeout(&self) -> Option<Duration> {
        self.negotiation_timeout_ms.map(Duration::from_millis)
    }

    pub fn leave_timeout(&self) -> Duration {
        Duration::from_millis(self.leave_timeout_ms)
    }

    /// Camera plus microphone, as requested when the session starts.
    pub fn user_media_request(&self) -> CaptureRequest {
        CaptureRequest {
            video: Some(self.camera.clone()),
            audio: Some(self.microphone.clone()),
        }
    }

    /// Camera only, used to get the camera back after a screen share.
    pub fn camera_request(&self) -> CaptureRequest {
        CaptureRequest {
            video: Some(self.camera.clone()),
            audio: None,
        }
    }
}
