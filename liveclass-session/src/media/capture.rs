use crate::error::CaptureError;
use crate::media::{LocalTrack, TrackKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VideoConstraints {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
}

impl Default for VideoConstraints {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            frame_rate: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AudioConstraints {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
}

impl Default for AudioConstraints {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
        }
    }
}

/// What to capture. A `None` kind is not requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureRequest {
    pub video: Option<VideoConstraints>,
    pub audio: Option<AudioConstraints>,
}

/// Tracks returned by one capture request.
#[derive(Debug, Clone, Default)]
pub struct CaptureStream {
    tracks: Vec<LocalTrack>,
}

impl CaptureStream {
    pub fn new(tracks: Vec<LocalTrack>) -> Self {
        Self { tracks }
    }

    pub fn tracks(&self) -> &[LocalTrack] {
        &self.tracks
    }

    pub fn video_track(&self) -> Option<&LocalTrack> {
        self.tracks.iter().find(|t| t.kind() == TrackKind::Video)
    }

    pub fn audio_track(&self) -> Option<&LocalTrack> {
        self.tracks.iter().find(|t| t.kind() == TrackKind::Audio)
    }

    /// Swaps the video track for `track`, returning the one it displaced.
    pub fn replace_video(&mut self, track: LocalTrack) -> Option<LocalTrack> {
        let old = self
            .tracks
            .iter()
            .position(|t| t.kind() == TrackKind::Video)
            .map(|idx| self.tracks.remove(idx));
        self.tracks.push(track);
        old
    }

    /// Ends every track. Returns how many were still live.
    pub fn stop(&self) -> usize {
        let live = self.tracks.iter().filter(|t| !t.is_ended()).count();
        for track in &self.tracks {
            track.stop();
        }
        live
    }
}

/// Source of local media: camera and microphone, or a display surface.
#[async_trait]
pub trait CaptureDevices: Send + Sync {
    async fn user_media(&self, request: &CaptureRequest) -> Result<CaptureStream, CaptureError>;

    async fn display_media(&self) -> Result<CaptureStream, CaptureError>;
}
