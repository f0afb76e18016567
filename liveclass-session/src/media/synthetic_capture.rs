use crate::error::CaptureError;
use crate::media::{CaptureDevices, CaptureRequest, CaptureStream, LocalTrack, TrackSource};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use tracing::{debug, trace};
use webrtc::media::Sample;

const AUDIO_FRAME: Duration = Duration::from_millis(20);
const MIN_FRAME_PERIOD: Duration = Duration::from_millis(1);

/// Never zero, whatever rate a config asks for.
fn frame_period(frame_rate: u32) -> Duration {
    (Duration::from_secs(1) / frame_rate.max(1)).max(MIN_FRAME_PERIOD)
}

/// Capture backend for hosts without camera access.
///
/// Each track gets a pump task that writes placeholder samples at the
/// requested rate while the track is enabled, and exits once it ends.
#[derive(Debug, Clone)]
pub struct SyntheticCapture {
    stream_id: String,
    display_available: bool,
}

impl Default for SyntheticCapture {
    fn default() -> Self {
        Self {
            stream_id: "liveclass".to_owned(),
            display_available: true,
        }
    }
}

impl SyntheticCapture {
    pub fn new(stream_id: impl Into<String>) -> Self {
        Self {
            stream_id: stream_id.into(),
            ..Self::default()
        }
    }

    /// Refuse display capture, as a host without a screen would.
    pub fn without_display(mut self) -> Self {
        self.display_available = false;
        self
    }
}

#[async_trait]
impl CaptureDevices for SyntheticCapture {
    async fn user_media(&self, request: &CaptureRequest) -> Result<CaptureStream, CaptureError> {
        let mut tracks = Vec::new();
        if let Some(video) = &request.video {
            let track = LocalTrack::video(TrackSource::Camera, &self.stream_id);
            spawn_pump(track.clone(), frame_period(video.frame_rate));
            tracks.push(track);
        }
        if request.audio.is_some() {
            let track = LocalTrack::audio(TrackSource::Microphone, &self.stream_id);
            spawn_pump(track.clone(), AUDIO_FRAME);
            tracks.push(track);
        }
        if tracks.is_empty() {
            return Err(CaptureError::Other("nothing requested".to_owned()));
        }
        debug!("Synthetic capture opened {} track(s)", tracks.len());
        Ok(CaptureStream::new(tracks))
    }

    async fn display_media(&self) -> Result<CaptureStream, CaptureError> {
        if !self.display_available {
            return Err(CaptureError::DeviceNotFound);
        }
        let track = LocalTrack::video(TrackSource::Screen, &format!("{}-screen", self.stream_id));
        spawn_pump(track.clone(), Duration::from_millis(200));
        Ok(CaptureStream::new(vec![track]))
    }
}

fn spawn_pump(track: LocalTrack, period: Duration) {
    let ended = track.ended_token();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        let payload = Bytes::from_static(&[0u8; 16]);
        loop {
            tokio::select! {
                _ = ended.cancelled() => break,
                _ = ticker.tick() => {}
            }
            let sample = Sample {
                data: payload.clone(),
                duration: period,
                ..Default::default()
            };
            if let Err(e) = track.write_sample(&sample).await {
                trace!("Dropping sample for {}: {}", track.id(), e);
            }
        }
        trace!("Pump for {} stopped", track.id());
    });
}
