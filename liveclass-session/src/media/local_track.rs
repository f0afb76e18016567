use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Hash, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Video,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Audio => f.write_str("audio"),
            TrackKind::Video => f.write_str("video"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Hash, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum TrackSource {
    Camera,
    Microphone,
    Screen,
}

/// Track received from the remote peer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteTrackInfo {
    pub id: String,
    pub kind: TrackKind,
    pub stream_id: String,
}

struct LocalTrackInner {
    id: String,
    kind: TrackKind,
    source: TrackSource,
    enabled: AtomicBool,
    ended: CancellationToken,
    rtc: Arc<TrackLocalStaticSample>,
}

/// Locally captured media track.
///
/// A disabled track stays attached to its sender but writes no samples;
/// an ended track is gone for good. Clones share state.
#[derive(Clone)]
pub struct LocalTrack {
    inner: Arc<LocalTrackInner>,
}

impl LocalTrack {
    pub fn new(
        kind: TrackKind,
        source: TrackSource,
        codec: RTCRtpCodecCapability,
        stream_id: &str,
    ) -> Self {
        let id = format!("{}-{}", kind, uuid::Uuid::new_v4());
        let rtc = Arc::new(TrackLocalStaticSample::new(
            codec,
            id.clone(),
            stream_id.to_owned(),
        ));
        Self {
            inner: Arc::new(LocalTrackInner {
                id,
                kind,
                source,
                enabled: AtomicBool::new(true),
                ended: CancellationToken::new(),
                rtc,
            }),
        }
    }

    /// VP8 video track, the default browsers negotiate.
    pub fn video(source: TrackSource, stream_id: &str) -> Self {
        let codec = RTCRtpCodecCapability {
            mime_type: MIME_TYPE_VP8.to_owned(),
            clock_rate: 90000,
            channels: 0,
            sdp_fmtp_line: String::new(),
            rtcp_feedback: vec![],
        };
        Self::new(TrackKind::Video, source, codec, stream_id)
    }

    pub fn audio(source: TrackSource, stream_id: &str) -> Self {
        let codec = RTCRtpCodecCapability {
            mime_type: MIME_TYPE_OPUS.to_owned(),
            clock_rate: 48000,
            channels: 2,
            sdp_fmtp_line: "minptime=10;useinbandfec=1".to_owned(),
            rtcp_feedback: vec![],
        };
        Self::new(TrackKind::Audio, source, codec, stream_id)
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn kind(&self) -> TrackKind {
        self.inner.kind
    }

    pub fn source(&self) -> TrackSource {
        self.inner.source
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.inner.enabled.store(enabled, Ordering::Release);
    }

    /// Ends the track. Idempotent.
    pub fn stop(&self) {
        self.inner.ended.cancel();
    }

    pub fn is_ended(&self) -> bool {
        self.inner.ended.is_cancelled()
    }

    /// Resolves once the track has ended, whether stopped locally or by the
    /// capture source going away.
    pub fn ended_token(&self) -> CancellationToken {
        self.inner.ended.clone()
    }

    pub fn rtc_track(&self) -> Arc<TrackLocalStaticSample> {
        Arc::clone(&self.inner.rtc)
    }

    /// Writes a sample unless the track is disabled or ended.
    pub async fn write_sample(&self, sample: &Sample) -> Result<()> {
        if self.is_ended() || !self.is_enabled() {
            return Ok(());
        }
        self.inner
            .rtc
            .write_sample(sample)
            .await
            .map_err(|e| Error::MediaTrack(format!("failed to write sample: {e}")))
    }
}

impl fmt::Debug for LocalTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalTrack")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.kind)
            .field("source", &self.inner.source)
            .field("enabled", &self.is_enabled())
            .field("ended", &self.is_ended())
            .finish()
    }
}
