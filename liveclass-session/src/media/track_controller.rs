use crate::error::{Error, Result};
use crate::media::{CaptureDevices, CaptureRequest, CaptureStream, LocalTrack};
use crate::peer::PeerLink;
use std::sync::Arc;
use tracing::{debug, info};

/// Owns local capture streams and the outgoing video slot.
///
/// Screen sharing swaps the track behind the existing video sender; the
/// sender set never changes after [`MediaTrackController::attach`].
pub struct MediaTrackController {
    capture: Arc<dyn CaptureDevices>,
    user_request: CaptureRequest,
    camera_request: CaptureRequest,
    camera: Option<CaptureStream>,
    screen: Option<CaptureStream>,
}

impl MediaTrackController {
    pub fn new(
        capture: Arc<dyn CaptureDevices>,
        user_request: CaptureRequest,
        camera_request: CaptureRequest,
    ) -> Self {
        Self {
            capture,
            user_request,
            camera_request,
            camera: None,
            screen: None,
        }
    }

    /// Opens camera and microphone.
    pub async fn acquire(&mut self) -> Result<()> {
        let stream = self.capture.user_media(&self.user_request).await?;
        info!("Captured {} local track(s)", stream.tracks().len());
        self.camera = Some(stream);
        Ok(())
    }

    /// Adds one sender per captured track.
    pub async fn attach(&self, peer: &dyn PeerLink) -> Result<()> {
        let Some(camera) = &self.camera else {
            return Err(Error::InvalidState("no local media captured".to_owned()));
        };
        for track in camera.tracks() {
            peer.add_track(track).await?;
        }
        Ok(())
    }

    pub fn camera_video(&self) -> Option<&LocalTrack> {
        self.camera.as_ref().and_then(|s| s.video_track())
    }

    pub fn microphone(&self) -> Option<&LocalTrack> {
        self.camera.as_ref().and_then(|s| s.audio_track())
    }

    pub fn screen_video(&self) -> Option<&LocalTrack> {
        self.screen.as_ref().and_then(|s| s.video_track())
    }

    /// The track currently feeding the video sender.
    pub fn outgoing_video(&self) -> Option<&LocalTrack> {
        self.screen_video().or_else(|| self.camera_video())
    }

    pub fn is_sharing(&self) -> bool {
        self.screen.is_some()
    }

    /// Returns false when there is no camera track to switch.
    pub fn set_video_enabled(&self, enabled: bool) -> bool {
        match self.camera_video() {
            Some(track) => {
                track.set_enabled(enabled);
                true
            }
            None => false,
        }
    }

    pub fn set_audio_enabled(&self, enabled: bool) -> bool {
        match self.microphone() {
            Some(track) => {
                track.set_enabled(enabled);
                true
            }
            None => false,
        }
    }

    /// Captures the display and points the video sender at it.
    ///
    /// On failure nothing is swapped and any display capture is released.
    pub async fn start_screen_share(&mut self, peer: &dyn PeerLink) -> Result<LocalTrack> {
        if self.screen.is_some() {
            return Err(Error::InvalidState("screen share already active".to_owned()));
        }
        let stream = self.capture.display_media().await?;
        let Some(track) = stream.video_track().cloned() else {
            stream.stop();
            return Err(Error::MediaTrack("display capture has no video".to_owned()));
        };
        if let Err(e) = peer.replace_video_track(&track).await {
            stream.stop();
            return Err(e);
        }
        info!("Screen share started with track {}", track.id());
        self.screen = Some(stream);
        Ok(track)
    }

    /// Re-acquires camera video and puts it back on the video sender.
    ///
    /// The fresh camera track starts with `video_enabled`. If the camera
    /// cannot be re-acquired the screen share stays in place.
    pub async fn stop_screen_share(&mut self, peer: &dyn PeerLink, video_enabled: bool) -> Result<()> {
        if self.screen.is_none() {
            return Err(Error::InvalidState("no screen share active".to_owned()));
        }
        let fresh = self.capture.user_media(&self.camera_request).await?;
        let Some(track) = fresh.video_track().cloned() else {
            fresh.stop();
            return Err(Error::MediaTrack("camera capture has no video".to_owned()));
        };
        track.set_enabled(video_enabled);
        if let Err(e) = peer.replace_video_track(&track).await {
            fresh.stop();
            return Err(e);
        }

        if let Some(screen) = self.screen.take() {
            screen.stop();
        }
        match self.camera.as_mut() {
            Some(camera) => {
                if let Some(old) = camera.replace_video(track) {
                    old.stop();
                }
            }
            None => self.camera = Some(CaptureStream::new(vec![track])),
        }
        info!("Screen share stopped, camera restored");
        Ok(())
    }

    /// Drops an ended screen capture and puts the camera track captured at
    /// start back on the video sender, without asking for a new one.
    pub async fn release_screen_share(&mut self, peer: &dyn PeerLink) -> Result<()> {
        let Some(screen) = self.screen.take() else {
            return Ok(());
        };
        screen.stop();
        let Some(track) = self.outgoing_video().cloned() else {
            return Err(Error::MediaTrack("no camera track to fall back to".to_owned()));
        };
        peer.replace_video_track(&track).await?;
        info!("Screen share released, original camera track {} restored", track.id());
        Ok(())
    }

    /// Ends every local track. Returns how many were still live.
    pub fn stop_all(&mut self) -> usize {
        let mut stopped = 0;
        if let Some(screen) = self.screen.take() {
            stopped += screen.stop();
        }
        if let Some(camera) = self.camera.take() {
            stopped += camera.stop();
        }
        debug!("Stopped {} local track(s)", stopped);
        stopped
    }
}
