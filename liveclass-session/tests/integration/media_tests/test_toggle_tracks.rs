use liveclass_core::{Notice, Role};
use liveclass_session::TrackSource;

use crate::integration::{TestSession, init_tracing};
use crate::utils::settle;

#[tokio::test]
async fn test_toggle_tracks() {
    init_tracing();

    let mut session = TestSession::start(Role::Initiator);
    let peer = session.peer().await;
    settle().await;

    assert_eq!(peer.sender_count(), 2, "camera and microphone are sent");
    let issued = session.capture.issued();
    let camera = issued
        .iter()
        .find(|t| t.source() == TrackSource::Camera)
        .expect("no camera track")
        .clone();
    let microphone = issued
        .iter()
        .find(|t| t.source() == TrackSource::Microphone)
        .expect("no microphone track")
        .clone();

    assert!(!session.controller.toggle_video().await.expect("toggle video"));
    assert!(!camera.is_enabled());
    assert!(!session.controller.snapshot().video_enabled);

    assert!(!session.controller.toggle_audio().await.expect("toggle audio"));
    assert!(!microphone.is_enabled());

    assert!(session.controller.toggle_video().await.expect("toggle video"));
    assert!(camera.is_enabled());

    // Toggling only flips the flag; nothing is renegotiated or re-sent.
    assert_eq!(peer.sender_count(), 2);
    assert_eq!(peer.offers_created(), 1);
    assert_eq!(session.capture.user_requests(), 1);

    assert_eq!(
        session.notices.drain(),
        vec![Notice::CameraOff, Notice::MicrophoneMuted, Notice::CameraOn]
    );

    session.controller.close().await.expect("close failed");
    assert!(camera.is_ended());
    assert!(microphone.is_ended());
}
