use liveclass_core::{Role, SessionDescription};
use liveclass_session::SignalingState;

use crate::integration::{TestSession, init_tracing};
use crate::utils::{SETTLE_TIMEOUT_MS, settle, wait_until};

#[tokio::test]
async fn test_answer_before_offer_is_ignored() {
    init_tracing();

    let session = TestSession::start(Role::Responder);
    let peer = session.peer().await;

    session
        .relay
        .set_answer(SessionDescription::answer("v=0 stray-answer"));
    settle().await;

    assert_eq!(peer.remote_sets(), 0, "stray answer was applied");
    assert_eq!(peer.current_signaling(), SignalingState::Stable);

    // The session still negotiates normally afterwards.
    session
        .relay
        .set_offer(SessionDescription::offer("v=0 remote-offer"));
    let relay = session.relay.clone();
    assert!(wait_until(SETTLE_TIMEOUT_MS, || relay.published_answers().len() == 1).await);
    assert_eq!(peer.remote_sets(), 1);

    session.controller.close().await.expect("close failed");
}
