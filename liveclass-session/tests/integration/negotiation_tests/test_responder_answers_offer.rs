use liveclass_core::{Role, SdpKind, SessionDescription};
use liveclass_session::SignalingState;

use crate::integration::{TestSession, init_tracing};
use crate::utils::{SETTLE_TIMEOUT_MS, settle, wait_until};

#[tokio::test]
async fn test_responder_answers_offer() {
    init_tracing();

    let session = TestSession::start(Role::Responder);
    let peer = session.peer().await;

    settle().await;
    assert!(session.relay.published_answers().is_empty());
    assert_eq!(peer.offers_created(), 0, "responder must not offer");

    session
        .relay
        .set_offer(SessionDescription::offer("v=0 remote-offer"));

    let relay = session.relay.clone();
    assert!(
        wait_until(SETTLE_TIMEOUT_MS, || relay.published_answers().len() == 1).await,
        "answer was never published"
    );

    // Both the offer and our own answer keep coming back from the relay.
    settle().await;

    assert_eq!(peer.answers_created(), 1);
    assert_eq!(peer.remote_sets(), 1);
    assert_eq!(peer.current_signaling(), SignalingState::Stable);
    let answer = &session.relay.published_answers()[0];
    assert_eq!(answer.kind, SdpKind::Answer);
    assert_eq!(peer.local_description().as_ref(), Some(answer));

    session.controller.close().await.expect("close failed");
}
