use liveclass_core::Role;

use crate::integration::{TestSession, init_tracing, test_config};
use crate::utils::{FakeCapture, MockRelay, SETTLE_TIMEOUT_MS, settle, wait_until};

#[tokio::test]
async fn test_offer_publish_is_retried() {
    init_tracing();

    let relay = MockRelay::new();
    relay.fail_next_publishes(2);
    let session = TestSession::start_with(Role::Initiator, test_config(), relay, FakeCapture::new());
    let peer = session.peer().await;

    let relay = session.relay.clone();
    assert!(
        wait_until(SETTLE_TIMEOUT_MS, || relay.published_offers().len() == 1).await,
        "offer publish was not retried"
    );
    settle().await;

    assert_eq!(peer.offers_created(), 1, "retry must reuse the same offer");
    assert_eq!(session.relay.published_offers().len(), 1);
    assert_eq!(
        session.relay.published_offers()[0],
        peer.local_description().expect("no local description")
    );

    session.controller.close().await.expect("close failed");
}
