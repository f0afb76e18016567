use liveclass_core::Role;

use crate::integration::{TestSession, connect, init_tracing};
use crate::utils::{SETTLE_TIMEOUT_MS, settle, wait_until};

#[tokio::test]
async fn test_drop_disposes_session() {
    init_tracing();

    let session = TestSession::start(Role::Initiator);
    let peer = session.peer().await;
    connect(&peer).await;
    settle().await;

    let snapshots = session.controller.subscribe();
    let relay = session.relay.clone();
    let capture = session.capture.clone();
    let clone = session.controller.clone();
    drop(session.controller);

    // A clone still keeps the session alive.
    settle().await;
    assert!(!peer.is_closed());
    assert_eq!(relay.leaves(), 0);

    drop(clone);
    assert!(
        wait_until(SETTLE_TIMEOUT_MS, || peer.is_closed() && relay.leaves() == 1).await,
        "session was not disposed"
    );
    assert!(capture.issued().iter().all(|t| t.is_ended()));
    drop(snapshots);
}
