use std::time::Duration;

use bytes::Bytes;
use liveclass_core::{Notice, Role};
use liveclass_session::PeerEvent;

use crate::integration::{TestSession, init_tracing};
use crate::utils::{SETTLE_TIMEOUT_MS, settle, wait_for_notice};

#[tokio::test]
async fn test_inbound_messages() {
    init_tracing();

    let mut session = TestSession::start(Role::Responder);
    let peer = session.peer().await;
    assert!(peer.chat().is_none(), "responder must not create a channel");

    peer.open_remote_channel().await;
    assert!(
        wait_for_notice(
            &mut session.notices,
            Notice::ChatConnected,
            SETTLE_TIMEOUT_MS
        )
        .await
        .is_some()
    );

    peer.emit(PeerEvent::ChannelMessage(Bytes::from_static(
        br#"{"text":"welcome","sender":"Educator","timestamp":"2025-03-01T10:15:00.000Z"}"#,
    )))
    .await;
    peer.emit(PeerEvent::ChannelMessage(Bytes::from_static(b"{not json")))
        .await;
    peer.emit(PeerEvent::ChannelMessage(Bytes::from_static(
        br#"{"text":"missing sender"}"#,
    )))
    .await;

    assert!(
        session
            .controller
            .wait_for(Duration::from_millis(SETTLE_TIMEOUT_MS), |s| !s
                .messages
                .is_empty())
            .await
    );
    settle().await;

    let messages = session.controller.snapshot().messages;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, "welcome");
    assert_eq!(messages[0].sender, Role::Initiator);

    peer.emit(PeerEvent::ChannelClosed).await;
    assert!(
        session
            .controller
            .wait_for(Duration::from_millis(SETTLE_TIMEOUT_MS), |s| !s.chat_open)
            .await
    );
    // History survives the channel closing.
    assert_eq!(session.controller.snapshot().messages.len(), 1);

    session.controller.close().await.expect("close failed");
}
